//! HTTP request handlers

pub mod greet;
pub mod health;
pub mod proxy;

use axum::http::Uri;

use crate::error::ApiError;

/// Fallback for paths no route matches
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("No route for {}", uri.path()))
}
