//! peerlink-proxy - Peer greeting relay
//!
//! Implements `PeerGreeter` by calling the peer's `/api/greet` endpoint
//! through a shared `MtlsClient`. Every failure is rendered into the returned
//! string; nothing here propagates an error to the HTTP layer.

mod proxy;

pub use proxy::PeerProxyClient;
