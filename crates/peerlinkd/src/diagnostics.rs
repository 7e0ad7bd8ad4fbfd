//! Certificate listing at startup
//!
//! Once the listener is bound, the daemon logs what its keystore and
//! truststore contain by running an external tool (`openssl` by default) and
//! streaming its output to the log. Purely informational: failures are logged
//! and never affect serving.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

const BANNER_WIDTH: usize = 80;

/// Failure of a single listing command
#[derive(Error, Debug)]
pub enum DiagnosticsError {
    #[error("failed to run '{tool}': {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{tool}' exited with {status}")]
    Exit { tool: String, status: ExitStatus },

    #[error("failed to read output of '{tool}': {source}")]
    Output {
        tool: String,
        #[source]
        source: std::io::Error,
    },
}

/// Outcome counts, for callers that want more than the log
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiagnosticsReport {
    pub succeeded: usize,
    pub failed: usize,
}

/// Lists keystore and truststore contents with an external tool
#[derive(Debug, Clone)]
pub struct CertificateDiagnostics {
    tool: String,
    keystore: PathBuf,
    truststore: PathBuf,
}

impl CertificateDiagnostics {
    pub fn new(
        tool: impl Into<String>,
        keystore: impl Into<PathBuf>,
        truststore: impl Into<PathBuf>,
    ) -> Self {
        Self {
            tool: tool.into(),
            keystore: keystore.into(),
            truststore: truststore.into(),
        }
    }

    /// Run in the background; the handle may be dropped
    pub fn spawn(self) -> JoinHandle<DiagnosticsReport> {
        tokio::spawn(async move { self.run().await })
    }

    /// Log the banner and run every listing command in turn
    pub async fn run(&self) -> DiagnosticsReport {
        let heavy = "=".repeat(BANNER_WIDTH);
        let light = "-".repeat(BANNER_WIDTH);

        info!("{heavy}");
        info!("CERTIFICATE INFORMATION (using {})", self.tool);
        info!("{heavy}");
        info!("Keystore Path: {}", self.keystore.display());
        info!("Truststore Path: {}", self.truststore.display());
        info!("{light}");

        let mut report = DiagnosticsReport::default();

        info!("KEYSTORE INFORMATION:");
        for args in self.keystore_commands() {
            self.record(&mut report, &args).await;
        }
        info!("{light}");

        info!("TRUSTSTORE INFORMATION:");
        for args in self.truststore_commands() {
            self.record(&mut report, &args).await;
        }
        info!("{heavy}");

        report
    }

    fn keystore_commands(&self) -> Vec<Vec<OsString>> {
        let path = self.keystore.as_os_str().to_owned();
        vec![
            args(
                &[
                    "x509",
                    "-noout",
                    "-subject",
                    "-issuer",
                    "-dates",
                    "-fingerprint",
                    "-sha256",
                    "-in",
                ],
                &path,
            ),
            args(&["x509", "-noout", "-text", "-in"], &path),
        ]
    }

    fn truststore_commands(&self) -> Vec<Vec<OsString>> {
        let path = self.truststore.as_os_str().to_owned();
        vec![
            args(&["storeutl", "-noout", "-certs"], &path),
            args(&["storeutl", "-noout", "-text", "-certs"], &path),
        ]
    }

    async fn record(&self, report: &mut DiagnosticsReport, args: &[OsString]) {
        match self.execute(args).await {
            Ok(()) => report.succeeded += 1,
            Err(e) => {
                error!(error = %e, "Certificate listing failed");
                report.failed += 1;
            }
        }
    }

    async fn execute(&self, args: &[OsString]) -> Result<(), DiagnosticsError> {
        info!(
            ">>> Executing: {} {}",
            self.tool,
            args.iter()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );

        let mut child = Command::new(&self.tool)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| DiagnosticsError::Spawn {
                tool: self.tool.clone(),
                source,
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (out, err) = tokio::join!(log_lines(stdout, false), log_lines(stderr, true));
        out.and(err).map_err(|source| DiagnosticsError::Output {
            tool: self.tool.clone(),
            source,
        })?;

        let status = child.wait().await.map_err(|source| DiagnosticsError::Output {
            tool: self.tool.clone(),
            source,
        })?;
        if !status.success() {
            return Err(DiagnosticsError::Exit {
                tool: self.tool.clone(),
                status,
            });
        }
        Ok(())
    }
}

fn args(fixed: &[&str], path: &OsString) -> Vec<OsString> {
    fixed
        .iter()
        .map(OsString::from)
        .chain(std::iter::once(path.clone()))
        .collect()
}

async fn log_lines<R: AsyncRead + Unpin>(
    stream: Option<R>,
    is_stderr: bool,
) -> std::io::Result<()> {
    let Some(stream) = stream else {
        return Ok(());
    };
    let mut lines = BufReader::new(stream).lines();
    while let Some(line) = lines.next_line().await? {
        if is_stderr {
            warn!("  {}", line);
        } else {
            info!("  {}", line);
        }
    }
    Ok(())
}
