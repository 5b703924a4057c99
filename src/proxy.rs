// src/proxy.rs

//! Front-facing TCP proxy.
//!
//! Each accepted connection is either:
//! - answered with a plain-text `500` page carrying the compiler output, when
//!   the last build failed, or
//! - piped byte-for-byte to the supervised server, after asking the
//!   supervisor to make sure an up-to-date instance is running.
//!
//! Forwarding at the TCP level keeps websockets and streaming responses
//! working without parsing HTTP.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::engine::{BuildOutcome, BuildStatus};
use crate::errors::{KilnError, Result};
use crate::exec::Supervisor;

const CONNECT_ATTEMPTS: u32 = 20;
const CONNECT_RETRY_DELAY: Duration = Duration::from_millis(100);
const REQUEST_HEAD_TIMEOUT: Duration = Duration::from_millis(200);
const MAX_REQUEST_HEAD: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Listen address; all interfaces when `None`.
    pub laddr: Option<String>,
    pub port: u16,
    /// Backend the traffic is forwarded to (e.g. `127.0.0.1:3001`).
    pub proxy_to: String,
    pub cert_file: Option<PathBuf>,
    pub key_file: Option<PathBuf>,
}

impl ProxyConfig {
    fn listen_addr(&self) -> String {
        format!("{}:{}", self.laddr.as_deref().unwrap_or("0.0.0.0"), self.port)
    }
}

pub struct Proxy {
    status: BuildStatus,
    supervisor: Arc<dyn Supervisor>,
}

impl std::fmt::Debug for Proxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Proxy")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl Proxy {
    pub fn new(status: BuildStatus, supervisor: Arc<dyn Supervisor>) -> Self {
        Self { status, supervisor }
    }

    /// Bind the listener and spawn the accept loop. Returns the bound address.
    pub async fn run(self, config: &ProxyConfig) -> Result<SocketAddr> {
        if config.cert_file.is_some() || config.key_file.is_some() {
            return Err(KilnError::Proxy(
                "TLS termination is not supported by the built-in proxy; \
                 remove --cert-file/--key-file"
                    .to_string(),
            ));
        }

        let listen = config.listen_addr();
        let listener = TcpListener::bind(&listen)
            .await
            .map_err(|e| KilnError::Proxy(format!("binding {listen}: {e}")))?;
        let local = listener.local_addr()?;
        info!(%local, backend = %config.proxy_to, "proxy listening");

        let backend = config.proxy_to.clone();
        tokio::spawn(async move {
            loop {
                let (stream, peer) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "accept failed");
                        continue;
                    }
                };
                debug!(%peer, "accepted connection");

                let status = self.status.clone();
                let supervisor = Arc::clone(&self.supervisor);
                let backend = backend.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, status, supervisor, &backend).await {
                        debug!(%peer, error = %e, "connection ended with error");
                    }
                });
            }
        });

        Ok(local)
    }
}

async fn handle_connection(
    mut client: TcpStream,
    status: BuildStatus,
    supervisor: Arc<dyn Supervisor>,
    backend: &str,
) -> Result<()> {
    if let BuildOutcome::Failure(errors) = status.current() {
        read_request_head(&mut client).await;
        client.write_all(error_page(&errors).as_bytes()).await?;
        client.shutdown().await?;
        return Ok(());
    }

    if let Err(e) = supervisor.start().await {
        warn!(error = %e, "could not start server for incoming request");
    }

    let mut upstream = connect_with_retry(backend).await?;
    tokio::io::copy_bidirectional(&mut client, &mut upstream).await?;
    Ok(())
}

/// Consume the request head before answering, so closing the socket with
/// unread input does not reset the connection under the response.
async fn read_request_head(client: &mut TcpStream) {
    let mut head = Vec::new();
    let mut chunk = [0u8; 4096];
    while head.len() < MAX_REQUEST_HEAD && !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match tokio::time::timeout(REQUEST_HEAD_TIMEOUT, client.read(&mut chunk)).await {
            Ok(Ok(n)) if n > 0 => head.extend_from_slice(&chunk[..n]),
            _ => break,
        }
    }
}

async fn connect_with_retry(backend: &str) -> Result<TcpStream> {
    let mut last_err = None;
    for _ in 0..CONNECT_ATTEMPTS {
        match TcpStream::connect(backend).await {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                last_err = Some(e);
                tokio::time::sleep(CONNECT_RETRY_DELAY).await;
            }
        }
    }
    Err(KilnError::Proxy(format!(
        "connecting to backend {backend}: {}",
        last_err.map(|e| e.to_string()).unwrap_or_default()
    )))
}

/// Minimal HTTP response carrying the build diagnostics.
pub fn error_page(errors: &str) -> String {
    format!(
        "HTTP/1.1 500 Internal Server Error\r\n\
         Content-Type: text/plain; charset=utf-8\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {}",
        errors.len(),
        errors
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_page_has_exact_content_length() {
        let page = error_page("error[E0425]: cannot find value `x`");
        let (head, body) = page.split_once("\r\n\r\n").unwrap();
        assert!(head.starts_with("HTTP/1.1 500"));
        assert!(head.contains(&format!("Content-Length: {}", body.len())));
    }

    #[test]
    fn listen_addr_defaults_to_all_interfaces() {
        let config = ProxyConfig {
            laddr: None,
            port: 3000,
            proxy_to: "127.0.0.1:3001".into(),
            cert_file: None,
            key_file: None,
        };
        assert_eq!(config.listen_addr(), "0.0.0.0:3000");
    }
}
