//! SOCKS proxy reachability

use std::time::Duration;
use tokio::net::TcpStream;
use tracing::{info, warn};

use crate::config::AnonymitySettings;
use crate::crawl_engine::crawl_types::{ScrapeError, ScrapeResult};
use crate::utils::constants::SOCKS_CONNECT_TIMEOUT;

/// The SOCKS endpoint browser traffic is routed through
#[derive(Debug, Clone)]
pub struct SocksProxy {
    host: String,
    port: u16,
    connect_timeout: Duration,
}

impl SocksProxy {
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            connect_timeout: SOCKS_CONNECT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn from_settings(settings: &AnonymitySettings) -> Self {
        Self::new(settings.socks_host.clone(), settings.socks_port)
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// `socks5://host:port`, the form Chromium's `--proxy-server` expects
    #[must_use]
    pub fn server_url(&self) -> String {
        format!("socks5://{}:{}", self.host, self.port)
    }

    /// Whether a TCP connection to the endpoint succeeds within the connect timeout
    pub async fn is_reachable(&self) -> bool {
        let address = format!("{}:{}", self.host, self.port);
        match tokio::time::timeout(self.connect_timeout, TcpStream::connect(&address)).await {
            Ok(Ok(_)) => {
                info!("SOCKS proxy reachable at {address}");
                true
            }
            Ok(Err(e)) => {
                warn!("SOCKS proxy not reachable at {address}: {e}");
                false
            }
            Err(_) => {
                warn!("SOCKS proxy connect timed out at {address}");
                false
            }
        }
    }

    /// Fail unless the endpoint is reachable
    ///
    /// # Errors
    /// `ScrapeError::AnonymityUnavailable` when the check fails. Proxy routing
    /// never silently degrades to a direct connection.
    pub async fn require_reachable(&self) -> ScrapeResult<()> {
        if self.is_reachable().await {
            Ok(())
        } else {
            Err(ScrapeError::AnonymityUnavailable {
                host: self.host.clone(),
                port: self.port,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn listening_endpoint_is_reachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let proxy = SocksProxy::new("127.0.0.1", port);
        assert!(proxy.is_reachable().await);
        assert!(proxy.require_reachable().await.is_ok());
        assert_eq!(proxy.server_url(), format!("socks5://127.0.0.1:{port}"));
    }

    #[tokio::test]
    async fn closed_endpoint_is_fatal() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let proxy =
            SocksProxy::new("127.0.0.1", port).with_connect_timeout(Duration::from_millis(500));
        let err = proxy.require_reachable().await.unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::AnonymityUnavailable { port: p, .. } if p == port
        ));
    }
}
