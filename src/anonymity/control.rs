//! Anonymity control channel
//!
//! The rotation throttle only needs two capabilities from the anonymity
//! layer: a reachability check and "give me a new identity". `TorControl`
//! provides them over the Tor control protocol; builds without the
//! `tor-control` feature get `UnavailableControl`, which never rotates.

use futures::future::BoxFuture;
use std::time::Duration;
use thiserror::Error;

/// Failure to rotate the anonymity circuit. Never fatal.
#[derive(Debug, Error)]
pub enum RotationError {
    /// Control port could not be reached
    #[error("control channel unreachable at {0}")]
    Unreachable(String),

    /// The controller refused our credential
    #[error("control channel rejected authentication: {0}")]
    AuthenticationRejected(String),

    /// The controller refused the rotation signal
    #[error("rotation signal rejected: {0}")]
    SignalRejected(String),

    /// Transport failure mid-conversation
    #[error("control channel I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Rotation support was not compiled in
    #[error("circuit rotation is not supported by this build")]
    Unsupported,
}

/// Capability consumed from the anonymity control layer
pub trait CircuitControl: Send + Sync {
    /// Whether the control endpoint accepts connections
    fn is_reachable(&self) -> BoxFuture<'_, bool>;

    /// Ask for a new circuit, authenticating with `credential` if given
    ///
    /// `Ok(true)` means the controller acknowledged the request.
    fn request_rotation<'a>(
        &'a self,
        credential: Option<&'a str>,
    ) -> BoxFuture<'a, Result<bool, RotationError>>;
}

/// Control channel used when rotation support is compiled out
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableControl;

impl CircuitControl for UnavailableControl {
    fn is_reachable(&self) -> BoxFuture<'_, bool> {
        Box::pin(async { false })
    }

    fn request_rotation<'a>(
        &'a self,
        _credential: Option<&'a str>,
    ) -> BoxFuture<'a, Result<bool, RotationError>> {
        Box::pin(async { Err(RotationError::Unsupported) })
    }
}

/// Pick the control implementation this build supports
#[must_use]
pub fn default_control(
    host: &str,
    port: u16,
    timeout: Duration,
) -> std::sync::Arc<dyn CircuitControl> {
    #[cfg(feature = "tor-control")]
    {
        std::sync::Arc::new(tor::TorControl::new(host, port, timeout))
    }

    #[cfg(not(feature = "tor-control"))]
    {
        let _ = (host, port, timeout);
        tracing::warn!("Built without tor-control; circuit rotation is disabled");
        std::sync::Arc::new(UnavailableControl)
    }
}

#[cfg(feature = "tor-control")]
pub use tor::TorControl;

#[cfg(feature = "tor-control")]
mod tor {
    use super::{CircuitControl, RotationError};
    use futures::future::BoxFuture;
    use std::time::Duration;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpStream;
    use tracing::debug;

    /// Tor control-port client
    ///
    /// Opens a fresh connection per request; the control port is cheap to
    /// connect to and holding it open across rotations gains nothing.
    #[derive(Debug, Clone)]
    pub struct TorControl {
        address: String,
        timeout: Duration,
    }

    impl TorControl {
        #[must_use]
        pub fn new(host: &str, port: u16, timeout: Duration) -> Self {
            Self {
                address: format!("{host}:{port}"),
                timeout,
            }
        }

        async fn connect(&self) -> Result<TcpStream, RotationError> {
            match tokio::time::timeout(self.timeout, TcpStream::connect(&self.address)).await {
                Ok(Ok(stream)) => Ok(stream),
                Ok(Err(e)) => Err(RotationError::Unreachable(format!("{}: {e}", self.address))),
                Err(_) => Err(RotationError::Unreachable(format!(
                    "{}: connect timed out",
                    self.address
                ))),
            }
        }

        /// Run the whole exchange under one deadline
        ///
        /// A controller that accepts but never answers must not hold the
        /// rotation lock forever.
        async fn rotate(&self, credential: Option<&str>) -> Result<bool, RotationError> {
            match tokio::time::timeout(self.timeout, self.exchange(credential)).await {
                Ok(result) => result,
                Err(_) => Err(RotationError::Unreachable(format!(
                    "{}: no reply within {} ms",
                    self.address,
                    self.timeout.as_millis()
                ))),
            }
        }

        async fn exchange(&self, credential: Option<&str>) -> Result<bool, RotationError> {
            let stream = self.connect().await?;
            let (read_half, mut write_half) = stream.into_split();
            let mut reader = BufReader::new(read_half);

            let auth = match credential {
                Some(password) => format!("AUTHENTICATE {}\r\n", quote(password)),
                None => "AUTHENTICATE\r\n".to_string(),
            };
            write_half.write_all(auth.as_bytes()).await?;
            let reply = read_reply(&mut reader).await?;
            if !reply.starts_with("250") {
                // Unauthenticated controllers may still accept the signal
                // when no credential was configured.
                if credential.is_some() {
                    return Err(RotationError::AuthenticationRejected(reply));
                }
                debug!("Tor control AUTHENTICATE without credential refused: {reply}");
            }

            write_half.write_all(b"SIGNAL NEWNYM\r\n").await?;
            let reply = read_reply(&mut reader).await?;
            if !reply.starts_with("250") {
                return Err(RotationError::SignalRejected(reply));
            }

            let _ = write_half.write_all(b"QUIT\r\n").await;
            Ok(true)
        }
    }

    /// Read one (possibly multi-line) control reply and return its final line
    async fn read_reply<R>(reader: &mut R) -> Result<String, RotationError>
    where
        R: AsyncBufReadExt + Unpin,
    {
        loop {
            let mut line = String::new();
            let read = reader.read_line(&mut line).await?;
            if read == 0 {
                return Err(RotationError::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "control channel closed",
                )));
            }
            let line = line.trim_end().to_string();
            // "250-" and "250+" continue, "250 " ends the reply
            if line.len() < 4 || line.as_bytes()[3] == b' ' {
                return Ok(line);
            }
        }
    }

    fn quote(password: &str) -> String {
        let escaped = password.replace('\\', "\\\\").replace('"', "\\\"");
        format!("\"{escaped}\"")
    }

    impl CircuitControl for TorControl {
        fn is_reachable(&self) -> BoxFuture<'_, bool> {
            Box::pin(async move { self.connect().await.is_ok() })
        }

        fn request_rotation<'a>(
            &'a self,
            credential: Option<&'a str>,
        ) -> BoxFuture<'a, Result<bool, RotationError>> {
            Box::pin(self.rotate(credential))
        }
    }

}
