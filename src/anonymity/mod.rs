//! Anonymity layer: SOCKS routing, the control channel and the rotation throttle.

pub mod control;
pub mod proxy;
pub mod rotation;

#[cfg(feature = "tor-control")]
pub use control::TorControl;
pub use control::{default_control, CircuitControl, RotationError, UnavailableControl};
pub use proxy::SocksProxy;
pub use rotation::CircuitRotator;
