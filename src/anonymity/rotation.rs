//! Circuit rotation throttle
//!
//! Rotating a circuit is slow and conspicuous, so throttled rotations require
//! both a minimum interval since the last one and a minimum number of
//! completed fetches. Forced rotations skip that gate. Either kind is
//! serialized: a caller arriving mid-rotation waits for it to finish, then
//! evaluates the gate against the updated state.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::control::CircuitControl;
use crate::config::AnonymitySettings;

/// Process-wide rotation bookkeeping
#[derive(Debug, Default, Clone, Copy)]
struct RotationState {
    /// `None` until the first successful rotation; the interval gate passes
    last_rotation: Option<Instant>,
    requests_since_rotation: u64,
}

pub struct CircuitRotator {
    control: Arc<dyn CircuitControl>,
    credential: Option<String>,
    min_interval: Duration,
    request_threshold: u64,
    state: parking_lot::Mutex<RotationState>,
    rotation_lock: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for CircuitRotator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitRotator")
            .field("min_interval", &self.min_interval)
            .field("request_threshold", &self.request_threshold)
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}

impl CircuitRotator {
    #[must_use]
    pub fn new(
        control: Arc<dyn CircuitControl>,
        credential: Option<String>,
        min_interval: Duration,
        request_threshold: u64,
    ) -> Self {
        Self {
            control,
            credential,
            min_interval,
            request_threshold,
            state: parking_lot::Mutex::new(RotationState::default()),
            rotation_lock: tokio::sync::Mutex::new(()),
        }
    }

    #[must_use]
    pub fn from_settings(control: Arc<dyn CircuitControl>, settings: &AnonymitySettings) -> Self {
        Self::new(
            control,
            settings.control_password.clone(),
            settings.rotation_min_interval,
            settings.rotation_threshold,
        )
    }

    /// Count one completed fetch
    pub fn increment(&self) {
        self.state.lock().requests_since_rotation += 1;
    }

    #[must_use]
    pub fn requests_since_rotation(&self) -> u64 {
        self.state.lock().requests_since_rotation
    }

    #[must_use]
    pub fn last_rotation(&self) -> Option<Instant> {
        self.state.lock().last_rotation
    }

    fn gate_open(&self) -> bool {
        let state = *self.state.lock();
        let interval_elapsed = state
            .last_rotation
            .is_none_or(|last| last.elapsed() >= self.min_interval);
        interval_elapsed && state.requests_since_rotation >= self.request_threshold
    }

    /// Rotate if both the interval and the request threshold allow it
    ///
    /// Returns `true` only when a rotation was performed and acknowledged.
    pub async fn maybe_rotate(&self) -> bool {
        let _guard = self.rotation_lock.lock().await;

        if !self.gate_open() {
            debug!(
                "Circuit rotation not due ({} request(s) since last)",
                self.requests_since_rotation()
            );
            return false;
        }

        self.rotate_locked("throttled").await
    }

    /// Rotate now, bypassing the gate
    pub async fn force_rotate(&self) -> bool {
        let _guard = self.rotation_lock.lock().await;
        self.rotate_locked("forced").await
    }

    /// Caller must hold `rotation_lock`
    async fn rotate_locked(&self, reason: &str) -> bool {
        match self.control.request_rotation(self.credential.as_deref()).await {
            Ok(true) => {
                let mut state = self.state.lock();
                state.last_rotation = Some(Instant::now());
                state.requests_since_rotation = 0;
                info!("Circuit rotated ({reason})");
                true
            }
            Ok(false) => {
                warn!("Circuit rotation ({reason}) was not acknowledged");
                false
            }
            Err(e) => {
                warn!("Circuit rotation ({reason}) failed: {e}");
                false
            }
        }
    }
}
