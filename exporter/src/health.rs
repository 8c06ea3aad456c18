//! Process-wide connection health flag.
//!
//! Written by the connection lifecycle (connect, error, disconnect) and
//! read by the `/healthz` handler.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared, cheaply clonable health flag. Starts out unhealthy until the
/// first connection succeeds.
#[derive(Clone, Debug, Default)]
pub struct HealthState {
    connected: Arc<AtomicBool>,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the node connection as established.
    pub fn set_connected(&self) {
        self.connected.store(true, Ordering::Release);
    }

    /// Marks the node connection as failed or lost.
    pub fn set_failed(&self) {
        self.connected.store(false, Ordering::Release);
    }

    pub fn is_healthy(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follows_connection_lifecycle() {
        let health = HealthState::new();
        assert!(!health.is_healthy());

        health.set_connected();
        assert!(health.is_healthy());

        health.set_failed();
        assert!(!health.is_healthy());
    }

    #[test]
    fn clones_share_the_flag() {
        let writer = HealthState::new();
        let reader = writer.clone();

        writer.set_connected();
        assert!(reader.is_healthy());
    }
}
