//! WebSocket session configuration.

use std::time::Duration;

/// Configuration for GraphQL WebSocket sessions.
#[derive(Debug, Clone)]
pub struct WebSocketConfig {
    /// How long the server waits for `connection_init` (default: 5 seconds).
    pub connection_init_timeout: Duration,
    /// Buffered frames per direction of an in-memory connection (default: 64).
    pub channel_capacity: usize,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            connection_init_timeout: Duration::from_secs(5),
            channel_capacity: 64,
        }
    }
}

impl WebSocketConfig {
    /// Create a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the `connection_init` timeout.
    #[must_use]
    pub fn connection_init_timeout(mut self, timeout: Duration) -> Self {
        self.connection_init_timeout = timeout;
        self
    }

    /// Set the channel capacity. Zero is raised to one.
    #[must_use]
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }
}
