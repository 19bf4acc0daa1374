//! Controller configuration

use std::time::Duration;

/// Configuration for a [`crate::CallController`]
///
/// Every remote operation carries an explicit deadline so a stalled
/// provider or channel service forces the session into `Failed` instead
/// of parking it forever.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Deadline for provider call initiation
    pub initiate_timeout: Duration,
    /// Deadline for joining the call room
    pub join_timeout: Duration,
    /// Deadline for provider call termination
    pub terminate_timeout: Duration,
    /// Capacity of the controller's broadcast event channel
    pub event_buffer: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            initiate_timeout: Duration::from_secs(30),
            join_timeout: Duration::from_secs(10),
            terminate_timeout: Duration::from_secs(10),
            event_buffer: 256,
        }
    }
}

impl ControllerConfig {
    /// Create a configuration with default deadlines
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initiation deadline
    pub fn with_initiate_timeout(mut self, timeout: Duration) -> Self {
        self.initiate_timeout = timeout;
        self
    }

    /// Set the channel join deadline
    pub fn with_join_timeout(mut self, timeout: Duration) -> Self {
        self.join_timeout = timeout;
        self
    }

    /// Set the termination deadline
    pub fn with_terminate_timeout(mut self, timeout: Duration) -> Self {
        self.terminate_timeout = timeout;
        self
    }

    /// Set the event channel capacity
    pub fn with_event_buffer(mut self, capacity: usize) -> Self {
        self.event_buffer = capacity;
        self
    }
}
