//! Registry-level limits and housekeeping cadence.

use std::time::Duration;

/// Limits applied by the [`Registry`](crate::Registry).
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Maximum number of live rooms.
    pub max_rooms: usize,

    /// A room with no command activity for this long is swept.
    pub stale_after: Duration,

    /// How often the housekeeping sweep runs.
    pub sweep_interval: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_rooms: 100,
            stale_after: Duration::from_secs(30 * 60),
            sweep_interval: Duration::from_secs(5 * 60),
        }
    }
}
