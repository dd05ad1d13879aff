//! Tuning knobs for the blocking primitives.

use serde::{Deserialize, Serialize};

/// Spin iterations a contended monitor acquire performs before parking.
pub const DEFAULT_SPIN_LIMIT: u32 = 40;

/// Message carried by [`crate::Error::Cancelled`] when an interrupt has none.
pub const DEFAULT_INTERRUPT_MESSAGE: &str = "thread interrupted";

/// Per-monitor configuration.
///
/// Deserializes from partial documents; missing fields take their defaults:
///
/// ```rust
/// use synchro::MonitorConfig;
///
/// let config: MonitorConfig = serde_json::from_str("{}").unwrap();
/// assert_eq!(config, MonitorConfig::default());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Busy-wait iterations before a contended `lock` parks on the lock word.
    /// Zero parks immediately.
    pub spin_limit: u32,
}

impl MonitorConfig {
    /// Returns the default configuration.
    pub const fn new() -> Self {
        Self {
            spin_limit: DEFAULT_SPIN_LIMIT,
        }
    }

    /// Sets the spin limit.
    #[must_use]
    pub const fn with_spin_limit(mut self, spin_limit: u32) -> Self {
        self.spin_limit = spin_limit;
        self
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let config: MonitorConfig = serde_json::from_str(r#"{"spin_limit": 7}"#).unwrap();
        assert_eq!(config.spin_limit, 7);

        let config: MonitorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.spin_limit, DEFAULT_SPIN_LIMIT);
    }

    #[test]
    fn builder_overrides_spin_limit() {
        let config = MonitorConfig::new().with_spin_limit(0);
        assert_eq!(config.spin_limit, 0);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, r#"{"spin_limit":0}"#);
    }
}
