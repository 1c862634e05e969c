/// Configuration for the snapshot history.

/// Maximum number of snapshots kept in the log before the oldest is evicted.
const DEFAULT_MAX_STATES: usize = 50;

/// Configuration for the history system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Max snapshots kept in the log. Always at least 1.
    pub max_states: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_states: DEFAULT_MAX_STATES,
        }
    }
}

impl HistoryConfig {
    /// Creates a config with the given capacity, clamped to at least one entry.
    pub fn with_max_states(max_states: usize) -> Self {
        Self {
            max_states: max_states.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HistoryConfig::default();
        assert_eq!(config.max_states, 50);
    }

    #[test]
    fn test_with_max_states_clamps_zero() {
        assert_eq!(HistoryConfig::with_max_states(0).max_states, 1);
        assert_eq!(HistoryConfig::with_max_states(7).max_states, 7);
    }
}
