//! Pool configuration and worker-count resolution.

use serde::{Deserialize, Serialize};

/// Configuration shared by both pool backends.
///
/// Embedding applications typically deserialize this from their own config
/// layer; every field has a sensible default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of worker threads (0 = auto-detect from available cores)
    pub workers: usize,
    /// Percentage of CPU cores to use when auto-detecting (1-100)
    pub core_percentage: u8,
    /// Thread-name prefix; workers are named `<prefix>-<n>`
    pub worker_name_prefix: String,
    /// Stack size per worker in bytes (None = platform default)
    pub worker_stack_size: Option<usize>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            core_percentage: 100,
            worker_name_prefix: "forkpool".to_string(),
            worker_stack_size: None,
        }
    }
}

impl PoolConfig {
    /// Configuration with an explicit worker count.
    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers,
            ..Self::default()
        }
    }

    /// Resolve the effective worker count.
    ///
    /// An explicit `workers` value wins; otherwise the count is derived from
    /// the host's core count scaled by `core_percentage`, never below 1.
    pub fn resolved_workers(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }

        let available_cores = num_cpus::get();
        std::cmp::max(1, (available_cores * self.core_percentage as usize) / 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_worker_count_wins() {
        let config = PoolConfig::with_workers(3);
        assert_eq!(config.resolved_workers(), 3);
    }

    #[test]
    fn test_auto_detect_never_below_one() {
        let config = PoolConfig {
            workers: 0,
            core_percentage: 1,
            ..PoolConfig::default()
        };
        assert!(config.resolved_workers() >= 1);
    }

    #[test]
    fn test_auto_detect_caps_at_available_cores() {
        let config = PoolConfig::default();
        assert!(config.resolved_workers() <= num_cpus::get());
    }

    #[test]
    fn test_default_prefix() {
        assert_eq!(PoolConfig::default().worker_name_prefix, "forkpool");
    }
}
