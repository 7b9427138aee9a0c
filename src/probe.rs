//! One-time probe of the concurrency backends this build carries.
//!
//! The decision is a pure function of the compiled feature set, which cannot
//! change at runtime, so it is computed at most once per process and cached
//! behind a [`OnceLock`]. Reads after the first call take no lock.

use std::fmt;
use std::sync::OnceLock;

/// Which worker-pool backend a [`Pool`](crate::Pool) runs on.
///
/// Exactly one kind is active per pool instance, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Hand-rolled pool of worker threads coordinated over crossbeam
    /// channels. Always compiled in.
    Channel,
    /// Managed `rayon::ThreadPool` executor. Requires the `rayon` cargo
    /// feature (enabled by default).
    Rayon,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Channel => write!(f, "channel"),
            BackendKind::Rayon => write!(f, "rayon"),
        }
    }
}

static SELECTED: OnceLock<BackendKind> = OnceLock::new();

/// Select the preferred backend for this process.
///
/// Prefers the managed executor when compiled in, since it amortizes its
/// worker threads across everything else in the process that uses rayon;
/// otherwise falls back to the channel backend, which is always present.
/// The result is cached for the life of the process.
pub fn select_backend() -> BackendKind {
    *SELECTED.get_or_init(|| {
        let kind = if cfg!(feature = "rayon") {
            BackendKind::Rayon
        } else {
            BackendKind::Channel
        };
        tracing::debug!(backend = %kind, "selected pool backend");
        kind
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_backend_is_stable_across_calls() {
        let first = select_backend();
        for _ in 0..8 {
            assert_eq!(select_backend(), first);
        }
    }

    #[test]
    fn test_select_backend_matches_feature_set() {
        let expected = if cfg!(feature = "rayon") {
            BackendKind::Rayon
        } else {
            BackendKind::Channel
        };
        assert_eq!(select_backend(), expected);
    }

    #[test]
    fn test_backend_kind_display() {
        assert_eq!(BackendKind::Channel.to_string(), "channel");
        assert_eq!(BackendKind::Rayon.to_string(), "rayon");
    }
}
