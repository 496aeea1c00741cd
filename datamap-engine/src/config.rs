//! Manager configuration.

use serde::{Deserialize, Serialize};

/// Tuning knobs of a [`Manager`](crate::Manager).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Issue the per-field bulk fetches of one join pass concurrently.
    pub parallel_join_fetch: bool,
    /// Objects buffered per join pass while iterating a query with joins.
    pub iter_batch_size: usize,
    /// Limit applied to fetches that pass none.
    pub default_fetch_limit: Option<usize>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            parallel_join_fetch: true,
            iter_batch_size: 100,
            default_fetch_limit: None,
        }
    }
}
