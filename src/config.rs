//! Cache configuration

/// Configuration for the coverage cache.
///
/// # Example
///
/// ```
/// use seriescache::config::CacheConfig;
///
/// let config = CacheConfig::default().with_min_history_days(30);
/// assert_eq!(config.min_history_days, 30);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    /// Width of the trailing window, in days. The cache keeps
    /// `[today - min_history_days, today - 1]` covered.
    ///
    /// Default: 90
    pub min_history_days: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            min_history_days: 90,
        }
    }
}

impl CacheConfig {
    /// Creates a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the trailing-window width. Clamped to at least one day.
    pub fn with_min_history_days(mut self, days: u32) -> Self {
        self.min_history_days = days.max(1);
        self
    }
}
