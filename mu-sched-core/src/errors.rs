//! Error types for mu-sched-core.
//!
//! Scheduling decisions never fail: an admission failure or an empty
//! station set surfaces as a different [`TxFormat`](crate::TxFormat).
//! `SchedError` covers the construction surface only (configuration,
//! channel width, addresses).

/// Unified error type for all mu-sched-core operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedError {
    /// Configuration value out of range.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Configuration document could not be parsed.
    #[error("Config parse error: {0}")]
    ConfigParse(String),

    /// Channel width other than 20, 40, 80 or 160 MHz.
    #[error("Unsupported channel width: {0} MHz")]
    UnsupportedWidth(u16),

    /// MAC address text not in `xx:xx:xx:xx:xx:xx` form.
    #[error("Invalid MAC address: {0}")]
    InvalidAddress(String),
}
