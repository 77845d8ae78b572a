//! Scheduler configuration.
//!
//! Every field has a default, so a JSON document only needs to name the
//! values it changes. Unknown fields are rejected. [`SchedulerConfig::validate`]
//! runs on every construction path; a scheduler never holds an invalid
//! configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_MAX_CREDITS_US, DEFAULT_SOUNDING_INTERVAL_US, DEFAULT_UL_PSDU_SIZE, MAX_MU_STATIONS,
};
use crate::errors::SchedError;

/// Highest HE MCS index.
const MAX_HE_MCS: u8 = 11;

/// Which sounding exchanges follow a poll round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundingMode {
    /// Sound each acknowledged station on its own.
    SuOnly,
    /// Sound all acknowledged stations together.
    MuOnly,
    /// Sound all acknowledged stations together, reporting SU feedback
    /// when only one station acknowledged.
    #[default]
    SuAndMu,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SensingConfig {
    pub enabled: bool,
    /// Zero disables the announce phase; poll rounds still run.
    pub sounding_interval_us: u64,
    pub mode: SoundingMode,
    /// MCS for beamforming reports. `None` uses the rate manager's choice.
    pub report_mcs: Option<u8>,
}

impl Default for SensingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            sounding_interval_us: DEFAULT_SOUNDING_INTERVAL_US,
            mode: SoundingMode::default(),
            report_mcs: None,
        }
    }
}

impl SensingConfig {
    pub fn sounding_enabled(&self) -> bool {
        self.sounding_interval_us > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Upper bound on stations served by one MU PPDU.
    pub max_stations: u8,
    /// Let other access categories fill the primary one's TXOP.
    pub txop_sharing: bool,
    /// Answer `NoTransmission` instead of `SingleUser` when no DL MU
    /// PPDU can be built.
    pub force_dl_mu: bool,
    pub enable_ul_mu: bool,
    pub enable_bsrp: bool,
    /// Bytes a Basic Trigger solicits from a station whose buffer status
    /// is unknown; also the floor the UL grant must cover.
    pub ul_psdu_size: u32,
    pub use_central_26_tone_rus: bool,
    pub max_credits_us: u64,
    /// Fewer stations than this in the primary DL list means SU.
    pub min_dl_mu_stations: u8,
    pub sensing: SensingConfig,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_stations: 4,
            txop_sharing: true,
            force_dl_mu: false,
            enable_ul_mu: true,
            enable_bsrp: true,
            ul_psdu_size: DEFAULT_UL_PSDU_SIZE,
            use_central_26_tone_rus: false,
            max_credits_us: DEFAULT_MAX_CREDITS_US,
            min_dl_mu_stations: 2,
            sensing: SensingConfig::default(),
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<(), SchedError> {
        if !(1..=MAX_MU_STATIONS).contains(&self.max_stations) {
            return Err(SchedError::InvalidConfig(format!(
                "max_stations must be in 1..={MAX_MU_STATIONS}, got {}",
                self.max_stations
            )));
        }
        if self.min_dl_mu_stations < 1 {
            return Err(SchedError::InvalidConfig(
                "min_dl_mu_stations must be at least 1".into(),
            ));
        }
        if self.ul_psdu_size == 0 {
            return Err(SchedError::InvalidConfig(
                "ul_psdu_size must be non-zero".into(),
            ));
        }
        if self.max_credits_us == 0 {
            return Err(SchedError::InvalidConfig(
                "max_credits_us must be non-zero".into(),
            ));
        }
        if let Some(mcs) = self.sensing.report_mcs {
            if mcs > MAX_HE_MCS {
                return Err(SchedError::InvalidConfig(format!(
                    "sensing.report_mcs must be at most {MAX_HE_MCS}, got {mcs}"
                )));
            }
        }
        Ok(())
    }

    /// Parses and validates a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self, SchedError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| SchedError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, SchedError> {
        serde_json::to_string_pretty(self).map_err(|e| SchedError::ConfigParse(e.to_string()))
    }

    pub fn max_credits(&self) -> Duration {
        Duration::from_micros(self.max_credits_us)
    }
}
