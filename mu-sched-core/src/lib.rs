//! MU Sched Core — OFDMA scheduling and channel-sounding control plane
//! for an HE (802.11ax) access point.
//!
//! At every channel-access opportunity the AP asks [`MuScheduler`] what
//! to send: a single-user PPDU, a downlink MU PPDU, a trigger frame
//! soliciting uplink MU, a sensing poll round or a sounding
//! announcement. The scheduler decides, sizes the PPDU against the
//! remaining TXOP, assigns resource units and keeps per-station fairness
//! credits. It never touches frame bodies, clocks or queues itself; the
//! surrounding MAC supplies those through the traits in [`env`].
//!
//! # Module Map
//!
//! | Module | Role | Status |
//! |--------|------|--------|
//! | [`constants`] | Timing values and frame sizes | Complete |
//! | [`errors`] | Construction-time errors | Complete |
//! | [`config`] | Scheduler and sensing configuration (JSON) | Complete |
//! | [`mac`] | Addresses, QoS classes, frame descriptors | Complete |
//! | [`phy`] | Resource units, TX vectors, L-SIG timing | Complete |
//! | [`budget`] | TXOP time budget | Complete |
//! | [`admission`] | Airtime admission of frames into a PPDU | Complete |
//! | [`env`] | Collaborator traits | Complete |
//! | [`scheduler`] | Format state machine, DL/UL/sensing builders, fairness | Complete |
//! | [`testing`] | Deterministic mock MAC (test-only) | Complete |
//!
//! # Logging
//!
//! Decisions are logged through `tracing`: registration and scheduler
//! creation at `info`, sensing timeouts at `warn`, per-decision detail
//! at `debug` and admission rejections at `trace`. The crate installs no
//! subscriber.

/// Protocol constants — timing values and frame sizes.
pub mod constants;

/// Error types for mu-sched-core operations.
pub mod errors;

/// Scheduler configuration.
pub mod config;

/// MAC-layer vocabulary: addresses, QoS classes, frames.
pub mod mac;

/// PHY-level descriptions: resource units, TX vectors, L-SIG.
pub mod phy;

/// Time budget of a transmit opportunity.
pub mod budget;

/// Airtime admission.
pub mod admission;

/// Interfaces to the surrounding MAC.
pub mod env;

/// The multi-user scheduler.
pub mod scheduler;

/// Deterministic mock MAC environment (test use only).
/// Requires the `test-support` feature outside this crate's unit tests.
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use admission::TxParams;
pub use budget::TimeBudget;
pub use config::{SchedulerConfig, SensingConfig, SoundingMode};
pub use errors::SchedError;
pub use scheduler::{
    AccessPoint, DlInfo, MuScheduler, PollInfo, SoundingScope, TxFormat, TxOpportunity, UlInfo,
};
