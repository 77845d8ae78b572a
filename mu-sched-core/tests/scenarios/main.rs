//! Scheduler scenarios against the deterministic mock MAC.
//!
//! Every scenario drives [`MuScheduler`] through a sequence of transmit
//! opportunities the way an AP would: select a format, then finalize it.
//! Expected airtimes follow the mock's model (20 µs + 1 µs per byte,
//! 60 µs acknowledgements, 16 µs SIFS).
//!
//! Coverage:
//! - SU fallbacks (non-MU receiver, too few stations)
//! - DL MU assembly, RU assignment and fairness rotation
//! - UL MU: BSRP then Basic trigger, grant sizing, TXOP bounds
//! - Sensing: poll rounds, MU and SU sounding, timeouts
//! - Station lifecycle, including multi-link stations
//!
//! Set `RUST_LOG=mu_sched_core=debug` to see the decisions.


mod downlink;
mod sensing;
mod single_user;
mod uplink;
