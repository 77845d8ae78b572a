//! Decision counters.

use std::time::Duration;

use super::types::{SoundingScope, TxFormat};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub single_user: u64,
    pub downlink_mu: u64,
    pub uplink_mu: u64,
    pub polls: u64,
    pub sounding_su: u64,
    pub sounding_mu: u64,
    pub no_transmission: u64,
    /// Sensing steps that could not fit their exchange in the TXOP.
    pub sensing_timeouts: u64,
    /// Clock reading at the most recent sensing timeout.
    pub last_sensing_timeout: Option<Duration>,
    /// Stations accepted into sounding rounds, summed over rounds.
    pub sounded_stations: u64,
}

impl SchedulerStats {
    pub(crate) fn record(&mut self, format: TxFormat) {
        let counter = match format {
            TxFormat::SingleUser => &mut self.single_user,
            TxFormat::DownlinkMu => &mut self.downlink_mu,
            TxFormat::UplinkMu => &mut self.uplink_mu,
            TxFormat::Poll => &mut self.polls,
            TxFormat::SoundingAnnounce(SoundingScope::Su) => &mut self.sounding_su,
            TxFormat::SoundingAnnounce(SoundingScope::Mu) => &mut self.sounding_mu,
            TxFormat::NoTransmission => &mut self.no_transmission,
        };
        *counter += 1;
    }

    pub(crate) fn record_sensing_timeout(&mut self, now: Duration) {
        self.sensing_timeouts += 1;
        self.last_sensing_timeout = Some(now);
    }

    /// Decisions made so far.
    pub fn decisions(&self) -> u64 {
        self.single_user
            + self.downlink_mu
            + self.uplink_mu
            + self.polls
            + self.sounding_su
            + self.sounding_mu
            + self.no_transmission
    }
}
