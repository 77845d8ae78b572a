//! Scheduler decision and result types.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::admission::TxParams;
use crate::budget::TimeBudget;
use crate::mac::{AccessCategory, Aid, ControlFrame, MacAddress, Psdu, QueuedFrame, TriggerFrame};
use crate::phy::ChannelWidth;

/// Feedback scope of a sounding round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundingScope {
    Su,
    Mu,
}

/// What the AP transmits in the opportunity just evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxFormat {
    SingleUser,
    DownlinkMu,
    UplinkMu,
    /// Sensing poll round: CF-Poll in a DL MU PPDU, then a trigger
    /// soliciting CTS responses.
    Poll,
    SoundingAnnounce(SoundingScope),
    NoTransmission,
}

/// The AP the scheduler runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccessPoint {
    pub address: MacAddress,
    /// Transmit antennas; the row count of sounding feedback.
    pub antennas: u8,
}

/// One channel-access opportunity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxOpportunity {
    pub primary_ac: AccessCategory,
    pub width: ChannelWidth,
    pub budget: TimeBudget,
    /// The first frame of a TXOP is not held to the budget; it is the
    /// frame that reserves the medium.
    pub initial_frame: bool,
}

impl TxOpportunity {
    /// Budget the data-carrying PPDUs are admitted against.
    pub fn admission_budget(&self) -> TimeBudget {
        if self.initial_frame {
            TimeBudget::unlimited()
        } else {
            self.budget
        }
    }
}

/// A station picked for the PPDU under construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Candidate {
    pub aid: Aid,
    pub address: MacAddress,
    /// Head frame for downlink candidates.
    pub frame: Option<QueuedFrame>,
}

impl Candidate {
    pub const fn station(aid: Aid, address: MacAddress) -> Self {
        Self {
            aid,
            address,
            frame: None,
        }
    }
}

/// Finalized downlink MU PPDU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DlInfo {
    pub tx_params: TxParams,
    pub psdus: BTreeMap<Aid, Psdu>,
}

/// Finalized uplink solicitation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UlInfo {
    pub trigger: TriggerFrame,
    /// Parameters of the PPDU carrying the trigger.
    pub tx_params: TxParams,
    /// TB PPDU duration granted through the trigger's L-SIG length.
    pub granted: Duration,
}

/// Finalized sensing poll round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollInfo {
    /// DL MU PPDU carrying one CF-Poll per station.
    pub tx_params: TxParams,
    pub polls: BTreeMap<Aid, ControlFrame>,
    pub trigger: TriggerFrame,
    pub trigger_params: TxParams,
    /// Granted duration of the CTS responses.
    pub response: Duration,
}

/// A station accepted into a sounding round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundingTarget {
    pub aid: Aid,
    pub address: MacAddress,
    /// Length of the beamforming report the station will send.
    pub report_size: u32,
    /// Airtime of that report.
    pub report_duration: Duration,
}
