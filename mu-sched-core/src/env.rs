//! Collaborator interfaces.
//!
//! The scheduler owns no clock, no queues and no PHY model. Everything
//! it needs from the surrounding MAC comes through these traits, which
//! [`MacEnv`] bundles. Implementations must be deterministic for a given
//! state: the scheduler may ask the same question several times while
//! building one PPDU.

use std::time::Duration;

use crate::admission::TxParams;
use crate::budget::TimeBudget;
use crate::constants::{BUFFER_STATUS_UNBOUNDED, BUFFER_STATUS_UNIT, BUFFER_STATUS_UNKNOWN};
use crate::mac::{
    AccessCategory, Aid, ControlFrame, MacAddress, Psdu, QueuedFrame, Tid, TriggerFrame,
};
use crate::phy::{ChannelWidth, RateSelection, TxVector};

/// How the recipients of a PPDU acknowledge it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AckPolicy {
    NoAck,
    /// Block acks from every DL MU recipient.
    DlMuBlockAck,
    /// One multi-STA block ack answering a TB PPDU.
    MultiStaBlockAck,
}

/// Side of a block ack agreement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaRole {
    /// The AP sends the data (downlink).
    Originator,
    /// The AP receives the data (uplink).
    Recipient,
}

/// Queue size a station last reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferStatus {
    Unknown,
    Unbounded,
    /// In units of [`BUFFER_STATUS_UNIT`] bytes.
    Units(u8),
}

impl BufferStatus {
    /// Decodes a queue size subfield.
    pub const fn from_code(code: u8) -> Self {
        match code {
            BUFFER_STATUS_UNKNOWN => BufferStatus::Unknown,
            BUFFER_STATUS_UNBOUNDED => BufferStatus::Unbounded,
            units => BufferStatus::Units(units),
        }
    }

    /// Unknown counts as data: the station has not said otherwise.
    pub const fn has_data(&self) -> bool {
        !matches!(self, BufferStatus::Units(0))
    }

    /// Bytes to solicit; `unknown` stands in for an unknown queue size.
    pub fn bytes(&self, unknown: u32) -> u32 {
        match self {
            BufferStatus::Unknown => unknown,
            BufferStatus::Unbounded => u32::MAX,
            BufferStatus::Units(units) => u32::from(*units) * BUFFER_STATUS_UNIT,
        }
    }
}

/// Beamforming feedback capabilities a station advertised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BeamformeeCapabilities {
    /// Subcarrier grouping for SU feedback (4 or 16).
    pub ng_su: u8,
    /// Subcarrier grouping for MU feedback (4 or 16).
    pub ng_mu: u8,
    /// Finer SU codebook (6,4) instead of (4,2).
    pub codebook_su_fine: bool,
    /// Finer MU codebook (9,7) instead of (7,5).
    pub codebook_mu_fine: bool,
    /// Maximum columns in the feedback matrix, minus one.
    pub max_nc: u8,
}

impl Default for BeamformeeCapabilities {
    fn default() -> Self {
        Self {
            ng_su: 4,
            ng_mu: 16,
            codebook_su_fine: false,
            codebook_mu_fine: false,
            max_nc: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StationCapabilities {
    /// Supports DL and UL OFDMA.
    pub multi_user: bool,
    pub beamformee: BeamformeeCapabilities,
}

/// A station associated on the scheduler's link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssociatedStation {
    pub aid: Aid,
    pub address: MacAddress,
}

/// Where a frame sits in the sounding exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SoundingRole {
    Announce,
    Probe,
    ReportTrigger,
}

/// A frame handed to the beamformer for a sounding exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoundingFrame {
    Control(ControlFrame),
    Trigger(TriggerFrame),
}

pub trait Clock {
    fn now(&self) -> Duration;
}

pub trait DurationOracle {
    /// Airtime of a PSDU of `size` bytes. `recipient` names the user of
    /// an MU vector and is `None` for SU vectors.
    fn tx_duration(&self, size: u32, vector: &TxVector, recipient: Option<Aid>) -> Duration;

    /// Time from the end of the PPDU to the end of its acknowledgement.
    fn ack_duration(&self, policy: AckPolicy, vector: &TxVector) -> Duration;

    /// Protection exchange (RTS/CTS or MU-RTS) preceding a PPDU.
    fn protection_duration(&self, _vector: &TxVector) -> Duration {
        Duration::ZERO
    }

    fn sifs(&self) -> Duration;
}

pub trait RateManager {
    fn data_mode(&self, station: MacAddress, width: ChannelWidth) -> RateSelection;

    /// Vector for control frames addressed to `receiver`.
    fn control_tx_vector(&self, receiver: MacAddress) -> TxVector;
}

pub trait StationDirectory {
    fn supports_mu(&self, station: MacAddress) -> bool;

    /// MLD address of a multi-link station, or its link address.
    fn mld_or_link_address(&self, aid: Aid) -> Option<MacAddress>;

    fn is_associated(&self, station: MacAddress) -> bool;

    fn associated_stations(&self) -> Vec<AssociatedStation>;

    fn buffer_status(&self, station: MacAddress) -> BufferStatus;

    fn has_block_ack_session(&self, station: MacAddress, tid: Tid, role: BaRole) -> bool;

    fn capabilities(&self, station: MacAddress) -> Option<StationCapabilities>;
}

pub trait TxQueues {
    /// First queued frame of `ac`, optionally restricted to a TID and a
    /// receiver. Peeking does not dequeue.
    fn peek(&self, ac: AccessCategory, tid: Option<Tid>, receiver: Option<MacAddress>) -> Option<QueuedFrame>;
}

pub trait Aggregator {
    /// Builds the PSDU starting with `head` that fits `params` and `budget`.
    fn aggregate(&mut self, head: &QueuedFrame, params: &TxParams, budget: TimeBudget) -> Psdu;
}

/// Receives the frames and parameters of a sounding exchange.
pub trait BeamformerSink {
    fn set_frame(&mut self, role: SoundingRole, frame: SoundingFrame);

    fn set_tx_params(&mut self, role: SoundingRole, params: &TxParams);

    /// Announces the sounded stations so the beamformer can start its own
    /// bookkeeping for them.
    fn announce_targets(&mut self, transmitter: MacAddress, targets: &[MacAddress], width: ChannelWidth);

    /// Stations in the announcement the beamformer is tracking.
    fn announced_station_count(&self) -> usize;

    /// Drops everything set for the previous exchange.
    fn clear(&mut self);
}

/// Everything the scheduler needs from the MAC.
pub trait MacEnv:
    Clock + DurationOracle + RateManager + StationDirectory + TxQueues + Aggregator + BeamformerSink
{
}

impl<T> MacEnv for T where
    T: Clock
        + DurationOracle
        + RateManager
        + StationDirectory
        + TxQueues
        + Aggregator
        + BeamformerSink
        + ?Sized
{
}
