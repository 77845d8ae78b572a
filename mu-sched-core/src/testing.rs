//! Deterministic mock MAC environment.
//!
//! Airtime model, for every vector and every user: 20 µs plus 1 µs per
//! byte. Acknowledgements other than `NoAck` take 60 µs, protection is
//! free and SIFS is 16 µs. Control frames go out on a 20 MHz SU vector
//! at MCS 0.
//!
//! Not for production use: enabled for this crate's unit tests and, via
//! the `test-support` feature, for integration tests.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::admission::TxParams;
use crate::budget::TimeBudget;
use crate::constants::SIFS;
use crate::env::{
    AckPolicy, Aggregator, AssociatedStation, BaRole, BeamformerSink, BufferStatus, Clock,
    DurationOracle, RateManager, SoundingFrame, SoundingRole, StationCapabilities,
    StationDirectory, TxQueues,
};
use crate::mac::{AccessCategory, Aid, FrameId, FrameKind, MacAddress, Psdu, QueuedFrame, Tid};
use crate::phy::{ChannelWidth, RateSelection, TxVector};

/// Fixed per-PPDU overhead of the airtime model.
pub const MOCK_PREAMBLE: Duration = Duration::from_micros(20);

/// Acknowledgement time of the airtime model.
pub const MOCK_ACK: Duration = Duration::from_micros(60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockStation {
    pub aid: Aid,
    pub address: MacAddress,
    pub mld: Option<MacAddress>,
    pub associated: bool,
    pub capabilities: StationCapabilities,
    pub buffer: BufferStatus,
    pub rate: RateSelection,
    /// Block ack agreements in both directions on every TID.
    pub block_ack: bool,
}

impl MockStation {
    fn answers_to(&self, address: MacAddress) -> bool {
        self.address == address || self.mld == Some(address)
    }
}

/// Everything the scheduler handed to the beamformer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordedSounding {
    pub frames: BTreeMap<SoundingRole, SoundingFrame>,
    pub params: BTreeMap<SoundingRole, TxParams>,
    pub targets: Vec<MacAddress>,
    pub width: Option<ChannelWidth>,
    pub clears: u32,
}

#[derive(Debug, Default)]
pub struct MockEnv {
    pub now: Duration,
    pub stations: BTreeMap<Aid, MockStation>,
    pub sounding: RecordedSounding,
    /// Head frames of every PSDU aggregated so far.
    pub aggregated: Vec<FrameId>,
    queues: BTreeMap<AccessCategory, Vec<QueuedFrame>>,
    next_frame_id: FrameId,
    station_peeks: Cell<u32>,
}

impl MockEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Environment with MU-capable stations `1..=count`.
    pub fn with_stations(count: Aid) -> Self {
        let mut env = Self::new();
        for aid in 1..=count {
            env.add_station(aid);
        }
        env
    }

    /// Adds an associated MU-capable station with block ack agreements,
    /// 10 units (2560 bytes) of buffered uplink data and MCS 7.
    pub fn add_station(&mut self, aid: Aid) -> &mut MockStation {
        self.stations.entry(aid).or_insert(MockStation {
            aid,
            address: MacAddress::from_aid(aid),
            mld: None,
            associated: true,
            capabilities: StationCapabilities {
                multi_user: true,
                ..StationCapabilities::default()
            },
            buffer: BufferStatus::Units(10),
            rate: RateSelection { mcs: 7, nss: 1 },
            block_ack: true,
        })
    }

    pub fn station_mut(&mut self, aid: Aid) -> Option<&mut MockStation> {
        self.stations.get_mut(&aid)
    }

    fn station(&self, address: MacAddress) -> Option<&MockStation> {
        self.stations.values().find(|s| s.answers_to(address))
    }

    pub fn enqueue(&mut self, ac: AccessCategory, tid: Tid, receiver: MacAddress, size: u32) -> FrameId {
        self.push_frame(ac, FrameKind::QosData, Some(tid), receiver, size)
    }

    /// Queues the CF-Poll that opens a sensing step.
    pub fn enqueue_cf_poll(&mut self, ac: AccessCategory, receiver: MacAddress) -> FrameId {
        self.push_frame(ac, FrameKind::CfPoll, Some(ac.tids().0), receiver, 30)
    }

    /// One data frame of `size` bytes per station, on the category's low TID.
    pub fn saturate(&mut self, ac: AccessCategory, size: u32) {
        let receivers: Vec<MacAddress> = self.stations.values().map(|s| s.address).collect();
        for receiver in receivers {
            self.enqueue(ac, ac.tids().0, receiver, size);
        }
    }

    pub fn clear_queue(&mut self, ac: AccessCategory) {
        self.queues.remove(&ac);
    }

    /// Peeks restricted to a receiver so far.
    pub fn station_peeks(&self) -> u32 {
        self.station_peeks.get()
    }

    fn push_frame(
        &mut self,
        ac: AccessCategory,
        kind: FrameKind,
        tid: Option<Tid>,
        receiver: MacAddress,
        size: u32,
    ) -> FrameId {
        self.next_frame_id += 1;
        let frame = QueuedFrame {
            id: self.next_frame_id,
            kind,
            receiver,
            tid,
            size,
            retry: false,
        };
        self.queues.entry(ac).or_default().push(frame);
        frame.id
    }
}

impl Clock for MockEnv {
    fn now(&self) -> Duration {
        self.now
    }
}

impl DurationOracle for MockEnv {
    fn tx_duration(&self, size: u32, _vector: &TxVector, _recipient: Option<Aid>) -> Duration {
        MOCK_PREAMBLE + Duration::from_micros(u64::from(size))
    }

    fn ack_duration(&self, policy: AckPolicy, _vector: &TxVector) -> Duration {
        match policy {
            AckPolicy::NoAck => Duration::ZERO,
            _ => MOCK_ACK,
        }
    }

    fn sifs(&self) -> Duration {
        SIFS
    }
}

impl RateManager for MockEnv {
    fn data_mode(&self, station: MacAddress, _width: ChannelWidth) -> RateSelection {
        self.station(station)
            .map(|s| s.rate)
            .unwrap_or(RateSelection { mcs: 0, nss: 1 })
    }

    fn control_tx_vector(&self, _receiver: MacAddress) -> TxVector {
        TxVector::su(ChannelWidth::Mhz20, RateSelection { mcs: 0, nss: 1 })
    }
}

impl StationDirectory for MockEnv {
    fn supports_mu(&self, station: MacAddress) -> bool {
        self.station(station)
            .is_some_and(|s| s.capabilities.multi_user)
    }

    fn mld_or_link_address(&self, aid: Aid) -> Option<MacAddress> {
        self.stations.get(&aid).map(|s| s.mld.unwrap_or(s.address))
    }

    fn is_associated(&self, station: MacAddress) -> bool {
        self.stations
            .values()
            .any(|s| s.associated && s.answers_to(station))
    }

    fn associated_stations(&self) -> Vec<AssociatedStation> {
        self.stations
            .values()
            .filter(|s| s.associated)
            .map(|s| AssociatedStation {
                aid: s.aid,
                address: s.address,
            })
            .collect()
    }

    fn buffer_status(&self, station: MacAddress) -> BufferStatus {
        self.station(station)
            .map(|s| s.buffer)
            .unwrap_or(BufferStatus::Units(0))
    }

    fn has_block_ack_session(&self, station: MacAddress, _tid: Tid, _role: BaRole) -> bool {
        self.station(station).is_some_and(|s| s.block_ack)
    }

    fn capabilities(&self, station: MacAddress) -> Option<StationCapabilities> {
        self.station(station).map(|s| s.capabilities)
    }
}

impl TxQueues for MockEnv {
    fn peek(&self, ac: AccessCategory, tid: Option<Tid>, receiver: Option<MacAddress>) -> Option<QueuedFrame> {
        if receiver.is_some() {
            self.station_peeks.set(self.station_peeks.get() + 1);
        }
        self.queues
            .get(&ac)?
            .iter()
            .find(|f| tid.is_none_or_eq(f.tid) && receiver.is_none_or_eq(Some(f.receiver)))
            .copied()
    }
}

/// `None` matches anything.
trait MatchesAny<T> {
    fn is_none_or_eq(&self, other: Option<T>) -> bool;
}

impl<T: PartialEq + Copy> MatchesAny<T> for Option<T> {
    fn is_none_or_eq(&self, other: Option<T>) -> bool {
        match self {
            None => true,
            Some(wanted) => other == Some(*wanted),
        }
    }
}

impl Aggregator for MockEnv {
    fn aggregate(&mut self, head: &QueuedFrame, _params: &TxParams, _budget: TimeBudget) -> Psdu {
        self.aggregated.push(head.id);
        Psdu::single(head)
    }
}

impl BeamformerSink for MockEnv {
    fn set_frame(&mut self, role: SoundingRole, frame: SoundingFrame) {
        self.sounding.frames.insert(role, frame);
    }

    fn set_tx_params(&mut self, role: SoundingRole, params: &TxParams) {
        self.sounding.params.insert(role, params.clone());
    }

    fn announce_targets(&mut self, _transmitter: MacAddress, targets: &[MacAddress], width: ChannelWidth) {
        self.sounding.targets = targets.to_vec();
        self.sounding.width = Some(width);
    }

    fn announced_station_count(&self) -> usize {
        self.sounding.targets.len()
    }

    fn clear(&mut self) {
        self.sounding.frames.clear();
        self.sounding.params.clear();
        self.sounding.targets.clear();
        self.sounding.width = None;
        self.sounding.clears += 1;
    }
}
