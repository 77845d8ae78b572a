//! Frame descriptors.
//!
//! The scheduler never touches frame bodies. Queued frames are known by
//! id, addressing and size; frames the scheduler builds itself (CF-Poll,
//! NDPA, NDP, trigger frames) are known by kind, addressing and the size
//! they will have on air.

use std::collections::BTreeMap;
use std::time::Duration;

use super::{Aid, MacAddress, Tid};
use crate::constants::{
    CF_POLL_SIZE, CTS_SIZE, MPDU_DELIMITER_SIZE, NDPA_BASE_SIZE, NDPA_STA_INFO_SIZE, NDP_SIZE,
    QOS_NULL_SIZE, TRIGGER_BASE_SIZE, TRIGGER_USER_INFO_SIZE,
};
use crate::mac::AccessCategory;
use crate::phy::{he_tb_lsig_length, ChannelWidth, Preamble, TxVector, UserInfo};

/// Opaque frame identifier, owned by the transmit queues.
pub type FrameId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    QosData,
    /// QoS Data carrying CF-Poll: queued by the MAC to open a sensing round.
    CfPoll,
    Management,
    Other,
}

/// A frame waiting in a transmit queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueuedFrame {
    pub id: FrameId,
    pub kind: FrameKind,
    pub receiver: MacAddress,
    pub tid: Option<Tid>,
    /// MPDU size in bytes.
    pub size: u32,
    pub retry: bool,
}

impl QueuedFrame {
    pub fn is_qos_data(&self) -> bool {
        self.kind == FrameKind::QosData
    }

    pub fn is_sensing_poll(&self) -> bool {
        self.kind == FrameKind::CfPoll
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    CfPoll,
    Ndpa,
    Ndp,
    Cts,
}

/// A frame built by the scheduler rather than taken from a queue.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ControlFrame {
    pub kind: ControlKind,
    pub receiver: MacAddress,
    pub transmitter: MacAddress,
    pub size: u32,
}

impl ControlFrame {
    pub fn cf_poll(receiver: MacAddress, transmitter: MacAddress) -> Self {
        Self {
            kind: ControlKind::CfPoll,
            receiver,
            transmitter,
            size: CF_POLL_SIZE,
        }
    }

    /// NDP Announcement carrying one STA Info field per sounded station.
    pub fn ndpa(receiver: MacAddress, transmitter: MacAddress, stations: usize) -> Self {
        Self {
            kind: ControlKind::Ndpa,
            receiver,
            transmitter,
            size: NDPA_BASE_SIZE + NDPA_STA_INFO_SIZE * stations as u32,
        }
    }

    pub fn ndp(receiver: MacAddress, transmitter: MacAddress) -> Self {
        Self {
            kind: ControlKind::Ndp,
            receiver,
            transmitter,
            size: NDP_SIZE,
        }
    }

    pub fn cts(receiver: MacAddress) -> Self {
        Self {
            kind: ControlKind::Cts,
            receiver,
            transmitter: receiver,
            size: CTS_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerKind {
    /// Solicits uplink data.
    Basic,
    /// Beamforming report poll.
    Bfrp,
    /// Buffer status report poll.
    Bsrp,
}

impl TriggerKind {
    /// Trigger-dependent user info bytes per User Info field.
    const fn dependent_user_info_size(self) -> u32 {
        match self {
            TriggerKind::Basic | TriggerKind::Bfrp => 1,
            TriggerKind::Bsrp => 0,
        }
    }
}

/// Trigger frame soliciting HE TB PPDUs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerFrame {
    pub kind: TriggerKind,
    pub transmitter: MacAddress,
    pub receiver: MacAddress,
    pub width: ChannelWidth,
    /// One User Info field per solicited station.
    pub users: BTreeMap<Aid, UserInfo>,
    /// L-SIG length of the solicited TB PPDU.
    pub ul_length: u16,
    pub preferred_ac: Option<AccessCategory>,
}

impl TriggerFrame {
    /// Broadcast trigger whose User Info fields mirror `tb_vector`'s users.
    pub fn new(kind: TriggerKind, transmitter: MacAddress, tb_vector: &TxVector) -> Self {
        Self {
            kind,
            transmitter,
            receiver: MacAddress::BROADCAST,
            width: tb_vector.width,
            users: tb_vector.users().clone(),
            ul_length: 0,
            preferred_ac: None,
        }
    }

    pub fn size(&self) -> u32 {
        let per_user = TRIGGER_USER_INFO_SIZE + self.kind.dependent_user_info_size();
        TRIGGER_BASE_SIZE + per_user * self.users.len() as u32
    }

    /// Sets the L-SIG length for a TB PPDU of `duration` and returns the
    /// duration actually granted.
    pub fn set_ul_duration(&mut self, duration: Duration) -> Duration {
        let (length, granted) = he_tb_lsig_length(duration);
        self.ul_length = length;
        granted
    }

    /// The HE TB vector the solicited stations transmit with.
    pub fn tb_vector(&self) -> TxVector {
        let mut vector = TxVector::mu(Preamble::HeTb, self.width);
        for (aid, info) in &self.users {
            vector.set_user(*aid, *info);
        }
        vector
    }
}

/// A PSDU produced by the aggregator: the queued frames it carries and
/// its total size.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Psdu {
    pub frames: Vec<FrameId>,
    pub size: u32,
}

impl Psdu {
    pub fn single(frame: &QueuedFrame) -> Self {
        Self {
            frames: vec![frame.id],
            size: frame.size,
        }
    }
}

/// Size of an A-MPDU carrying `count` QoS Null frames; the largest
/// response a BSRP trigger may solicit (one per TID).
pub fn qos_null_ampdu_size(count: u8) -> u32 {
    let subframe = (QOS_NULL_SIZE + MPDU_DELIMITER_SIZE).next_multiple_of(4);
    subframe * u32::from(count)
}
