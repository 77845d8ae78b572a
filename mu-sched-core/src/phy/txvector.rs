//! TX vectors: the PHY parameters of one PPDU.

use std::collections::BTreeMap;

use super::ru::{ChannelWidth, RuSpec};
use crate::mac::Aid;

/// HE PPDU format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preamble {
    /// Single-user (also used for control frames).
    HeSu,
    /// Downlink multi-user.
    HeMu,
    /// Trigger-based uplink.
    HeTb,
}

impl Preamble {
    pub const fn is_mu(self) -> bool {
        matches!(self, Preamble::HeMu | Preamble::HeTb)
    }
}

/// Rate chosen by the rate manager for one station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RateSelection {
    pub mcs: u8,
    pub nss: u8,
}

/// Per-station parameters inside an MU TX vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserInfo {
    /// `None` until the RU assignment is finalized.
    pub ru: Option<RuSpec>,
    pub mcs: u8,
    pub nss: u8,
}

impl UserInfo {
    pub const fn new(ru: Option<RuSpec>, rate: RateSelection) -> Self {
        Self {
            ru,
            mcs: rate.mcs,
            nss: rate.nss,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxVector {
    pub preamble: Preamble,
    pub width: ChannelWidth,
    /// Rate of an SU vector. Ignored for MU vectors, whose rates are per user.
    pub rate: RateSelection,
    users: BTreeMap<Aid, UserInfo>,
}

impl TxVector {
    pub fn su(width: ChannelWidth, rate: RateSelection) -> Self {
        Self {
            preamble: Preamble::HeSu,
            width,
            rate,
            users: BTreeMap::new(),
        }
    }

    /// MU vector with no users yet.
    pub fn mu(preamble: Preamble, width: ChannelWidth) -> Self {
        Self {
            preamble,
            width,
            rate: RateSelection { mcs: 0, nss: 1 },
            users: BTreeMap::new(),
        }
    }

    pub fn is_mu(&self) -> bool {
        self.preamble.is_mu()
    }

    pub fn users(&self) -> &BTreeMap<Aid, UserInfo> {
        &self.users
    }

    pub fn user(&self, aid: Aid) -> Option<&UserInfo> {
        self.users.get(&aid)
    }

    pub fn set_user(&mut self, aid: Aid, info: UserInfo) {
        self.users.insert(aid, info);
    }

    pub fn remove_user(&mut self, aid: Aid) -> Option<UserInfo> {
        self.users.remove(&aid)
    }

    pub fn take_users(&mut self) -> BTreeMap<Aid, UserInfo> {
        std::mem::take(&mut self.users)
    }

    /// Sum of the nominal bandwidth of every assigned RU, in MHz.
    pub fn allocated_bandwidth_mhz(&self) -> u32 {
        self.users
            .values()
            .filter_map(|u| u.ru)
            .map(|ru| ru.ru_type.bandwidth_mhz())
            .sum()
    }
}
