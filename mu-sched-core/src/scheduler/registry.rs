//! Station registry: one downlink list per access category and one
//! uplink list, all holding the same MU-capable stations.
//!
//! List order is scheduling priority; the fairness ledger re-sorts a
//! list after every PPDU it serves.

use std::collections::BTreeMap;

use crate::mac::{AccessCategory, Aid, MacAddress};

#[derive(Debug, Clone, PartialEq)]
pub struct StationEntry {
    pub aid: Aid,
    /// MLD address for multi-link stations, link address otherwise.
    pub address: MacAddress,
    /// Fairness credits in microseconds of airtime.
    pub credits: f64,
}

/// Ordered stations without duplicate AIDs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationList {
    entries: Vec<StationEntry>,
}

impl StationList {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StationEntry> {
        self.entries.iter()
    }

    pub fn contains(&self, aid: Aid) -> bool {
        self.get(aid).is_some()
    }

    pub fn get(&self, aid: Aid) -> Option<&StationEntry> {
        self.entries.iter().find(|e| e.aid == aid)
    }

    /// AIDs in priority order.
    pub fn aids(&self) -> Vec<Aid> {
        self.entries.iter().map(|e| e.aid).collect()
    }

    pub(crate) fn entries_mut(&mut self) -> &mut Vec<StationEntry> {
        &mut self.entries
    }

    /// Appends a station with zero credits. Returns `false` if the AID is
    /// already listed.
    pub(crate) fn push(&mut self, aid: Aid, address: MacAddress) -> bool {
        if self.contains(aid) {
            return false;
        }
        self.entries.push(StationEntry {
            aid,
            address,
            credits: 0.0,
        });
        true
    }

    pub(crate) fn remove(&mut self, aid: Aid) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.aid != aid);
        self.entries.len() != before
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StationRegistry {
    downlink: BTreeMap<AccessCategory, StationList>,
    uplink: StationList,
}

impl Default for StationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StationRegistry {
    pub fn new() -> Self {
        Self {
            downlink: AccessCategory::ALL
                .into_iter()
                .map(|ac| (ac, StationList::default()))
                .collect(),
            uplink: StationList::default(),
        }
    }

    pub fn downlink(&self, ac: AccessCategory) -> &StationList {
        &self.downlink[&ac]
    }

    pub fn uplink(&self) -> &StationList {
        &self.uplink
    }

    pub(crate) fn downlink_mut(&mut self, ac: AccessCategory) -> &mut StationList {
        self.downlink.entry(ac).or_default()
    }

    pub(crate) fn uplink_mut(&mut self) -> &mut StationList {
        &mut self.uplink
    }

    pub fn contains(&self, aid: Aid) -> bool {
        self.uplink.contains(aid)
    }

    /// Adds the station to every list. Returns `false` if it was already
    /// registered.
    pub(crate) fn register(&mut self, aid: Aid, address: MacAddress) -> bool {
        let mut added = false;
        for list in self.downlink.values_mut() {
            added |= list.push(aid, address);
        }
        added |= self.uplink.push(aid, address);
        added
    }

    /// Removes the station from every list. Returns `false` if it was not
    /// registered.
    pub(crate) fn unregister(&mut self, aid: Aid) -> bool {
        let mut removed = false;
        for list in self.downlink.values_mut() {
            removed |= list.remove(aid);
        }
        removed |= self.uplink.remove(aid);
        removed
    }
}
