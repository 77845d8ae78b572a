//! Airtime admission.
//!
//! [`TxParams`] accumulates what a PPDU under construction will carry
//! and how long the whole exchange lasts. Adding a frame is tentative:
//! [`TxParams::with_frame`] returns the grown parameters only when the
//! exchange still fits the budget, and the caller keeps its previous
//! value otherwise.
//!
//! # Contract
//!
//! - `total_duration() = protection_time + tx_duration + ack_time`.
//! - `tx_duration` is the airtime of the longest PSDU: for MU vectors the
//!   maximum over users, for SU vectors the airtime of the single PSDU.
//! - A `TxParams` returned by `with_frame` always fits the budget it was
//!   checked against.

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::trace;

use crate::budget::TimeBudget;
use crate::env::{AckPolicy, DurationOracle};
use crate::mac::Aid;
use crate::phy::TxVector;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxParams {
    pub tx_vector: TxVector,
    pub ack: AckPolicy,
    pub protection_time: Duration,
    pub tx_duration: Duration,
    pub ack_time: Duration,
    /// PSDU size per recipient; `None` keys the PSDU of an SU vector.
    psdu_sizes: BTreeMap<Option<Aid>, u32>,
}

impl TxParams {
    /// Parameters of an empty PPDU.
    pub fn new(tx_vector: TxVector, ack: AckPolicy) -> Self {
        Self {
            tx_vector,
            ack,
            protection_time: Duration::ZERO,
            tx_duration: Duration::ZERO,
            ack_time: Duration::ZERO,
            psdu_sizes: BTreeMap::new(),
        }
    }

    pub fn total_duration(&self) -> Duration {
        self.protection_time + self.tx_duration + self.ack_time
    }

    pub fn psdu_size(&self, recipient: Option<Aid>) -> Option<u32> {
        self.psdu_sizes.get(&recipient).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.psdu_sizes.is_empty()
    }

    /// Adds `size` bytes for `recipient` if the resulting exchange fits
    /// `budget`.
    pub fn with_frame<O: DurationOracle + ?Sized>(
        &self,
        oracle: &O,
        recipient: Option<Aid>,
        size: u32,
        budget: &TimeBudget,
    ) -> Option<TxParams> {
        let mut next = self.clone();
        let psdu = next.psdu_sizes.entry(recipient).or_insert(0);
        *psdu = psdu.saturating_add(size);
        next.refresh(oracle);
        if !budget.fits(next.total_duration()) {
            trace!(
                ?recipient,
                size,
                total = ?next.total_duration(),
                remaining = ?budget.remaining(),
                "frame does not fit the time budget"
            );
            return None;
        }
        Some(next)
    }

    /// Same PSDUs under `tx_vector`. PSDUs of recipients no longer in an
    /// MU vector are dropped. Not checked against any budget.
    pub fn with_vector<O: DurationOracle + ?Sized>(&self, oracle: &O, tx_vector: TxVector) -> TxParams {
        let mut next = self.clone();
        next.tx_vector = tx_vector;
        if next.tx_vector.is_mu() {
            let users = next.tx_vector.users();
            next.psdu_sizes
                .retain(|recipient, _| recipient.is_some_and(|aid| users.contains_key(&aid)));
        }
        next.refresh(oracle);
        next
    }

    fn refresh<O: DurationOracle + ?Sized>(&mut self, oracle: &O) {
        self.tx_duration = self
            .psdu_sizes
            .iter()
            .map(|(recipient, size)| oracle.tx_duration(*size, &self.tx_vector, *recipient))
            .max()
            .unwrap_or_default();
        self.protection_time = oracle.protection_duration(&self.tx_vector);
        self.ack_time = oracle.ack_duration(self.ack, &self.tx_vector);
    }
}
