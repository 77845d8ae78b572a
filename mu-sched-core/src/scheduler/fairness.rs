//! Proportional-fair credit ledger.
//!
//! After every MU PPDU of duration `D` sent to stations drawn from a
//! list of `n`:
//!
//! - every station in the list earns `D / n` µs, capped at the maximum;
//! - each served station pays `D * bw(RU) / Σ bw` µs, where the sum runs
//!   over every RU in the PPDU;
//! - the list is stable-sorted by descending credit.
//!
//! Uncapped, credits conserve: the list as a whole earns `D` and, when
//! every user of the PPDU is in the list, pays `D`.

use std::cmp::Ordering;
use std::time::Duration;

use tracing::trace;

use super::registry::StationList;
use crate::mac::Aid;
use crate::phy::TxVector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FairnessLedger {
    max_credits: Duration,
}

fn micros(d: Duration) -> f64 {
    d.as_nanos() as f64 / 1_000.0
}

impl FairnessLedger {
    pub fn new(max_credits: Duration) -> Self {
        Self { max_credits }
    }

    pub fn max_credits(&self) -> Duration {
        self.max_credits
    }

    /// Settles a PPDU of `duration` that served `served` with the RUs of
    /// `tx_vector`.
    pub fn settle(&self, list: &mut StationList, duration: Duration, tx_vector: &TxVector, served: &[Aid]) {
        if list.is_empty() {
            return;
        }
        let d = micros(duration);
        let cap = micros(self.max_credits);
        let credit = d / list.len() as f64;
        let total_bw = f64::from(tx_vector.allocated_bandwidth_mhz());

        for entry in list.entries_mut().iter_mut() {
            entry.credits = (entry.credits + credit).min(cap);
        }

        if total_bw > 0.0 {
            for aid in served {
                let Some(ru) = tx_vector.user(*aid).and_then(|u| u.ru) else {
                    debug_assert!(false, "served station {aid} has no RU");
                    continue;
                };
                let Some(entry) = list.entries_mut().iter_mut().find(|e| e.aid == *aid) else {
                    continue;
                };
                entry.credits -= d * f64::from(ru.ru_type.bandwidth_mhz()) / total_bw;
            }
        }

        list.entries_mut()
            .sort_by(|a, b| b.credits.partial_cmp(&a.credits).unwrap_or(Ordering::Equal));
        trace!(order = ?list.aids(), "fairness ledger settled");
    }
}
