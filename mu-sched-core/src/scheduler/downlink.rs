//! Downlink MU assembly.
//!
//! Walks the primary category's station list in priority order and
//! gives each station the first TID, in TXOP-sharing order, that has an
//! established block ack agreement, a queued frame and room in the
//! budget. Admission happens against a placeholder RU; the final RUs are
//! assigned by [`finalize`].

use tracing::debug;

use super::allocation::{allocation_for, finalize_tx_vector};
use super::registry::StationList;
use super::types::{Candidate, DlInfo, TxOpportunity};
use crate::admission::TxParams;
use crate::config::SchedulerConfig;
use crate::env::{AckPolicy, BaRole, MacEnv};
use crate::mac::{AccessCategory, QueuedFrame, Tid};
use crate::phy::{Preamble, RuSpec, RuType, TxVector, UserInfo};

/// A DL MU PPDU selected but not yet finalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DownlinkBuild {
    pub params: TxParams,
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DownlinkOutcome {
    Built(DownlinkBuild),
    SingleUser,
    NoTransmission,
}

/// TIDs to try for each station. Only the head frame's TID (or the
/// primary category's high TID) without TXOP sharing; with it, the pair
/// of that TID and then every later category, high TID first.
pub(crate) fn candidate_tids(
    primary: AccessCategory,
    head: Option<&QueuedFrame>,
    txop_sharing: bool,
) -> Vec<Tid> {
    let first = head
        .filter(|f| f.is_qos_data())
        .and_then(|f| f.tid)
        .filter(|tid| AccessCategory::from_tid(*tid) == primary)
        .unwrap_or(primary.high_tid());
    let mut tids = vec![first];
    if txop_sharing {
        tids.push(primary.other_tid(first));
        for ac in primary.and_following().skip(1) {
            let high = ac.high_tid();
            tids.extend([high, ac.other_tid(high)]);
        }
    }
    tids
}

pub(crate) fn assemble<E: MacEnv + ?Sized>(
    env: &E,
    config: &SchedulerConfig,
    opp: &TxOpportunity,
    list: &StationList,
    head: Option<&QueuedFrame>,
) -> DownlinkOutcome {
    let fallback = if config.force_dl_mu {
        DownlinkOutcome::NoTransmission
    } else {
        DownlinkOutcome::SingleUser
    };
    if list.is_empty() {
        return fallback;
    }

    let max_stations = usize::from(config.max_stations);
    let alloc = allocation_for(
        opp.width,
        max_stations.min(list.len()),
        config.use_central_26_tone_rus,
    );
    let capacity = max_stations.min(alloc.capacity());
    let tids = candidate_tids(opp.primary_ac, head, config.txop_sharing);
    let budget = opp.admission_budget();

    let mut params = TxParams::new(TxVector::mu(Preamble::HeMu, opp.width), AckPolicy::DlMuBlockAck);
    let mut candidates: Vec<Candidate> = Vec::new();

    for station in list.iter() {
        if candidates.len() >= capacity {
            break;
        }
        let ru_type = if candidates.len() < alloc.n_rus {
            alloc.ru_type
        } else {
            RuType::Tones26
        };

        for &tid in &tids {
            if !env.has_block_ack_session(station.address, tid, BaRole::Originator) {
                continue;
            }
            let ac = AccessCategory::from_tid(tid);
            let Some(frame) = env.peek(ac, Some(tid), Some(station.address)) else {
                continue;
            };

            let rate = env.data_mode(station.address, opp.width);
            let mut tentative = params.clone();
            tentative
                .tx_vector
                .set_user(station.aid, UserInfo::new(Some(RuSpec::new(ru_type, 1)), rate));
            match tentative.with_frame(env, Some(station.aid), frame.size, &budget) {
                Some(admitted) => {
                    params = admitted;
                    candidates.push(Candidate {
                        aid: station.aid,
                        address: station.address,
                        frame: Some(frame),
                    });
                    break;
                }
                None => {
                    debug!(aid = station.aid, tid, size = frame.size, "frame violates time constraints");
                }
            }
        }
    }

    if candidates.is_empty() {
        debug!("no station could be served with a DL MU PPDU");
        return fallback;
    }
    debug!(stations = candidates.len(), "DL MU PPDU assembled");
    DownlinkOutcome::Built(DownlinkBuild { params, candidates })
}

/// Assigns final RUs, re-admits the frames under them and aggregates
/// one PSDU per served station. Returns the served candidates alongside.
pub(crate) fn finalize<E: MacEnv + ?Sized>(
    env: &mut E,
    config: &SchedulerConfig,
    opp: &TxOpportunity,
    build: DownlinkBuild,
) -> (DlInfo, Vec<Candidate>) {
    let DownlinkBuild { params, mut candidates } = build;
    let mut tx_vector = params.tx_vector.clone();
    finalize_tx_vector(
        opp.width,
        config.use_central_26_tone_rus,
        &mut tx_vector,
        &mut candidates,
    );

    let tx_params = params.with_vector(&*env, tx_vector);
    debug_assert!(
        opp.admission_budget().fits(tx_params.total_duration()),
        "wider RUs cannot lengthen the PPDU"
    );

    let psdus = candidates
        .iter()
        .filter_map(|c| {
            let frame = c.frame?;
            Some((c.aid, env.aggregate(&frame, &tx_params, opp.budget)))
        })
        .collect();

    (DlInfo { tx_params, psdus }, candidates)
}
