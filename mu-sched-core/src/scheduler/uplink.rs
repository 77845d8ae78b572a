//! Uplink solicitation: BSRP and Basic trigger frames.
//!
//! A BSRP trigger asks the selected stations for buffer status reports;
//! the response is at most one QoS Null per TID. A Basic trigger solicits
//! data, sized by the largest buffer any selected station reported and
//! bounded by what is left of the TXOP.
//!
//! # Contract
//!
//! - No eligible station: the caller falls through to downlink MU.
//! - The trigger frame or its response does not fit: `NoTransmission`.
//! - The duration granted is always expressible as an L-SIG length and,
//!   for a Basic trigger, never runs past the TXOP.

use std::collections::BTreeSet;
use std::time::Duration;

use tracing::debug;

use super::allocation::{allocation_for, finalize_tx_vector};
use super::registry::{StationEntry, StationList};
use super::types::{AccessPoint, Candidate, TxOpportunity};
use crate::admission::TxParams;
use crate::config::SchedulerConfig;
use crate::constants::{MAX_PPDU_DURATION, NUM_TIDS};
use crate::env::{AckPolicy, BaRole, MacEnv};
use crate::mac::{qos_null_ampdu_size, Aid, MacAddress, TriggerFrame, TriggerKind};
use crate::phy::{he_tb_floor_duration, Preamble, TxVector, UserInfo};

/// A trigger selected but not yet handed out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UplinkBuild {
    pub trigger: TriggerFrame,
    pub params: TxParams,
    pub candidates: Vec<Candidate>,
    pub granted: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum UplinkOutcome {
    Built(UplinkBuild),
    /// Nobody to solicit; try downlink MU instead.
    FallThrough,
    SingleUser,
    NoTransmission,
}

/// Picks up to `max_stations` associated stations with an uplink block
/// ack agreement, in list order, that pass `eligible`, and assigns their
/// RUs in an HE TB vector.
fn solicit_candidates<E, F>(
    env: &E,
    config: &SchedulerConfig,
    opp: &TxOpportunity,
    list: &StationList,
    mut eligible: F,
) -> (TxVector, Vec<Candidate>)
where
    E: MacEnv + ?Sized,
    F: FnMut(&StationEntry) -> bool,
{
    let max_stations = usize::from(config.max_stations);
    let alloc = allocation_for(
        opp.width,
        max_stations.min(list.len()),
        config.use_central_26_tone_rus,
    );
    let capacity = max_stations.min(alloc.capacity());
    let on_link: BTreeSet<Aid> = env.associated_stations().iter().map(|s| s.aid).collect();

    let mut tb_vector = TxVector::mu(Preamble::HeTb, opp.width);
    let mut candidates = Vec::new();
    for station in list.iter() {
        if candidates.len() >= capacity {
            break;
        }
        if !on_link.contains(&station.aid) {
            debug!(aid = station.aid, "not associated on this link");
            continue;
        }
        if !eligible(station) {
            continue;
        }
        let has_agreement = (0..NUM_TIDS)
            .any(|tid| env.has_block_ack_session(station.address, tid, BaRole::Recipient));
        if !has_agreement {
            debug!(aid = station.aid, "no uplink block ack agreement");
            continue;
        }
        let rate = env.data_mode(station.address, opp.width);
        tb_vector.set_user(station.aid, UserInfo::new(None, rate));
        candidates.push(Candidate::station(station.aid, station.address));
    }

    finalize_tx_vector(
        opp.width,
        config.use_central_26_tone_rus,
        &mut tb_vector,
        &mut candidates,
    );
    (tb_vector, candidates)
}

/// Longest airtime any candidate needs for `size` bytes.
fn longest<E: MacEnv + ?Sized>(env: &E, size: u32, tb_vector: &TxVector, candidates: &[Candidate]) -> Duration {
    candidates
        .iter()
        .map(|c| env.tx_duration(size, tb_vector, Some(c.aid)))
        .max()
        .unwrap_or_default()
}

pub(crate) fn try_bsrp<E: MacEnv + ?Sized>(
    env: &E,
    config: &SchedulerConfig,
    ap: &AccessPoint,
    opp: &TxOpportunity,
    list: &StationList,
) -> UplinkOutcome {
    if list.is_empty() {
        return UplinkOutcome::SingleUser;
    }
    let (tb_vector, candidates) = solicit_candidates(env, config, opp, list, |_| true);
    if candidates.is_empty() {
        debug!("no station to send a BSRP trigger to");
        return UplinkOutcome::FallThrough;
    }

    let mut trigger = TriggerFrame::new(TriggerKind::Bsrp, ap.address, &tb_vector);
    let params = TxParams::new(env.control_tx_vector(MacAddress::BROADCAST), AckPolicy::NoAck);
    let Some(params) = params.with_frame(env, None, trigger.size(), &opp.budget) else {
        debug!("remaining TXOP too short for a BSRP trigger");
        return UplinkOutcome::NoTransmission;
    };

    let response = longest(env, qos_null_ampdu_size(NUM_TIDS), &tb_vector, &candidates);
    let mut budget = opp.budget;
    if !budget.charge(params.total_duration(), env.sifs()) || !budget.fits(response) {
        debug!(?response, "remaining TXOP too short for the BSRP response");
        return UplinkOutcome::NoTransmission;
    }

    let granted = trigger.set_ul_duration(response);
    debug!(stations = candidates.len(), ?granted, "BSRP trigger built");
    UplinkOutcome::Built(UplinkBuild {
        trigger,
        params,
        candidates,
        granted,
    })
}

pub(crate) fn try_basic<E: MacEnv + ?Sized>(
    env: &E,
    config: &SchedulerConfig,
    ap: &AccessPoint,
    opp: &TxOpportunity,
    list: &StationList,
) -> UplinkOutcome {
    if list.is_empty() {
        return UplinkOutcome::SingleUser;
    }
    let (tb_vector, candidates) = solicit_candidates(env, config, opp, list, |station| {
        env.buffer_status(station.address).has_data()
    });
    if candidates.is_empty() {
        debug!("no station with buffered uplink data");
        return UplinkOutcome::FallThrough;
    }

    let max_buffer = candidates
        .iter()
        .map(|c| env.buffer_status(c.address).bytes(config.ul_psdu_size))
        .max()
        .unwrap_or(0);
    if max_buffer == 0 {
        return UplinkOutcome::FallThrough;
    }

    let mut trigger = TriggerFrame::new(TriggerKind::Basic, ap.address, &tb_vector);
    let params = TxParams::new(
        env.control_tx_vector(MacAddress::BROADCAST),
        AckPolicy::MultiStaBlockAck,
    );
    let Some(params) = params.with_frame(env, None, trigger.size(), &opp.budget) else {
        debug!("remaining TXOP too short for a Basic trigger");
        return UplinkOutcome::NoTransmission;
    };

    let mut max_duration = MAX_PPDU_DURATION;
    if let Some(remaining) = opp.budget.remaining() {
        let overhead = params.protection_time + params.tx_duration + env.sifs() + params.ack_time;
        let Some(left) = remaining.checked_sub(overhead) else {
            debug!("no time left for the TB PPDU");
            return UplinkOutcome::NoTransmission;
        };
        let Some(floor) = he_tb_floor_duration(left) else {
            debug!(?left, "no expressible TB PPDU fits the remaining TXOP");
            return UplinkOutcome::NoTransmission;
        };
        max_duration = max_duration.min(floor);
    }

    let buffer_time = longest(env, max_buffer, &tb_vector, &candidates);
    if buffer_time < max_duration {
        max_duration = buffer_time;
    } else {
        let min_duration = candidates
            .iter()
            .map(|c| env.tx_duration(config.ul_psdu_size, &tb_vector, Some(c.aid)))
            .min()
            .unwrap_or_default();
        if max_duration < min_duration {
            debug!(?max_duration, ?min_duration, "TB PPDU too short for the minimum UL PSDU");
            return UplinkOutcome::NoTransmission;
        }
    }

    let granted = trigger.set_ul_duration(max_duration);
    trigger.preferred_ac = Some(opp.primary_ac);
    debug!(stations = candidates.len(), ?granted, max_buffer, "Basic trigger built");
    UplinkOutcome::Built(UplinkBuild {
        trigger,
        params,
        candidates,
        granted,
    })
}
