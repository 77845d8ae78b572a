//! Sensing sub-protocol: poll rounds and sounding announcements.
//!
//! A poll round sends one CF-Poll per station in a DL MU PPDU, then a
//! trigger soliciting a CTS from each. Stations that answer are recorded
//! through [`SensingState::acknowledge`] and become the pool for the next
//! sounding round.
//!
//! A sounding round is NDPA, NDP, then either the single station's
//! report or, for several stations, a BFRP trigger and their TB reports:
//!
//! ```text
//! NDPA ─SIFS─ NDP ─SIFS─ [BFRP ─SIFS─] report(s)
//! ```
//!
//! Stations are added one at a time. Each addition recomputes the whole
//! round (the NDPA grows, the BFRP appears or grows, the longest report
//! may change) from the budget left after the NDP, and the round stops
//! at the first station that does not fit.

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::debug;

use super::allocation::{allocation_for, finalize_tx_vector};
use super::registry::StationList;
use super::report::{report_length, FeedbackType};
use super::types::{AccessPoint, Candidate, SoundingTarget, TxOpportunity};
use crate::admission::TxParams;
use crate::budget::TimeBudget;
use crate::config::{SchedulerConfig, SoundingMode};
use crate::constants::{CTS_SIZE, POLL_MCS};
use crate::env::{AckPolicy, MacEnv, SoundingFrame, SoundingRole};
use crate::mac::{Aid, ControlFrame, MacAddress, TriggerFrame, TriggerKind};
use crate::phy::{Preamble, RateSelection, RuSpec, RuType, TxVector, UserInfo};

/// Sensing progress carried between opportunities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SensingState {
    /// Stations polled in the last poll round, not yet acknowledged.
    pub polled: Vec<Candidate>,
    /// Stations that answered the last poll round, in answer order.
    pub acknowledged: Vec<Candidate>,
    /// Next acknowledged station to sound in SU-only mode.
    pub su_cursor: usize,
    /// Stations accepted into the last sounding round.
    pub round: Vec<SoundingTarget>,
}

impl SensingState {
    pub fn start_poll_round(&mut self) {
        self.polled.clear();
        self.acknowledged.clear();
        self.su_cursor = 0;
        self.round.clear();
    }

    /// Moves a polled station to the acknowledged pool.
    pub fn acknowledge(&mut self, address: MacAddress, mode: SoundingMode) -> bool {
        let Some(pos) = self.polled.iter().position(|c| c.address == address) else {
            return false;
        };
        let station = self.polled.remove(pos);
        if !self.acknowledged.iter().any(|c| c.aid == station.aid) {
            self.acknowledged.push(station);
        }
        if mode == SoundingMode::SuOnly && self.acknowledged.len() > 1 {
            self.su_cursor = 0;
        }
        true
    }

    pub fn has_next_su(&self) -> bool {
        self.su_cursor < self.acknowledged.len()
    }

    pub fn next_su(&mut self) -> Option<Candidate> {
        let next = self.acknowledged.get(self.su_cursor).copied();
        if next.is_some() {
            self.su_cursor += 1;
        }
        next
    }

    pub fn forget(&mut self, aid: Aid) {
        self.polled.retain(|c| c.aid != aid);
        if let Some(pos) = self.acknowledged.iter().position(|c| c.aid == aid) {
            self.acknowledged.remove(pos);
            if pos < self.su_cursor {
                self.su_cursor -= 1;
            }
        }
        self.round.retain(|t| t.aid != aid);
    }
}

/// A poll round selected but not yet handed out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PollBuild {
    pub params: TxParams,
    pub candidates: Vec<Candidate>,
    pub polls: BTreeMap<Aid, ControlFrame>,
    pub trigger: TriggerFrame,
    pub trigger_params: TxParams,
    pub response: Duration,
}

pub(crate) fn try_poll<E: MacEnv + ?Sized>(
    env: &E,
    config: &SchedulerConfig,
    ap: &AccessPoint,
    opp: &TxOpportunity,
    list: &StationList,
) -> Option<PollBuild> {
    if list.is_empty() {
        debug!("no station to poll");
        return None;
    }
    let use_central = config.use_central_26_tone_rus;
    let alloc = allocation_for(opp.width, list.len(), use_central);
    let capacity = alloc.capacity();
    let budget = opp.budget;

    let mut params = TxParams::new(TxVector::mu(Preamble::HeMu, opp.width), AckPolicy::NoAck);
    let mut candidates = Vec::new();
    let mut polls = BTreeMap::new();
    for station in list.iter() {
        if candidates.len() >= capacity {
            break;
        }
        let ru_type = if candidates.len() < alloc.n_rus {
            alloc.ru_type
        } else {
            RuType::Tones26
        };
        let poll = ControlFrame::cf_poll(station.address, ap.address);
        let rate = RateSelection {
            mcs: POLL_MCS,
            nss: ap.antennas,
        };
        let mut tentative = params.clone();
        tentative
            .tx_vector
            .set_user(station.aid, UserInfo::new(Some(RuSpec::new(ru_type, 1)), rate));
        match tentative.with_frame(env, Some(station.aid), poll.size, &budget) {
            Some(admitted) => {
                params = admitted;
                candidates.push(Candidate::station(station.aid, station.address));
                polls.insert(station.aid, poll);
            }
            None => debug!(aid = station.aid, "CF-Poll violates time constraints"),
        }
    }
    if candidates.is_empty() {
        return None;
    }

    let mut dl_vector = params.tx_vector.clone();
    finalize_tx_vector(opp.width, use_central, &mut dl_vector, &mut candidates);
    polls.retain(|aid, _| candidates.iter().any(|c| c.aid == *aid));
    let params = params.with_vector(env, dl_vector);

    let mut remaining = budget;
    if !remaining.charge(params.total_duration(), env.sifs()) {
        debug!("poll PPDU does not fit the remaining TXOP");
        return None;
    }

    // acknowledgement trigger for the same stations on the same RUs
    let mut tb_vector = TxVector::mu(Preamble::HeTb, opp.width);
    for candidate in &candidates {
        let ru = params.tx_vector.user(candidate.aid).and_then(|u| u.ru);
        let nss = env.control_tx_vector(candidate.address).rate.nss;
        tb_vector.set_user(candidate.aid, UserInfo::new(ru, RateSelection { mcs: POLL_MCS, nss }));
    }
    let mut trigger = TriggerFrame::new(TriggerKind::Bsrp, ap.address, &tb_vector);
    let trigger_params = TxParams::new(env.control_tx_vector(MacAddress::BROADCAST), AckPolicy::NoAck)
        .with_frame(env, None, trigger.size(), &remaining)?;
    if !remaining.charge(trigger_params.total_duration(), env.sifs()) {
        return None;
    }

    let cts = candidates
        .iter()
        .map(|c| env.tx_duration(CTS_SIZE, &env.control_tx_vector(c.address), None))
        .max()
        .unwrap_or_default();
    let response = trigger.set_ul_duration(cts);
    if !remaining.charge(response, env.sifs()) || !remaining.has_time_left() {
        debug!(?response, "CTS responses do not fit the remaining TXOP");
        return None;
    }

    debug!(stations = candidates.len(), "poll round built");
    Some(PollBuild {
        params,
        candidates,
        polls,
        trigger,
        trigger_params,
        response,
    })
}

/// Runs the announce phase over `pool`, handing every accepted frame and
/// parameter set to the beamformer. Returns the accepted stations, or
/// `None` when not even the first fits.
pub(crate) fn try_announce<E: MacEnv + ?Sized>(
    env: &mut E,
    config: &SchedulerConfig,
    ap: &AccessPoint,
    opp: &TxOpportunity,
    pool: &[Candidate],
) -> Option<Vec<SoundingTarget>> {
    if pool.is_empty() {
        debug!("no acknowledged station to sound");
        return None;
    }
    env.clear();
    let feedback = if pool.len() > 1 {
        FeedbackType::MultiUser
    } else {
        FeedbackType::SingleUser
    };
    let control = env.control_tx_vector(MacAddress::BROADCAST);
    let start = opp.admission_budget();

    let ndp_vector = TxVector::su(
        opp.width,
        RateSelection {
            mcs: 0,
            nss: ap.antennas,
        },
    );
    let ndp = ControlFrame::ndp(MacAddress::BROADCAST, ap.address);
    let ndp_params = TxParams::new(ndp_vector, AckPolicy::NoAck).with_frame(&*env, None, ndp.size, &start)?;
    let mut after_ndp = start;
    if !after_ndp.charge(ndp_params.total_duration(), env.sifs()) {
        return None;
    }

    let mut accepted: Vec<SoundingTarget> = Vec::new();
    let mut members: Vec<Candidate> = Vec::new();
    for station in pool {
        let mut trial = members.clone();
        trial.push(*station);
        let Some(round) = plan_round(&*env, config, ap, opp, &trial, feedback, after_ndp, &control) else {
            debug!(aid = station.aid, accepted = members.len(), "sounding round full");
            break;
        };

        env.set_tx_params(SoundingRole::Announce, &round.announce_params);
        env.set_frame(SoundingRole::Announce, SoundingFrame::Control(round.announce));
        if let Some((trigger, trigger_params)) = round.report_trigger {
            env.set_tx_params(SoundingRole::ReportTrigger, &trigger_params);
            env.set_frame(SoundingRole::ReportTrigger, SoundingFrame::Trigger(trigger));
        }
        members = trial;
        accepted = round.targets;
    }

    if accepted.is_empty() {
        return None;
    }

    let addresses: Vec<MacAddress> = accepted.iter().map(|t| t.address).collect();
    env.announce_targets(ap.address, &addresses, opp.width);
    let receiver = if env.announced_station_count() == 1 {
        addresses[0]
    } else {
        MacAddress::BROADCAST
    };
    env.set_tx_params(SoundingRole::Probe, &ndp_params);
    env.set_frame(
        SoundingRole::Probe,
        SoundingFrame::Control(ControlFrame::ndp(receiver, ap.address)),
    );
    debug!(stations = accepted.len(), ?feedback, "sounding round announced");
    Some(accepted)
}

struct PlannedRound {
    announce: ControlFrame,
    announce_params: TxParams,
    report_trigger: Option<(TriggerFrame, TxParams)>,
    targets: Vec<SoundingTarget>,
}

/// Costs a round sounding exactly `members`, starting from the budget
/// left after the NDP. `None` if any step does not fit.
#[allow(clippy::too_many_arguments)]
fn plan_round<E: MacEnv + ?Sized>(
    env: &E,
    config: &SchedulerConfig,
    ap: &AccessPoint,
    opp: &TxOpportunity,
    members: &[Candidate],
    feedback: FeedbackType,
    after_ndp: TimeBudget,
    control: &TxVector,
) -> Option<PlannedRound> {
    let mut budget = after_ndp;

    let announce = ControlFrame::ndpa(MacAddress::BROADCAST, ap.address, members.len());
    let announce_params = TxParams::new(control.clone(), AckPolicy::NoAck).with_frame(env, None, announce.size, &budget)?;
    if !budget.charge(announce_params.total_duration(), env.sifs()) {
        return None;
    }

    let report_rate = |address: MacAddress| {
        let mut rate = env.data_mode(address, opp.width);
        if let Some(mcs) = config.sensing.report_mcs {
            rate.mcs = mcs;
        }
        rate
    };

    let (report_vector, report_trigger) = if members.len() > 1 {
        let mut tb_vector = TxVector::mu(Preamble::HeTb, opp.width);
        for m in members {
            let rate = RateSelection {
                nss: 1,
                ..report_rate(m.address)
            };
            tb_vector.set_user(m.aid, UserInfo::new(None, rate));
        }
        let mut placed = members.to_vec();
        finalize_tx_vector(opp.width, config.use_central_26_tone_rus, &mut tb_vector, &mut placed);
        if placed.len() < members.len() {
            return None;
        }
        let trigger = TriggerFrame::new(TriggerKind::Bfrp, ap.address, &tb_vector);
        let trigger_params =
            TxParams::new(control.clone(), AckPolicy::NoAck).with_frame(env, None, trigger.size(), &budget)?;
        if !budget.charge(trigger_params.total_duration(), env.sifs()) {
            return None;
        }
        (tb_vector, Some((trigger, trigger_params)))
    } else {
        (TxVector::su(opp.width, report_rate(members[0].address)), None)
    };

    let targets: Vec<SoundingTarget> = members
        .iter()
        .map(|m| {
            let caps = env.capabilities(m.address).unwrap_or_default().beamformee;
            let report_size = report_length(opp.width, &caps, ap.antennas, feedback);
            let recipient = report_vector.is_mu().then_some(m.aid);
            SoundingTarget {
                aid: m.aid,
                address: m.address,
                report_size,
                report_duration: env.tx_duration(report_size, &report_vector, recipient),
            }
        })
        .collect();
    let longest = targets.iter().map(|t| t.report_duration).max().unwrap_or_default();
    if !budget.fits_strictly(longest) {
        return None;
    }

    let report_trigger = report_trigger.map(|(mut trigger, params)| {
        trigger.set_ul_duration(longest);
        (trigger, params)
    });
    Some(PlannedRound {
        announce,
        announce_params,
        report_trigger,
        targets,
    })
}
