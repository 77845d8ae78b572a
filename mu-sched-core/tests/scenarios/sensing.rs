//! Sensing: poll rounds followed by sounding announcements.
//!
//! Airtime with two stations on 20 MHz and a two-antenna AP:
//!
//! ```text
//! poll round   CF-Poll 50 + SIFS + BSRP 58 + SIFS + CTS 36 + SIFS = 192 µs
//! MU sounding  NDP 20 + SIFS + NDPA 49 + SIFS + BFRP 60 + SIFS
//!              + report 68 (48 bytes)                             > 245 µs
//! ```

use std::time::Duration;

use mu_sched_core::env::{SoundingFrame, SoundingRole};
use mu_sched_core::mac::{AccessCategory, Aid, ControlKind, MacAddress, TriggerKind};
use mu_sched_core::phy::RuType;
use mu_sched_core::testing::MockEnv;
use mu_sched_core::{MuScheduler, PollInfo, SchedulerConfig, SensingConfig, SoundingMode, SoundingScope, TxFormat};

use crate::common::{limited, scheduler, unlimited, us};

const BE: AccessCategory = AccessCategory::BestEffort;

fn sensing_config(mode: SoundingMode) -> SchedulerConfig {
    SchedulerConfig {
        sensing: SensingConfig {
            enabled: true,
            mode,
            ..SensingConfig::default()
        },
        ..SchedulerConfig::default()
    }
}

fn sensing_env(stations: Aid) -> MockEnv {
    let mut env = MockEnv::with_stations(stations);
    env.enqueue_cf_poll(BE, MacAddress::from_aid(1));
    env
}

fn poll_round(sched: &mut MuScheduler, env: &mut MockEnv, budget_us: u64) -> PollInfo {
    assert_eq!(sched.select_tx_format(env, limited(budget_us)), TxFormat::Poll);
    sched.compute_poll_info().expect("poll info")
}

fn acknowledge_all(sched: &mut MuScheduler, stations: Aid) {
    for aid in 1..=stations {
        assert!(sched.on_poll_acknowledged(MacAddress::from_aid(aid)));
    }
}

fn control(env: &MockEnv, role: SoundingRole) -> Option<(ControlKind, MacAddress, u32)> {
    match env.sounding.frames.get(&role)? {
        SoundingFrame::Control(frame) => Some((frame.kind, frame.receiver, frame.size)),
        SoundingFrame::Trigger(_) => None,
    }
}

fn sounded(sched: &MuScheduler) -> Vec<Aid> {
    sched.sounding_round().iter().map(|t| t.aid).collect()
}

// ─── Poll round ────────────────────────────────────────────────────────

#[test]
fn poll_round_polls_every_station_then_solicits_cts() {
    let mut env = sensing_env(2);
    let mut sched = scheduler(sensing_config(SoundingMode::MuOnly), &env);

    let info = poll_round(&mut sched, &mut env, 200);

    assert_eq!(info.polls.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
    assert!(info.polls.values().all(|p| p.kind == ControlKind::CfPoll));
    assert_eq!(info.tx_params.tx_duration, us(50));
    for aid in [1, 2] {
        let user = info.tx_params.tx_vector.user(aid).expect("polled user");
        assert_eq!(user.ru.map(|ru| ru.ru_type), Some(RuType::Tones106));
        assert_eq!(user.nss, 2, "polls use every AP antenna");
        assert_eq!(info.trigger.users[&aid].ru, user.ru, "CTS on the poll's RU");
    }
    assert_eq!(info.trigger.kind, TriggerKind::Bsrp);
    assert_eq!(info.trigger_params.tx_duration, us(58));
    assert_eq!(info.response, us(36));
    assert_eq!(env.sounding.clears, 1, "a poll round resets the beamformer");
}

#[test]
fn poll_round_needs_time_after_the_responses() {
    let mut env = sensing_env(2);
    let mut sched = scheduler(sensing_config(SoundingMode::MuOnly), &env);

    assert_eq!(sched.select_tx_format(&mut env, limited(192)), TxFormat::NoTransmission);
    assert_eq!(sched.stats().sensing_timeouts, 1);
    assert!(sched.compute_poll_info().is_none());

    poll_round(&mut sched, &mut env, 193);
}

#[test]
fn acknowledgement_from_unpolled_station_is_ignored() {
    let mut env = sensing_env(2);
    let mut sched = scheduler(sensing_config(SoundingMode::MuOnly), &env);
    assert!(!sched.on_poll_acknowledged(MacAddress::from_aid(1)));

    poll_round(&mut sched, &mut env, 1_000);
    assert!(sched.on_poll_acknowledged(MacAddress::from_aid(2)));
    assert!(!sched.on_poll_acknowledged(MacAddress::from_aid(2)));
    assert!(!sched.on_poll_acknowledged(MacAddress::from_aid(7)));
    assert_eq!(sched.acknowledged_stations(), vec![2]);
}

// ─── MU sounding ───────────────────────────────────────────────────────

#[test]
fn mu_sounding_covers_every_acknowledged_station() {
    let mut env = sensing_env(2);
    let mut sched = scheduler(sensing_config(SoundingMode::MuOnly), &env);
    poll_round(&mut sched, &mut env, 1_000);
    acknowledge_all(&mut sched, 2);

    let format = sched.select_tx_format(&mut env, unlimited());
    assert_eq!(format, TxFormat::SoundingAnnounce(SoundingScope::Mu));
    assert_eq!(sounded(&sched), vec![1, 2]);
    assert!(sched.sounding_round().iter().all(|t| t.report_size == 48));

    assert_eq!(
        control(&env, SoundingRole::Announce),
        Some((ControlKind::Ndpa, MacAddress::BROADCAST, 29))
    );
    assert_eq!(
        control(&env, SoundingRole::Probe),
        Some((ControlKind::Ndp, MacAddress::BROADCAST, 0))
    );
    let Some(SoundingFrame::Trigger(trigger)) = env.sounding.frames.get(&SoundingRole::ReportTrigger) else {
        panic!("BFRP trigger expected for two stations");
    };
    assert_eq!(trigger.kind, TriggerKind::Bfrp);
    // 68 µs of report
    assert_eq!(trigger.ul_length, 31);
    assert_eq!(env.sounding.params[&SoundingRole::ReportTrigger].tx_duration, us(60));
    assert_eq!(env.sounding.targets, vec![MacAddress::from_aid(1), MacAddress::from_aid(2)]);
    assert_eq!(sched.stats().sounded_stations, 2);
}

#[test]
fn mu_sounding_stops_at_first_station_that_does_not_fit() {
    let mut env = sensing_env(2);
    let mut sched = scheduler(sensing_config(SoundingMode::MuOnly), &env);
    poll_round(&mut sched, &mut env, 200);
    acknowledge_all(&mut sched, 2);

    let format = sched.select_tx_format(&mut env, limited(200));
    assert_eq!(format, TxFormat::SoundingAnnounce(SoundingScope::Mu));
    assert_eq!(sounded(&sched), vec![1]);

    // a lone station is sounded without a BFRP and the NDP is addressed to it
    assert!(!env.sounding.frames.contains_key(&SoundingRole::ReportTrigger));
    assert_eq!(
        control(&env, SoundingRole::Announce),
        Some((ControlKind::Ndpa, MacAddress::BROADCAST, 25))
    );
    assert_eq!(
        control(&env, SoundingRole::Probe),
        Some((ControlKind::Ndp, MacAddress::from_aid(1), 0))
    );
    // the pool held two stations, so the report is still MU feedback
    let target = &sched.sounding_round()[0];
    assert_eq!(target.report_size, 48);
    assert_eq!(target.report_duration, us(68));
}

#[test]
fn sounding_that_fits_nobody_times_out() {
    let mut env = sensing_env(2);
    let mut sched = scheduler(sensing_config(SoundingMode::MuOnly), &env);
    poll_round(&mut sched, &mut env, 200);
    acknowledge_all(&mut sched, 2);

    env.now = Duration::from_millis(7);
    assert_eq!(sched.select_tx_format(&mut env, limited(100)), TxFormat::NoTransmission);
    assert_eq!(sched.stats().sensing_timeouts, 1);
    assert_eq!(sched.stats().last_sensing_timeout, Some(Duration::from_millis(7)));
    assert!(sched.sounding_round().is_empty());

    // a timeout starts over with a new poll round
    poll_round(&mut sched, &mut env, 200);
}

#[test]
fn announcement_is_followed_by_a_new_poll_round() {
    let mut env = sensing_env(2);
    let mut sched = scheduler(sensing_config(SoundingMode::SuAndMu), &env);
    poll_round(&mut sched, &mut env, 1_000);
    acknowledge_all(&mut sched, 2);

    assert_eq!(
        sched.select_tx_format(&mut env, unlimited()),
        TxFormat::SoundingAnnounce(SoundingScope::Mu)
    );
    poll_round(&mut sched, &mut env, 1_000);
    assert!(sched.acknowledged_stations().is_empty());
}

#[test]
fn single_acknowledgement_gets_su_feedback() {
    let mut env = sensing_env(2);
    let mut sched = scheduler(sensing_config(SoundingMode::SuAndMu), &env);
    poll_round(&mut sched, &mut env, 1_000);
    assert!(sched.on_poll_acknowledged(MacAddress::from_aid(2)));

    sched.select_tx_format(&mut env, unlimited());
    assert_eq!(sounded(&sched), vec![2]);
    assert_eq!(sched.sounding_round()[0].report_size, 56);
}

// ─── SU sounding ───────────────────────────────────────────────────────

#[test]
fn su_mode_sounds_acknowledged_stations_one_by_one() {
    let mut env = sensing_env(2);
    let mut sched = scheduler(sensing_config(SoundingMode::SuOnly), &env);
    poll_round(&mut sched, &mut env, 1_000);
    acknowledge_all(&mut sched, 2);

    for aid in [1, 2] {
        assert_eq!(
            sched.select_tx_format(&mut env, unlimited()),
            TxFormat::SoundingAnnounce(SoundingScope::Su)
        );
        assert_eq!(sounded(&sched), vec![aid]);
        let target = &sched.sounding_round()[0];
        assert_eq!(target.report_size, 56);
        assert_eq!(target.report_duration, us(76));
        assert_eq!(
            control(&env, SoundingRole::Probe),
            Some((ControlKind::Ndp, MacAddress::from_aid(aid), 0))
        );
    }

    poll_round(&mut sched, &mut env, 1_000);
    assert_eq!(sched.stats().sounding_su, 2);
}

// ─── Configuration ─────────────────────────────────────────────────────

#[test]
fn zero_sounding_interval_only_polls() {
    let mut env = sensing_env(2);
    let config = SchedulerConfig {
        sensing: SensingConfig {
            enabled: true,
            sounding_interval_us: 0,
            ..SensingConfig::default()
        },
        ..SchedulerConfig::default()
    };
    let mut sched = scheduler(config, &env);

    poll_round(&mut sched, &mut env, 1_000);
    acknowledge_all(&mut sched, 2);
    poll_round(&mut sched, &mut env, 1_000);
    assert_eq!(sched.stats().sounding_mu + sched.stats().sounding_su, 0);
}

#[test]
fn report_mcs_override_reaches_the_report_vector() {
    let mut env = sensing_env(2);
    let mut config = sensing_config(SoundingMode::MuOnly);
    config.sensing.report_mcs = Some(3);
    let mut sched = scheduler(config, &env);
    poll_round(&mut sched, &mut env, 1_000);
    acknowledge_all(&mut sched, 2);

    sched.select_tx_format(&mut env, unlimited());
    let Some(SoundingFrame::Trigger(trigger)) = env.sounding.frames.get(&SoundingRole::ReportTrigger) else {
        panic!("BFRP trigger expected");
    };
    assert!(trigger.users.values().all(|u| u.mcs == 3 && u.nss == 1));
}
