//! DL MU assembly, RU assignment and fairness rotation.

use mu_sched_core::mac::{AccessCategory, Aid};
use mu_sched_core::phy::{RuSpec, RuType};
use mu_sched_core::testing::{MockEnv, MOCK_ACK};
use mu_sched_core::{DlInfo, MuScheduler, SchedulerConfig, TimeBudget, TxFormat, TxOpportunity};

use crate::common::{limited, opportunity, scheduler, unlimited, us};

const BE: AccessCategory = AccessCategory::BestEffort;

/// Downlink only: no trigger frames between DL MU PPDUs.
fn dl_config() -> SchedulerConfig {
    SchedulerConfig {
        enable_ul_mu: false,
        ..SchedulerConfig::default()
    }
}

fn dl_round(sched: &mut MuScheduler, env: &mut MockEnv, opp: TxOpportunity) -> DlInfo {
    assert_eq!(sched.select_tx_format(env, opp), TxFormat::DownlinkMu);
    sched.compute_downlink_info(env).expect("DL MU info")
}

fn served(info: &DlInfo) -> Vec<Aid> {
    info.psdus.keys().copied().collect()
}

fn ru_of(info: &DlInfo, aid: Aid) -> Option<RuSpec> {
    info.tx_params.tx_vector.user(aid).and_then(|u| u.ru)
}

// ─── Assembly ──────────────────────────────────────────────────────────

#[test]
fn four_stations_share_20_mhz_in_52_tone_rus() {
    let mut env = MockEnv::with_stations(4);
    env.saturate(BE, 1_000);
    let mut sched = scheduler(dl_config(), &env);

    let info = dl_round(&mut sched, &mut env, unlimited());

    assert_eq!(served(&info), vec![1, 2, 3, 4]);
    for aid in 1..=4 {
        assert_eq!(ru_of(&info, aid), Some(RuSpec::new(RuType::Tones52, aid)));
    }
    assert_eq!(info.tx_params.tx_duration, us(1_020));
    assert_eq!(info.tx_params.ack_time, MOCK_ACK);
    assert_eq!(env.aggregated.len(), 4, "one PSDU aggregated per station");
}

#[test]
fn equal_rus_leave_credits_neutral() {
    let mut env = MockEnv::with_stations(4);
    env.saturate(BE, 1_000);
    let mut sched = scheduler(dl_config(), &env);

    dl_round(&mut sched, &mut env, unlimited());

    let list = sched.registry().downlink(BE);
    assert_eq!(list.aids(), vec![1, 2, 3, 4], "ties keep their order");
    for entry in list.iter() {
        assert_eq!(entry.credits, 0.0, "station {} credit", entry.aid);
    }
}

#[test]
fn admission_respects_remaining_txop() {
    let mut env = MockEnv::with_stations(4);
    let addresses: Vec<_> = env.stations.values().map(|s| s.address).collect();
    for (address, size) in addresses.into_iter().zip([100, 2_000, 100, 100]) {
        env.enqueue(BE, 0, address, size);
    }
    let mut sched = scheduler(dl_config(), &env);

    let info = dl_round(&mut sched, &mut env, limited(500));

    // station 2 does not fit; the three left need 106-tone RUs and only
    // two exist without central 26-tone RUs
    assert_eq!(served(&info), vec![1, 3]);
    assert_eq!(ru_of(&info, 1), Some(RuSpec::new(RuType::Tones106, 1)));
    assert_eq!(ru_of(&info, 3), Some(RuSpec::new(RuType::Tones106, 2)));
    assert_eq!(info.tx_params.tx_duration, us(120));
    assert!(info.tx_params.total_duration() <= us(500));
}

#[test]
fn central_26_tone_ru_serves_the_extra_station() {
    let mut env = MockEnv::with_stations(3);
    env.saturate(BE, 100);
    let config = SchedulerConfig {
        use_central_26_tone_rus: true,
        ..dl_config()
    };
    let mut sched = scheduler(config, &env);

    let info = dl_round(&mut sched, &mut env, unlimited());

    assert_eq!(served(&info), vec![1, 2, 3]);
    assert_eq!(ru_of(&info, 1), Some(RuSpec::new(RuType::Tones106, 1)));
    assert_eq!(ru_of(&info, 2), Some(RuSpec::new(RuType::Tones106, 2)));
    assert_eq!(ru_of(&info, 3), Some(RuSpec::new(RuType::Tones26, 5)));
}

#[test]
fn first_frame_of_txop_is_not_budget_bound() {
    let mut env = MockEnv::with_stations(4);
    env.saturate(BE, 1_000);
    let mut sched = scheduler(dl_config(), &env);

    let tight = opportunity(TimeBudget::limited(us(100)));
    assert_eq!(sched.select_tx_format(&mut env, tight), TxFormat::SingleUser);

    let initial = TxOpportunity {
        initial_frame: true,
        ..tight
    };
    let info = dl_round(&mut sched, &mut env, initial);
    assert_eq!(served(&info).len(), 4);
}

// ─── TXOP sharing ──────────────────────────────────────────────────────

#[test]
fn txop_sharing_fills_rus_from_later_categories() {
    let mut env = MockEnv::with_stations(2);
    let video_only = env.stations[&1].address;
    let best_effort = env.stations[&2].address;
    env.enqueue(BE, 0, best_effort, 300);
    let video = env.enqueue(AccessCategory::Video, 5, video_only, 200);

    let mut sched = scheduler(dl_config(), &env);
    let info = dl_round(&mut sched, &mut env, unlimited());
    assert_eq!(served(&info), vec![1, 2]);
    assert_eq!(info.psdus[&1].frames, vec![video]);

    let no_sharing = SchedulerConfig {
        txop_sharing: false,
        min_dl_mu_stations: 1,
        ..dl_config()
    };
    let mut sched = scheduler(no_sharing, &env);
    let info = dl_round(&mut sched, &mut env, unlimited());
    assert_eq!(served(&info), vec![2], "VI frame stays out of a BE TXOP");
}

#[test]
fn without_sharing_only_the_head_tid_is_served() {
    let mut env = MockEnv::with_stations(2);
    let low_tid = env.stations[&2].address;
    let high_tid = env.stations[&1].address;
    let head = env.enqueue(BE, 0, low_tid, 300);
    let other = env.enqueue(BE, 3, high_tid, 200);

    let no_sharing = SchedulerConfig {
        txop_sharing: false,
        min_dl_mu_stations: 1,
        ..dl_config()
    };
    let mut sched = scheduler(no_sharing.clone(), &env);
    let info = dl_round(&mut sched, &mut env, unlimited());
    assert_eq!(served(&info), vec![2], "TID 3 stays out of a TID 0 PPDU");
    assert_eq!(info.psdus[&2].frames, vec![head]);

    let sharing = SchedulerConfig {
        txop_sharing: true,
        ..no_sharing
    };
    let mut sched = scheduler(sharing, &env);
    let info = dl_round(&mut sched, &mut env, unlimited());
    assert_eq!(served(&info), vec![1, 2]);
    assert_eq!(info.psdus[&1].frames, vec![other]);
}

// ─── Fairness rotation ─────────────────────────────────────────────────

#[test]
fn unserved_stations_move_to_the_front() {
    let mut env = MockEnv::with_stations(6);
    env.saturate(BE, 1_000);
    let mut sched = scheduler(dl_config(), &env);

    let first = dl_round(&mut sched, &mut env, unlimited());
    assert_eq!(served(&first), vec![1, 2, 3, 4]);
    // 1020 µs over six stations: +170 each, served pay 255
    let list = sched.registry().downlink(BE);
    assert_eq!(list.aids(), vec![5, 6, 1, 2, 3, 4]);
    assert_eq!(list.get(5).unwrap().credits, 170.0);
    assert_eq!(list.get(1).unwrap().credits, -85.0);

    let second = dl_round(&mut sched, &mut env, unlimited());
    assert_eq!(served(&second), vec![1, 2, 5, 6]);
    assert_eq!(sched.registry().downlink(BE).aids(), vec![5, 6, 3, 4, 1, 2]);

    let other = sched.registry().downlink(AccessCategory::Voice);
    assert_eq!(other.aids(), vec![1, 2, 3, 4, 5, 6], "only the primary list is settled");
}
