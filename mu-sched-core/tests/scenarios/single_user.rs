//! Decisions that fall back to a single-user PPDU.

use mu_sched_core::mac::{AccessCategory, MacAddress};
use mu_sched_core::testing::MockEnv;
use mu_sched_core::{SchedulerConfig, TxFormat};

use crate::common::{scheduler, unlimited};

const BE: AccessCategory = AccessCategory::BestEffort;

#[test]
fn head_frame_for_legacy_station_goes_single_user() {
    let mut env = MockEnv::with_stations(4);
    env.saturate(BE, 1_000);
    let legacy = env.add_station(9);
    legacy.capabilities.multi_user = false;
    let legacy = legacy.address;

    let mut sched = scheduler(SchedulerConfig::default(), &env);
    assert!(!sched.registry().contains(9), "legacy station must not be registered");

    env.clear_queue(BE);
    env.enqueue(BE, 0, legacy, 500);
    env.saturate(BE, 1_000);

    let format = sched.select_tx_format(&mut env, unlimited());
    assert_eq!(format, TxFormat::SingleUser);
    assert!(sched.compute_downlink_info(&mut env).is_none());
    assert_eq!(env.station_peeks(), 0, "no per-station queue walk for an SU decision");
}

#[test]
fn too_few_stations_goes_single_user_without_queue_walk() {
    let mut env = MockEnv::with_stations(1);
    env.saturate(BE, 1_000);
    let mut sched = scheduler(SchedulerConfig::default(), &env);

    assert_eq!(sched.select_tx_format(&mut env, unlimited()), TxFormat::SingleUser);
    assert_eq!(env.station_peeks(), 0);
    assert_eq!(sched.stats().single_user, 1);
}

#[test]
fn min_dl_mu_stations_is_configurable() {
    let mut env = MockEnv::with_stations(1);
    env.saturate(BE, 1_000);
    let config = SchedulerConfig {
        min_dl_mu_stations: 1,
        ..SchedulerConfig::default()
    };
    let mut sched = scheduler(config, &env);

    assert_eq!(sched.select_tx_format(&mut env, unlimited()), TxFormat::DownlinkMu);
    let info = sched.compute_downlink_info(&mut env).expect("DL MU info");
    assert_eq!(info.psdus.len(), 1);
}

#[test]
fn no_block_ack_agreement_falls_back() {
    let mut env = MockEnv::with_stations(3);
    env.saturate(BE, 1_000);
    for station in env.stations.values_mut() {
        station.block_ack = false;
    }

    let mut sched = scheduler(SchedulerConfig::default(), &env);
    assert_eq!(sched.select_tx_format(&mut env, unlimited()), TxFormat::SingleUser);

    let forced = SchedulerConfig {
        force_dl_mu: true,
        ..SchedulerConfig::default()
    };
    let mut sched = scheduler(forced, &env);
    assert_eq!(
        sched.select_tx_format(&mut env, unlimited()),
        TxFormat::NoTransmission,
        "forced DL MU never degrades to SU"
    );
}

#[test]
fn unknown_receiver_is_treated_as_legacy() {
    let mut env = MockEnv::with_stations(2);
    env.enqueue(BE, 0, MacAddress([0x02, 0xff, 0, 0, 0, 0x42]), 100);
    let mut sched = scheduler(SchedulerConfig::default(), &env);
    assert_eq!(sched.select_tx_format(&mut env, unlimited()), TxFormat::SingleUser);
}
