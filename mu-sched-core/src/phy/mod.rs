//! PHY-level descriptions: resource units, TX vectors, L-SIG timing.

pub mod lsig;
pub mod ru;
pub mod txvector;

pub use lsig::{he_tb_duration_from_lsig, he_tb_floor_duration, he_tb_lsig_length};
pub use ru::{
    central_26_tone_rus, equal_sized_rus_for_stations, rus_of_type, ChannelWidth, RuAllocation,
    RuSpec, RuType,
};
pub use txvector::{Preamble, RateSelection, TxVector, UserInfo};
