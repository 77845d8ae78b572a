//! Protocol constants — timing values and frame sizes used by admission.
//!
//! Values follow IEEE 802.11ax (HE). Only sizes and durations that feed
//! an admission or grant decision live here; nothing in this crate
//! serializes frames.

use std::time::Duration;

/// Short inter-frame space used between the frames of one exchange.
pub const SIFS: Duration = Duration::from_micros(16);

/// Maximum HE PPDU duration (aPPDUMaxTime).
pub const MAX_PPDU_DURATION: Duration = Duration::from_micros(5_484);

/// Legacy preamble (L-STF + L-LTF + L-SIG).
pub const LEGACY_PREAMBLE_DURATION: Duration = Duration::from_micros(20);

/// Legacy OFDM symbol duration.
pub const LEGACY_SYMBOL_DURATION: Duration = Duration::from_micros(4);

/// `m` term of the L-SIG length equation for HE TB PPDUs.
pub const HE_TB_LSIG_M: u16 = 2;

/// Number of TIDs carried by QoS frames.
pub const NUM_TIDS: u8 = 8;

/// Largest number of stations the MU scheduler may serve in one PPDU
/// (26-tone RUs in a 160 MHz channel).
pub const MAX_MU_STATIONS: u8 = 74;

/// Bytes represented by one unit of a buffer status report.
pub const BUFFER_STATUS_UNIT: u32 = 256;

/// Buffer status code meaning "queue size unknown".
pub const BUFFER_STATUS_UNKNOWN: u8 = 255;

/// Buffer status code meaning "more than the field can express".
pub const BUFFER_STATUS_UNBOUNDED: u8 = 254;

/// MCS used for CF-Poll and the acknowledgement trigger of a poll round.
pub const POLL_MCS: u8 = 0;

// ── Frame sizes (bytes) ─────────────────────────────────────────────────

/// QoS Data frame carrying CF-Poll and no payload.
pub const CF_POLL_SIZE: u32 = 30;

/// QoS Null frame.
pub const QOS_NULL_SIZE: u32 = 30;

/// A-MPDU subframe delimiter.
pub const MPDU_DELIMITER_SIZE: u32 = 4;

/// CTS frame.
pub const CTS_SIZE: u32 = 14;

/// Null data packet: no MAC payload at all.
pub const NDP_SIZE: u32 = 0;

/// NDP Announcement without STA Info fields
/// (header 16 + sounding dialog token 1 + FCS 4).
pub const NDPA_BASE_SIZE: u32 = 21;

/// One STA Info field of an HE NDP Announcement.
pub const NDPA_STA_INFO_SIZE: u32 = 4;

/// Trigger frame without User Info fields
/// (header 16 + common info 8 + FCS 4).
pub const TRIGGER_BASE_SIZE: u32 = 28;

/// One User Info field, excluding trigger-dependent user info.
pub const TRIGGER_USER_INFO_SIZE: u32 = 5;

// ── Defaults ────────────────────────────────────────────────────────────

/// Size of the PSDU a Basic Trigger solicits when buffer status is unknown.
pub const DEFAULT_UL_PSDU_SIZE: u32 = 500;

/// Fairness credit cap, in microseconds.
pub const DEFAULT_MAX_CREDITS_US: u64 = 1_000_000;

/// Interval between sounding rounds, in microseconds.
pub const DEFAULT_SOUNDING_INTERVAL_US: u64 = 10_000;
