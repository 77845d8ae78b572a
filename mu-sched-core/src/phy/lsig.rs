//! L-SIG length conversion for HE TB PPDUs.
//!
//! A trigger frame tells the solicited stations how long their TB PPDU
//! lasts through the L-SIG length field. Only whole legacy symbols can
//! be expressed, so the duration granted is the requested one rounded
//! up to the next symbol boundary:
//!
//! ```text
//! length   = ceil((d - 20 µs) / 4 µs) * 3 - 3 - m        (m = 2)
//! duration = 20 µs + ((length + 3 + m) / 3) * 4 µs
//! ```

use std::time::Duration;

use crate::constants::{HE_TB_LSIG_M, LEGACY_PREAMBLE_DURATION, LEGACY_SYMBOL_DURATION};

/// Fewest symbols that still give a positive length.
const MIN_SYMBOLS: u128 = 2;

/// Most symbols a 12-bit length field can express (4095 + 5) / 3.
const MAX_SYMBOLS: u128 = 1_366;

/// L-SIG length for a TB PPDU of `duration`, together with the duration
/// that length actually grants (never shorter than requested, except
/// when the request exceeds the largest expressible PPDU).
pub fn he_tb_lsig_length(duration: Duration) -> (u16, Duration) {
    let body = duration.saturating_sub(LEGACY_PREAMBLE_DURATION).as_nanos();
    let symbol = LEGACY_SYMBOL_DURATION.as_nanos();
    let symbols = body.div_ceil(symbol).clamp(MIN_SYMBOLS, MAX_SYMBOLS);
    // symbols <= MAX_SYMBOLS keeps this within the 12-bit field
    let length = (symbols * 3 - 3 - u128::from(HE_TB_LSIG_M)) as u16;
    (length, he_tb_duration_from_lsig(length))
}

/// Longest TB PPDU duration not above `limit` that an L-SIG length can
/// express exactly, or `None` when `limit` is shorter than the shortest
/// expressible PPDU.
pub fn he_tb_floor_duration(limit: Duration) -> Option<Duration> {
    let body = limit.saturating_sub(LEGACY_PREAMBLE_DURATION).as_nanos();
    let symbols = (body / LEGACY_SYMBOL_DURATION.as_nanos()).min(MAX_SYMBOLS);
    if symbols < MIN_SYMBOLS {
        return None;
    }
    // bounded by MAX_SYMBOLS
    Some(LEGACY_PREAMBLE_DURATION + LEGACY_SYMBOL_DURATION * symbols as u32)
}

/// TB PPDU duration advertised by an L-SIG `length`.
pub fn he_tb_duration_from_lsig(length: u16) -> Duration {
    let symbols = (u32::from(length) + 3 + u32::from(HE_TB_LSIG_M)) / 3;
    LEGACY_PREAMBLE_DURATION + LEGACY_SYMBOL_DURATION * symbols
}
