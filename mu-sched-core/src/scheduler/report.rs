//! HE compressed beamforming report length.
//!
//! ```text
//! bytes = 2                                  action header
//!       + 5                                  HE MIMO control
//!       + Nc                                 average SNR per column
//!       + ceil(Ns * Na/2 * (bφ + bψ) / 8)    compressed feedback matrices
//!       + ceil(Ns * Nc * 4 / 8)              delta SNR (MU feedback only)
//! ```
//!
//! `Ns` is the number of reported subcarriers for the bandwidth and
//! grouping, `Na` the number of Givens angles of an `Nr x Nc` matrix.

use crate::env::BeamformeeCapabilities;
use crate::phy::ChannelWidth;

const ACTION_HEADER_SIZE: u32 = 2;
const MIMO_CONTROL_SIZE: u32 = 5;
const DELTA_SNR_BITS: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedbackType {
    SingleUser,
    MultiUser,
}

/// Subcarriers carrying feedback for grouping `ng` (4, anything else
/// is treated as 16).
pub fn subcarrier_count(width: ChannelWidth, ng: u8) -> u32 {
    match (width, ng) {
        (ChannelWidth::Mhz20, 4) => 64,
        (ChannelWidth::Mhz40, 4) => 122,
        (ChannelWidth::Mhz80, 4) => 250,
        (ChannelWidth::Mhz160, 4) => 500,
        (ChannelWidth::Mhz20, _) => 20,
        (ChannelWidth::Mhz40, _) => 32,
        (ChannelWidth::Mhz80, _) => 64,
        (ChannelWidth::Mhz160, _) => 128,
    }
}

/// Givens angles (φ and ψ together) describing an `nr x nc` matrix.
pub fn angle_count(nr: u8, nc: u8) -> u32 {
    let nr = u32::from(nr);
    let columns = u32::from(nc).min(nr.saturating_sub(1));
    (1..=columns).map(|i| 2 * (nr - i)).sum()
}

/// Quantization bits `(bφ, bψ)`.
fn codebook_bits(feedback: FeedbackType, fine: bool) -> (u32, u32) {
    match (feedback, fine) {
        (FeedbackType::SingleUser, false) => (4, 2),
        (FeedbackType::SingleUser, true) => (6, 4),
        (FeedbackType::MultiUser, false) => (7, 5),
        (FeedbackType::MultiUser, true) => (9, 7),
    }
}

/// Bytes of the report a station with `caps` sends after being sounded
/// by an AP with `nr` transmit antennas.
pub fn report_length(width: ChannelWidth, caps: &BeamformeeCapabilities, nr: u8, feedback: FeedbackType) -> u32 {
    let nc = caps.max_nc.saturating_add(1).min(nr.max(1));
    let (ng, fine) = match feedback {
        FeedbackType::SingleUser => (caps.ng_su, caps.codebook_su_fine),
        FeedbackType::MultiUser => (caps.ng_mu, caps.codebook_mu_fine),
    };
    let ns = subcarrier_count(width, ng);
    let (b_phi, b_psi) = codebook_bits(feedback, fine);

    let angle_bits = ns * angle_count(nr, nc) / 2 * (b_phi + b_psi);
    let mut bytes = ACTION_HEADER_SIZE + MIMO_CONTROL_SIZE + u32::from(nc) + angle_bits.div_ceil(8);
    if feedback == FeedbackType::MultiUser {
        bytes += (ns * u32::from(nc) * DELTA_SNR_BITS).div_ceil(8);
    }
    bytes
}
