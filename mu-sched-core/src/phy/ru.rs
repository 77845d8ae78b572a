//! HE resource units and the equal-size RU allocator.
//!
//! Subchannel positions are counted in 26-tone units across the whole
//! channel. A 20 MHz channel holds 9 of them, and every 80 MHz segment
//! carries one central 26-tone RU between its two 40 MHz halves, so an
//! 80 MHz channel holds 37 and a 160 MHz channel 74.
//!
//! RU indices are 1-based and channel-wide: index `k` of type `t` is the
//! k-th RU of type `t` counting from the lowest frequency.

use std::fmt;
use std::ops::Range;

use crate::errors::SchedError;

/// Channel bandwidth of an OFDMA transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChannelWidth {
    Mhz20,
    Mhz40,
    Mhz80,
    Mhz160,
}

impl ChannelWidth {
    pub const ALL: [ChannelWidth; 4] = [
        ChannelWidth::Mhz20,
        ChannelWidth::Mhz40,
        ChannelWidth::Mhz80,
        ChannelWidth::Mhz160,
    ];

    pub const fn mhz(self) -> u16 {
        match self {
            ChannelWidth::Mhz20 => 20,
            ChannelWidth::Mhz40 => 40,
            ChannelWidth::Mhz80 => 80,
            ChannelWidth::Mhz160 => 160,
        }
    }

    /// Number of 26-tone subchannel positions in the channel.
    pub const fn subchannels(self) -> u16 {
        match self {
            ChannelWidth::Mhz20 => 9,
            ChannelWidth::Mhz40 => 18,
            ChannelWidth::Mhz80 => 37,
            ChannelWidth::Mhz160 => 74,
        }
    }
}

impl TryFrom<u16> for ChannelWidth {
    type Error = SchedError;

    fn try_from(mhz: u16) -> Result<Self, Self::Error> {
        match mhz {
            20 => Ok(ChannelWidth::Mhz20),
            40 => Ok(ChannelWidth::Mhz40),
            80 => Ok(ChannelWidth::Mhz80),
            160 => Ok(ChannelWidth::Mhz160),
            other => Err(SchedError::UnsupportedWidth(other)),
        }
    }
}

impl fmt::Display for ChannelWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} MHz", self.mhz())
    }
}

/// RU size, smallest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RuType {
    Tones26,
    Tones52,
    Tones106,
    Tones242,
    Tones484,
    Tones996,
    Tones2x996,
}

impl RuType {
    pub const ALL: [RuType; 7] = [
        RuType::Tones26,
        RuType::Tones52,
        RuType::Tones106,
        RuType::Tones242,
        RuType::Tones484,
        RuType::Tones996,
        RuType::Tones2x996,
    ];

    /// Width of the RU in 26-tone subchannel positions.
    pub const fn subchannels(self) -> u16 {
        match self {
            RuType::Tones26 => 1,
            RuType::Tones52 => 2,
            RuType::Tones106 => 4,
            RuType::Tones242 => 9,
            RuType::Tones484 => 18,
            RuType::Tones996 => 37,
            RuType::Tones2x996 => 74,
        }
    }

    /// Nominal bandwidth in MHz; the fairness ledger weights by this.
    pub const fn bandwidth_mhz(self) -> u32 {
        match self {
            RuType::Tones26 => 2,
            RuType::Tones52 => 4,
            RuType::Tones106 => 8,
            RuType::Tones242 => 20,
            RuType::Tones484 => 40,
            RuType::Tones996 => 80,
            RuType::Tones2x996 => 160,
        }
    }

    /// How many RUs of this type tile a channel of `width`, central
    /// 26-tone RUs excluded. Zero when the RU is wider than the channel.
    pub const fn count_in(self, width: ChannelWidth) -> usize {
        let base = match (self, width) {
            (RuType::Tones26, ChannelWidth::Mhz20) => 9,
            (RuType::Tones26, ChannelWidth::Mhz40) => 18,
            (RuType::Tones26, _) => 37,
            (RuType::Tones52, ChannelWidth::Mhz20) => 4,
            (RuType::Tones52, ChannelWidth::Mhz40) => 8,
            (RuType::Tones52, _) => 16,
            (RuType::Tones106, ChannelWidth::Mhz20) => 2,
            (RuType::Tones106, ChannelWidth::Mhz40) => 4,
            (RuType::Tones106, _) => 8,
            (RuType::Tones242, ChannelWidth::Mhz20) => 1,
            (RuType::Tones242, ChannelWidth::Mhz40) => 2,
            (RuType::Tones242, _) => 4,
            (RuType::Tones484, ChannelWidth::Mhz20) => 0,
            (RuType::Tones484, ChannelWidth::Mhz40) => 1,
            (RuType::Tones484, _) => 2,
            (RuType::Tones996, ChannelWidth::Mhz80 | ChannelWidth::Mhz160) => 1,
            (RuType::Tones996, _) => 0,
            (RuType::Tones2x996, ChannelWidth::Mhz160) => return 1,
            (RuType::Tones2x996, _) => return 0,
        };
        match width {
            ChannelWidth::Mhz160 => base * 2,
            _ => base,
        }
    }

    /// Central 26-tone RUs left free when the channel is tiled with this
    /// type.
    pub const fn central_26_tone_count(self, width: ChannelWidth) -> usize {
        let per_segment = match (self, width) {
            (RuType::Tones52 | RuType::Tones106, ChannelWidth::Mhz20) => 1,
            (RuType::Tones52 | RuType::Tones106, ChannelWidth::Mhz40) => 2,
            (RuType::Tones52 | RuType::Tones106, _) => 5,
            (RuType::Tones242 | RuType::Tones484, ChannelWidth::Mhz80 | ChannelWidth::Mhz160) => 1,
            _ => 0,
        };
        match width {
            ChannelWidth::Mhz160 => per_segment * 2,
            _ => per_segment,
        }
    }
}

impl fmt::Display for RuType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuType::Tones2x996 => f.write_str("2x996-tone"),
            other => write!(f, "{}-tone", other.tones()),
        }
    }
}

impl RuType {
    pub const fn tones(self) -> u16 {
        match self {
            RuType::Tones26 => 26,
            RuType::Tones52 => 52,
            RuType::Tones106 => 106,
            RuType::Tones242 => 242,
            RuType::Tones484 => 484,
            RuType::Tones996 => 996,
            RuType::Tones2x996 => 1992,
        }
    }
}

/// One concrete resource unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuSpec {
    pub ru_type: RuType,
    /// 1-based, channel-wide.
    pub index: u16,
}

impl RuSpec {
    pub const fn new(ru_type: RuType, index: u16) -> Self {
        Self { ru_type, index }
    }

    /// Subchannel positions occupied by this RU in a channel of `width`,
    /// or `None` when the index does not exist there.
    pub fn span(&self, width: ChannelWidth) -> Option<Range<u16>> {
        let slot = usize::from(self.index).checked_sub(1)?;
        let start = *ru_starts(width, self.ru_type).get(slot)?;
        Some(start..start + self.ru_type.subchannels())
    }

    pub fn overlaps(&self, other: &RuSpec, width: ChannelWidth) -> bool {
        match (self.span(width), other.span(width)) {
            (Some(a), Some(b)) => a.start < b.end && b.start < a.end,
            _ => false,
        }
    }
}

impl fmt::Display for RuSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.ru_type, self.index)
    }
}

/// Output of [`equal_sized_rus_for_stations`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuAllocation {
    pub ru_type: RuType,
    /// Equal-size RUs of `ru_type` available.
    pub n_rus: usize,
    /// Central 26-tone RUs usable alongside them.
    pub n_central_26: usize,
}

impl RuAllocation {
    /// Stations this allocation can serve.
    pub const fn capacity(&self) -> usize {
        self.n_rus + self.n_central_26
    }

    pub const fn without_central(self) -> Self {
        Self {
            n_central_26: 0,
            ..self
        }
    }
}

/// Largest equal RU size such that every one of up to `count` stations
/// can get one: the smallest RU type whose channel-wide count does not
/// exceed `count`. `n_rus` may therefore be less than `count`.
///
/// A count of zero is treated as one.
pub fn equal_sized_rus_for_stations(width: ChannelWidth, count: usize) -> RuAllocation {
    let count = count.max(1);
    let ru_type = RuType::ALL
        .into_iter()
        .find(|t| {
            let n = t.count_in(width);
            n > 0 && n <= count
        })
        .unwrap_or(RuType::Tones2x996);
    RuAllocation {
        ru_type,
        n_rus: ru_type.count_in(width),
        n_central_26: ru_type.central_26_tone_count(width),
    }
}

/// Every RU of `ru_type` in the channel, ascending index.
pub fn rus_of_type(width: ChannelWidth, ru_type: RuType) -> Vec<RuSpec> {
    (1..=ru_type.count_in(width) as u16)
        .map(|index| RuSpec::new(ru_type, index))
        .collect()
}

/// The 26-tone RUs left free when the channel is tiled with `ru_type`,
/// ascending index.
pub fn central_26_tone_rus(width: ChannelWidth, ru_type: RuType) -> Vec<RuSpec> {
    let per_segment: &[u16] = match (ru_type, width) {
        (RuType::Tones52 | RuType::Tones106, ChannelWidth::Mhz20) => &[5],
        (RuType::Tones52 | RuType::Tones106, ChannelWidth::Mhz40) => &[5, 14],
        (RuType::Tones52 | RuType::Tones106, _) => &[5, 14, 19, 24, 33],
        (RuType::Tones242 | RuType::Tones484, ChannelWidth::Mhz80 | ChannelWidth::Mhz160) => &[19],
        _ => &[],
    };
    let segments: &[u16] = match width {
        ChannelWidth::Mhz160 => &[0, 37],
        _ => &[0],
    };
    segments
        .iter()
        .flat_map(|offset| {
            per_segment
                .iter()
                .map(move |i| RuSpec::new(RuType::Tones26, offset + i))
        })
        .collect()
}

/// Start position of every RU of `ru_type` in index order.
fn ru_starts(width: ChannelWidth, ru_type: RuType) -> Vec<u16> {
    fn shifted(starts: &[u16], by: u16) -> impl Iterator<Item = u16> + '_ {
        starts.iter().map(move |s| s + by)
    }

    match width {
        ChannelWidth::Mhz20 => match ru_type {
            RuType::Tones26 => (0..9).collect(),
            RuType::Tones52 => vec![0, 2, 5, 7],
            RuType::Tones106 => vec![0, 5],
            RuType::Tones242 => vec![0],
            _ => Vec::new(),
        },
        ChannelWidth::Mhz40 => {
            if ru_type == RuType::Tones484 {
                return vec![0];
            }
            let half = ru_starts(ChannelWidth::Mhz20, ru_type);
            half.iter().copied().chain(shifted(&half, 9)).collect()
        }
        ChannelWidth::Mhz80 => {
            if ru_type == RuType::Tones996 {
                return vec![0];
            }
            let half = ru_starts(ChannelWidth::Mhz40, ru_type);
            let center: &[u16] = if ru_type == RuType::Tones26 { &[18] } else { &[] };
            half.iter()
                .copied()
                .chain(center.iter().copied())
                .chain(shifted(&half, 19))
                .collect()
        }
        ChannelWidth::Mhz160 => {
            if ru_type == RuType::Tones2x996 {
                return vec![0];
            }
            let half = ru_starts(ChannelWidth::Mhz80, ru_type);
            half.iter().copied().chain(shifted(&half, 37)).collect()
        }
    }
}
