//! Access categories and TIDs.

/// Traffic identifier (0..=7).
pub type Tid = u8;

/// EDCA access category, ordered by queue index (BE, BK, VI, VO).
///
/// TXOP sharing walks categories in this order starting at the primary
/// one, so the derived `Ord` is part of the scheduling behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AccessCategory {
    BestEffort,
    Background,
    Video,
    Voice,
}

impl AccessCategory {
    pub const ALL: [AccessCategory; 4] = [
        AccessCategory::BestEffort,
        AccessCategory::Background,
        AccessCategory::Video,
        AccessCategory::Voice,
    ];

    /// The two TIDs mapped to this category, `(low, high)` priority.
    pub const fn tids(self) -> (Tid, Tid) {
        match self {
            AccessCategory::BestEffort => (0, 3),
            AccessCategory::Background => (1, 2),
            AccessCategory::Video => (4, 5),
            AccessCategory::Voice => (6, 7),
        }
    }

    /// Higher-priority TID of the category.
    pub const fn high_tid(self) -> Tid {
        self.tids().1
    }

    /// The TID sharing this category with `tid`.
    pub fn other_tid(self, tid: Tid) -> Tid {
        let (low, high) = self.tids();
        if tid == low {
            high
        } else {
            low
        }
    }

    /// Category a TID maps to. TIDs above 7 map to best effort.
    pub const fn from_tid(tid: Tid) -> AccessCategory {
        match tid {
            1 | 2 => AccessCategory::Background,
            4 | 5 => AccessCategory::Video,
            6 | 7 => AccessCategory::Voice,
            _ => AccessCategory::BestEffort,
        }
    }

    /// This category followed by every category with a higher queue index.
    pub fn and_following(self) -> impl Iterator<Item = AccessCategory> {
        Self::ALL.into_iter().filter(move |ac| *ac >= self)
    }
}
