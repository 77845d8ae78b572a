//! RU assignment for a candidate set.
//!
//! Candidates are gathered against the allocation for the whole list,
//! with a placeholder RU each. Once the set is known the allocation is
//! recomputed for its actual size, which can only widen the RUs, and the
//! candidates that no longer get one are dropped.

use tracing::debug;

use super::types::Candidate;
use crate::phy::{
    central_26_tone_rus, equal_sized_rus_for_stations, rus_of_type, ChannelWidth, RuAllocation,
    TxVector, UserInfo,
};

/// Allocation for `count` stations, honoring the central 26-tone switch.
pub(crate) fn allocation_for(width: ChannelWidth, count: usize, use_central: bool) -> RuAllocation {
    let alloc = equal_sized_rus_for_stations(width, count);
    if use_central {
        alloc
    } else {
        alloc.without_central()
    }
}

/// Assigns final RUs to the users of `tx_vector`, in candidate order:
/// equal-size RUs first, then central 26-tone RUs. Candidates beyond the
/// capacity of the allocation are removed from both the list and the
/// vector.
pub(crate) fn finalize_tx_vector(
    width: ChannelWidth,
    use_central: bool,
    tx_vector: &mut TxVector,
    candidates: &mut Vec<Candidate>,
) {
    debug_assert_eq!(tx_vector.users().len(), candidates.len());

    let n = candidates.len();
    if n == 0 {
        return;
    }
    let alloc = allocation_for(width, n, use_central);
    let n_central = if n == alloc.n_rus {
        0
    } else {
        (n - alloc.n_rus).min(alloc.n_central_26)
    };
    let rus = rus_of_type(width, alloc.ru_type);
    let central = central_26_tone_rus(width, alloc.ru_type);
    let assignable = alloc.n_rus + n_central;

    let mut users = tx_vector.take_users();
    for (i, candidate) in candidates.iter().take(assignable).enumerate() {
        let Some(info) = users.remove(&candidate.aid) else {
            debug_assert!(false, "candidate {} missing from TX vector", candidate.aid);
            continue;
        };
        let ru = if i < alloc.n_rus {
            rus[i]
        } else {
            central[i - alloc.n_rus]
        };
        tx_vector.set_user(candidate.aid, UserInfo { ru: Some(ru), ..info });
    }

    if n > assignable {
        debug!(
            dropped = n - assignable,
            ru_type = %alloc.ru_type,
            "candidates beyond RU capacity dropped"
        );
        candidates.truncate(assignable);
    }
}
