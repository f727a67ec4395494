//! Rank levels and roll-up
//!
//! Lower rank level = more specific. Only 20/30/40/50 are "primary" display
//! ranks; anything finer or in between rolls up to the next coarser primary
//! rank so the user sees e.g. a genus rather than a subtribe.

/// Species rank level
pub const SPECIES: i32 = 10;
/// Genus rank level
pub const GENUS: i32 = 20;
/// Family rank level
pub const FAMILY: i32 = 30;
/// Order rank level
pub const ORDER: i32 = 40;
/// Class rank level
pub const CLASS: i32 = 50;
/// Root of the on-device model's taxonomy
pub const ROOT: i32 = 100;

/// Display-worthy ranks, finest first
pub const PRIMARY_RANKS: [i32; 4] = [GENUS, FAMILY, ORDER, CLASS];

/// Anything carrying a rank level
///
/// Remote rank levels can be fractional (e.g. 33.5 for a zoosection).
pub trait RankedTaxon {
    fn rank_level(&self) -> f64;
}

/// True iff `rank` is one of 20, 30, 40, 50
pub fn is_primary_rank(rank: impl Into<f64>) -> bool {
    let rank = rank.into();
    PRIMARY_RANKS.iter().any(|&primary| f64::from(primary) == rank)
}

/// Next coarser (or equal) primary rank; `None` above 50
pub fn roll_up_target(rank: impl Into<f64>) -> Option<i32> {
    let rank = rank.into();
    PRIMARY_RANKS
        .iter()
        .copied()
        .find(|&primary| rank <= f64::from(primary))
}

/// First ancestor whose rank level is the roll-up target of `rank`
///
/// Chain order is preserved: when several ancestors share the target level,
/// the earliest one wins.
pub fn nearest_primary_ancestor<T: RankedTaxon>(ancestors: &[T], rank: impl Into<f64>) -> Option<&T> {
    let target = f64::from(roll_up_target(rank)?);
    ancestors.iter().find(|a| a.rank_level() == target)
}
