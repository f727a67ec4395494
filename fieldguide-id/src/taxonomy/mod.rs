//! Static taxonomy tables and rank arithmetic
//!
//! - `rank`: rank levels, primary ranks, roll-up to the nearest primary ancestor
//! - `iconic`: iconic-group priority table and resolver

pub mod iconic;
pub mod rank;

pub use iconic::{iconic_group_name, priority_of, resolve_iconic_group, DEFAULT_ICONIC_GROUP};
pub use rank::{is_primary_rank, nearest_primary_ancestor, roll_up_target, RankedTaxon};
