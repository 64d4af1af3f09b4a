//! # Stable Match
//!
//! Preference ranking and stability verification for stable matching problems.
//!
//! This crate provides:
//! - Conversion of a dense cardinal utility matrix into per-agent **preference
//!   orderings** (stable descending sort, deterministic tie-break).
//! - **Rank tables**: the inverse permutation of each ordering, giving O(1)
//!   "does `a` prefer `x` to `y`" comparisons.
//! - A **blocking-pair** checker for one-sided (roommate) matchings that runs in
//!   O(N²) rank comparisons, optionally split across the rayon pool.
//! - The same check for two-sided (marriage / college admission) matchings.
//!
//! Producing matchings (deferred acceptance, Irving's algorithm) is left to the
//! caller; this crate only verifies them.
//!
//! ## Quick Start
//!
//! ```
//! use stable_match::prelude::*;
//!
//! // Agent 0 likes 1 best, 1 likes 2 best, 2 likes 0 best.
//! let utils = UtilityMatrix::from_rows(&[
//!     [0.0, 2.0, 1.0],
//!     [1.0, 0.0, 2.0],
//!     [2.0, 1.0, 0.0],
//! ])
//! .unwrap();
//!
//! let ordering = PreferenceOrdering::derive(&utils);
//! assert_eq!(ordering.row(0), &[1, 2, 0]);
//!
//! let ranks = RankTable::invert(&ordering);
//! assert_eq!(ranks.rank(0, 1), 0);
//!
//! // Pair 0 with 1 and leave 2 alone: 1 and 2 would rather be together.
//! let matching = Matching::from_pairs(3, &[(0, 1)]).unwrap();
//! assert_eq!(
//!     find_blocking_pair(&ranks, &matching).unwrap(),
//!     Some(BlockingPair { a: 1, b: 2 })
//! );
//! ```
//!
//! ## Unmatched Agents
//!
//! ```
//! use stable_match::prelude::*;
//!
//! // `n` is the "unmatched" sentinel in the index encoding; self-matches also count.
//! let matching = Matching::from_indices(&[1, 0, 4, 3]).unwrap();
//! assert_eq!(matching.partner(2), None);
//! assert_eq!(matching.partner(3), None);
//! ```
//!
//! ## Modules
//!
//! - [`utility`]: Dense row-major utility matrices.
//! - [`ordering`]: Preference orderings derived from utilities or supplied directly.
//! - [`rank`]: Rank tables (inverse orderings).
//! - [`matching`]: One-sided and two-sided candidate matchings.
//! - [`stability`]: Blocking-pair detection for one-sided matchings.
//! - [`bipartite`]: Blocking-pair detection for two-sided matchings.
//! - [`validate`]: Input validation run before every algorithm.
//! - [`error`]: Error kinds.
//!
//! ## Performance Notes
//!
//! - Orderings and rank tables are single flat buffers indexed `row * width + col`.
//! - Deriving orderings costs O(N² log N); inverting them and scanning for blocking
//!   pairs cost O(N²) each.
//! - Above [`ordering::DEFAULT_PARALLEL_THRESHOLD`] agents, rows are processed in
//!   parallel. The reported blocking pair is always the first in `(a, b)` order.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::inline_always)] // Intentional for rank lookups in the scan loop
#![allow(clippy::many_single_char_names)] // Mathematical variable names
#![allow(clippy::needless_range_loop)] // Often clearer for matrix indexing
#![allow(clippy::multiple_crate_versions)] // Cargo.lock management is external

pub mod bipartite;
pub mod error;
pub mod matching;
pub mod ordering;
pub mod rank;
pub mod stability;
pub mod utility;
pub mod validate;

/// Re-export commonly used types for convenience.
pub mod prelude {
    pub use crate::bipartite::{check_bipartite_stability, BipartiteBlockingPair, BipartiteChecker};
    pub use crate::error::{MatchError, Result};
    pub use crate::matching::{BipartiteMatching, Matching};
    pub use crate::ordering::{OrderingKind, PreferenceOrdering};
    pub use crate::rank::RankTable;
    pub use crate::stability::{
        blocking_pairs, check_roommate_stability, find_blocking_pair, is_stable, Acceptability,
        BlockingPair, CheckConfig, StabilityChecker,
    };
    pub use crate::utility::UtilityMatrix;
}
