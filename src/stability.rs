//! Blocking-pair detection for one-sided (roommate) matchings.
//!
//! A pair `(a, b)` blocks when each strictly prefers the other to its current
//! situation: its assigned partner, or being unmatched. Comparisons go through
//! [`RankTable`] lookups, so a full scan costs O(N²) rank comparisons.
//!
//! Scans visit pairs in lexicographic order (`a < b`). The parallel scan splits
//! the range of `a` across the rayon pool and still reports the first pair in
//! that order, so results never depend on thread count.

use crate::error::{InputError, MatchError, Result};
use crate::matching::Matching;
use crate::ordering::{PreferenceOrdering, DEFAULT_PARALLEL_THRESHOLD};
use crate::rank::RankTable;
use crate::utility::UtilityMatrix;
use crate::validate;
use rayon::prelude::*;
use std::fmt;
use tracing::{debug, trace};

// ============================================================================
// Configuration
// ============================================================================

/// Which partners an agent would rather have than no partner at all.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Acceptability {
    /// Every other agent is acceptable; the agent's own rank is ignored.
    #[default]
    AllOthers,
    /// The agent's own position in its ordering is its outside option: partners
    /// ranked below itself are worse than being unmatched.
    OutsideOption,
}

/// Stability check parameters.
#[derive(Clone, Debug)]
pub struct CheckConfig {
    /// How being unmatched compares to each partner.
    pub acceptability: Acceptability,
    /// Allow splitting the scan across the rayon pool.
    pub parallel: bool,
    /// Agent count at or above which the scan runs in parallel.
    pub parallel_threshold: usize,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            acceptability: Acceptability::AllOthers,
            parallel: true,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl CheckConfig {
    /// Single-threaded scan with the given acceptability.
    pub fn sequential(acceptability: Acceptability) -> Self {
        Self {
            acceptability,
            parallel: false,
            ..Self::default()
        }
    }

    fn runs_parallel(&self, agents: usize) -> bool {
        self.parallel && agents >= self.parallel_threshold
    }
}

// ============================================================================
// BlockingPair
// ============================================================================

/// Two agents who both prefer each other to their current situation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockingPair {
    /// The lower agent index.
    pub a: usize,
    /// The higher agent index.
    pub b: usize,
}

impl fmt::Display for BlockingPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.a, self.b)
    }
}

// ============================================================================
// StabilityChecker
// ============================================================================

/// A validated (rank table, matching) pair ready to be scanned.
///
/// Construction checks dimensions and acceptability and precomputes, for each
/// agent, the rank a rival must beat: the current partner's rank, or the
/// unmatched cutoff. After that every comparison is one table lookup.
#[derive(Debug)]
pub struct StabilityChecker<'a> {
    ranks: &'a RankTable,
    matching: &'a Matching,
    config: CheckConfig,
    /// Rank of each agent's current situation; `b` tempts `a` iff
    /// `rank(a, b) < bar[a]`.
    bar: Vec<usize>,
}

impl<'a> StabilityChecker<'a> {
    /// Validates inputs and prepares the scan.
    ///
    /// # Errors
    /// Returns [`MatchError::InvalidInput`] if the rank table is not square, its
    /// size differs from the matching, or (under
    /// [`Acceptability::OutsideOption`]) an agent is matched to a partner it
    /// ranks below itself.
    pub fn new(ranks: &'a RankTable, matching: &'a Matching, config: CheckConfig) -> Result<Self> {
        validate::square(ranks.agents(), ranks.partners())?;
        let n = ranks.agents();
        if matching.len() != n {
            return Err(MatchError::dimension("matching agents", n, matching.len()));
        }

        let mut bar = Vec::with_capacity(n);
        for agent in 0..n {
            let outside = match config.acceptability {
                Acceptability::AllOthers => n,
                Acceptability::OutsideOption => ranks.rank(agent, agent),
            };
            let level = match matching.partner(agent) {
                None => outside,
                Some(partner) => {
                    let rank = ranks.rank(agent, partner);
                    if rank >= outside {
                        return Err(InputError::UnacceptablePartner { agent, partner }.into());
                    }
                    rank
                }
            };
            bar.push(level);
        }

        Ok(Self {
            ranks,
            matching,
            config,
            bar,
        })
    }

    /// Number of agents.
    #[inline]
    pub fn agents(&self) -> usize {
        self.bar.len()
    }

    /// Returns whether `agent` strictly prefers `other` to its current situation.
    #[inline(always)]
    pub fn tempts(&self, agent: usize, other: usize) -> bool {
        agent != other && self.ranks.rank(agent, other) < self.bar[agent]
    }

    /// Returns whether `(a, b)` is a blocking pair.
    #[inline(always)]
    pub fn blocks(&self, a: usize, b: usize) -> bool {
        self.tempts(a, b) && self.tempts(b, a)
    }

    /// First blocking pair in lexicographic order, if any.
    pub fn find_blocking_pair(&self) -> Option<BlockingPair> {
        let n = self.agents();
        let found = if self.config.runs_parallel(n) {
            (0..n)
                .into_par_iter()
                .find_map_first(|a| self.first_in_row(a))
        } else {
            (0..n).find_map(|a| self.first_in_row(a))
        };

        match found {
            Some(pair) => debug!(
                a = pair.a,
                b = pair.b,
                rank_ab = self.ranks.rank(pair.a, pair.b),
                rank_ba = self.ranks.rank(pair.b, pair.a),
                a_partner = ?self.matching.partner(pair.a),
                b_partner = ?self.matching.partner(pair.b),
                "blocking pair found"
            ),
            None => debug!(agents = n, "matching is stable"),
        }
        found
    }

    /// Returns whether no blocking pair exists.
    pub fn is_stable(&self) -> bool {
        let n = self.agents();
        if self.config.runs_parallel(n) {
            !(0..n)
                .into_par_iter()
                .any(|a| self.first_in_row(a).is_some())
        } else {
            self.find_blocking_pair().is_none()
        }
    }

    /// Every blocking pair, in lexicographic order.
    pub fn blocking_pairs(&self) -> Vec<BlockingPair> {
        let n = self.agents();
        let row = move |a: usize| {
            ((a + 1)..n)
                .filter(move |&b| self.blocks(a, b))
                .map(move |b| BlockingPair { a, b })
        };
        if self.config.runs_parallel(n) {
            (0..n).into_par_iter().flat_map_iter(row).collect()
        } else {
            (0..n).flat_map(row).collect()
        }
    }

    fn first_in_row(&self, a: usize) -> Option<BlockingPair> {
        trace!(agent = a, bar = self.bar[a], "scanning row");
        if self.bar[a] == 0 {
            // Already holding its first choice.
            return None;
        }
        ((a + 1)..self.agents())
            .find(|&b| self.blocks(a, b))
            .map(|b| BlockingPair { a, b })
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Finds the first blocking pair with the default configuration.
///
/// # Errors
/// See [`StabilityChecker::new`].
pub fn find_blocking_pair(ranks: &RankTable, matching: &Matching) -> Result<Option<BlockingPair>> {
    Ok(StabilityChecker::new(ranks, matching, CheckConfig::default())?.find_blocking_pair())
}

/// Returns whether `matching` is stable under `ranks` with the default configuration.
///
/// # Errors
/// See [`StabilityChecker::new`].
pub fn is_stable(ranks: &RankTable, matching: &Matching) -> Result<bool> {
    Ok(StabilityChecker::new(ranks, matching, CheckConfig::default())?.is_stable())
}

/// Lists every blocking pair with the default configuration.
///
/// # Errors
/// See [`StabilityChecker::new`].
pub fn blocking_pairs(ranks: &RankTable, matching: &Matching) -> Result<Vec<BlockingPair>> {
    Ok(StabilityChecker::new(ranks, matching, CheckConfig::default())?.blocking_pairs())
}

/// Derives rank tables from a square utility matrix and checks `matching`.
///
/// Under [`Acceptability::OutsideOption`] the diagonal `utils[i][i]` is agent
/// `i`'s utility for staying unmatched.
///
/// # Errors
/// Returns [`MatchError::InvalidInput`] for a rectangular matrix, plus anything
/// [`StabilityChecker::new`] reports.
pub fn check_roommate_stability(
    utils: &UtilityMatrix,
    matching: &Matching,
    config: &CheckConfig,
) -> Result<Option<BlockingPair>> {
    validate::square(utils.rows(), utils.cols())?;
    let threshold = if config.parallel {
        config.parallel_threshold
    } else {
        usize::MAX
    };
    let ordering = PreferenceOrdering::derive_with_threshold(utils, threshold);
    let ranks = RankTable::invert(&ordering);
    let checker = StabilityChecker::new(&ranks, matching, config.clone())?;
    Ok(checker.find_blocking_pair())
}

// ============================================================================
// Tests
// ============================================================================
