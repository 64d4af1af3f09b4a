//! Stability of two-sided (marriage / college admission) matchings.
//!
//! Proposers rank reviewers and reviewers rank proposers. Every partner on the
//! other side is acceptable and any partner beats being unmatched. A pair
//! `(p, r)` blocks when `p` prefers `r` to its assignment and `r` prefers `p` to
//! its own.

use crate::error::{MatchError, Result};
use crate::matching::BipartiteMatching;
use crate::ordering::DEFAULT_PARALLEL_THRESHOLD;
use crate::rank::RankTable;
use crate::utility::UtilityMatrix;
use rayon::prelude::*;
use std::fmt;
use tracing::{debug, trace};

/// A proposer and a reviewer who both prefer each other to their assignments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BipartiteBlockingPair {
    /// Proposer index.
    pub proposer: usize,
    /// Reviewer index.
    pub reviewer: usize,
}

impl fmt::Display for BipartiteBlockingPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(proposer {}, reviewer {})", self.proposer, self.reviewer)
    }
}

/// Validated inputs for a two-sided scan.
#[derive(Debug)]
pub struct BipartiteChecker<'a> {
    proposer_ranks: &'a RankTable,
    reviewer_ranks: &'a RankTable,
    proposer_bar: Vec<usize>,
    reviewer_bar: Vec<usize>,
    parallel_threshold: usize,
}

impl<'a> BipartiteChecker<'a> {
    /// Checks that `proposer_ranks` is `m x n`, `reviewer_ranks` is `n x m` and the
    /// matching covers `m` proposers and `n` reviewers.
    ///
    /// # Errors
    /// Returns [`MatchError::InvalidInput`] on any dimension mismatch.
    pub fn new(
        proposer_ranks: &'a RankTable,
        reviewer_ranks: &'a RankTable,
        matching: &BipartiteMatching,
    ) -> Result<Self> {
        let m = proposer_ranks.agents();
        let n = proposer_ranks.partners();
        let checks = [
            ("reviewer table agents", n, reviewer_ranks.agents()),
            ("reviewer table partners", m, reviewer_ranks.partners()),
            ("matching proposers", m, matching.proposers()),
            ("matching reviewers", n, matching.reviewers()),
        ];
        for (what, expected, got) in checks {
            if expected != got {
                return Err(MatchError::dimension(what, expected, got));
            }
        }

        let proposer_bar = (0..m)
            .map(|p| matching.reviewer_of(p).map_or(n, |r| proposer_ranks.rank(p, r)))
            .collect();
        let reviewer_bar = (0..n)
            .map(|r| matching.proposer_of(r).map_or(m, |p| reviewer_ranks.rank(r, p)))
            .collect();

        Ok(Self {
            proposer_ranks,
            reviewer_ranks,
            proposer_bar,
            reviewer_bar,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        })
    }

    /// Overrides the proposer count at which the scan goes parallel.
    #[must_use]
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Returns whether `(proposer, reviewer)` blocks.
    #[inline(always)]
    pub fn blocks(&self, proposer: usize, reviewer: usize) -> bool {
        self.proposer_ranks.rank(proposer, reviewer) < self.proposer_bar[proposer]
            && self.reviewer_ranks.rank(reviewer, proposer) < self.reviewer_bar[reviewer]
    }

    /// First blocking pair in (proposer, reviewer) order, if any.
    pub fn find_blocking_pair(&self) -> Option<BipartiteBlockingPair> {
        let m = self.proposer_bar.len();
        let found = if m >= self.parallel_threshold {
            (0..m)
                .into_par_iter()
                .find_map_first(|p| self.first_in_row(p))
        } else {
            (0..m).find_map(|p| self.first_in_row(p))
        };
        if let Some(pair) = found {
            debug!(
                proposer = pair.proposer,
                reviewer = pair.reviewer,
                "two-sided blocking pair found"
            );
        }
        found
    }

    /// Returns whether no blocking pair exists.
    pub fn is_stable(&self) -> bool {
        self.find_blocking_pair().is_none()
    }

    /// Every blocking pair in (proposer, reviewer) order.
    pub fn blocking_pairs(&self) -> Vec<BipartiteBlockingPair> {
        let n = self.reviewer_bar.len();
        (0..self.proposer_bar.len())
            .flat_map(|proposer| {
                (0..n)
                    .filter(move |&reviewer| self.blocks(proposer, reviewer))
                    .map(move |reviewer| BipartiteBlockingPair { proposer, reviewer })
            })
            .collect()
    }

    fn first_in_row(&self, proposer: usize) -> Option<BipartiteBlockingPair> {
        // Only reviewers ranked above the current assignment can block.
        let row = self.proposer_ranks.row(proposer);
        let bar = self.proposer_bar[proposer];
        trace!(proposer, bar, "scanning proposer row");
        row.iter()
            .enumerate()
            .filter(|&(_, &rank)| rank < bar)
            .map(|(reviewer, _)| reviewer)
            .find(|&reviewer| self.blocks(proposer, reviewer))
            .map(|reviewer| BipartiteBlockingPair { proposer, reviewer })
    }
}

/// Checks a two-sided matching against proposer (`m x n`) and reviewer (`n x m`)
/// utilities.
///
/// # Errors
/// Returns [`MatchError::InvalidInput`] if the matrices or matching disagree in
/// size.
pub fn check_bipartite_stability(
    proposer_utils: &UtilityMatrix,
    reviewer_utils: &UtilityMatrix,
    matching: &BipartiteMatching,
) -> Result<Option<BipartiteBlockingPair>> {
    let proposer_ranks = RankTable::from_utilities(proposer_utils);
    let reviewer_ranks = RankTable::from_utilities(reviewer_utils);
    let checker = BipartiteChecker::new(&proposer_ranks, &reviewer_ranks, matching)?;
    Ok(checker.find_blocking_pair())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InputError;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};
    use rand_xorshift::XorShiftRng;

    /// Reference Gale-Shapley (proposer-optimal); its output is stable.
    fn deferred_acceptance(p_ranks: &RankTable, r_ranks: &RankTable) -> BipartiteMatching {
        let m = p_ranks.agents();
        let n = p_ranks.partners();
        let p_order = p_ranks.to_ordering();
        let mut next = vec![0usize; m];
        let mut held: Vec<Option<usize>> = vec![None; n];
        let mut free: Vec<usize> = (0..m).rev().collect();
        while let Some(p) = free.pop() {
            if next[p] == n {
                continue;
            }
            let r = p_order.row(p)[next[p]];
            next[p] += 1;
            match held[r] {
                None => held[r] = Some(p),
                Some(q) if r_ranks.prefers(r, p, q) => {
                    held[r] = Some(p);
                    free.push(q);
                }
                Some(_) => free.push(p),
            }
        }
        let mut proposer_side = vec![None; m];
        for (r, slot) in held.iter().enumerate() {
            if let Some(p) = *slot {
                proposer_side[p] = Some(r);
            }
        }
        BipartiteMatching::new(proposer_side, held).unwrap()
    }

    #[test]
    fn textbook_instance() {
        // Proposers 0,1 ; reviewers 0,1.
        // p0: r0 > r1, p1: r0 > r1 ; r0: p1 > p0, r1: p0 > p1
        let pu = UtilityMatrix::from_rows(&[[2.0, 1.0], [2.0, 1.0]]).unwrap();
        let ru = UtilityMatrix::from_rows(&[[1.0, 2.0], [2.0, 1.0]]).unwrap();

        let stable = BipartiteMatching::from_pairs(2, 2, &[(0, 1), (1, 0)]).unwrap();
        assert_eq!(check_bipartite_stability(&pu, &ru, &stable).unwrap(), None);

        let unstable = BipartiteMatching::from_pairs(2, 2, &[(0, 0), (1, 1)]).unwrap();
        assert_eq!(
            check_bipartite_stability(&pu, &ru, &unstable).unwrap(),
            Some(BipartiteBlockingPair {
                proposer: 1,
                reviewer: 0
            })
        );
    }

    #[test]
    fn unequal_sides_leave_someone_unmatched() {
        // Three proposers, two reviewers; leaving both reviewers empty is unstable.
        let pu = UtilityMatrix::from_rows(&[[1.0, 0.0], [0.0, 1.0], [1.0, 0.5]]).unwrap();
        let ru = UtilityMatrix::from_rows(&[[0.0, 1.0, 2.0], [2.0, 1.0, 0.0]]).unwrap();
        let empty = BipartiteMatching::unmatched(3, 2);
        assert_eq!(
            check_bipartite_stability(&pu, &ru, &empty).unwrap(),
            Some(BipartiteBlockingPair {
                proposer: 0,
                reviewer: 0
            })
        );

        // p2 gets its first choice r0, p0 gets r1; p1 is alone but r1 prefers p0.
        let m = BipartiteMatching::from_pairs(3, 2, &[(2, 0), (0, 1)]).unwrap();
        assert!(check_bipartite_stability(&pu, &ru, &m).unwrap().is_none());
    }

    #[test]
    fn deferred_acceptance_output_is_stable() {
        let mut rng = XorShiftRng::seed_from_u64(0xDA);
        for _ in 0..100 {
            let m = rng.random_range(1..15);
            let n = rng.random_range(1..15);
            let pu = UtilityMatrix::random(&mut rng, m, n);
            let ru = UtilityMatrix::random(&mut rng, n, m);
            let p_ranks = RankTable::from_utilities(&pu);
            let r_ranks = RankTable::from_utilities(&ru);
            let matching = deferred_acceptance(&p_ranks, &r_ranks);
            let checker = BipartiteChecker::new(&p_ranks, &r_ranks, &matching).unwrap();
            assert!(checker.is_stable());
            assert!(checker.blocking_pairs().is_empty());
        }
    }

    /// O(m * n * (m + n)) reference that works on the preference lists
    /// themselves, locating partners by position instead of through rank lookups.
    fn brute_force_blocking_pairs(
        p_ranks: &RankTable,
        r_ranks: &RankTable,
        matching: &BipartiteMatching,
    ) -> Vec<BipartiteBlockingPair> {
        let p_order = p_ranks.to_ordering();
        let r_order = r_ranks.to_ordering();
        let position = |row: &[usize], target: usize| row.iter().position(|&x| x == target).unwrap();
        let mut out = Vec::new();
        for proposer in 0..p_order.agents() {
            for reviewer in 0..r_order.agents() {
                let p_row = p_order.row(proposer);
                let r_row = r_order.row(reviewer);
                let p_tempted = match matching.reviewer_of(proposer) {
                    None => true,
                    Some(cur) => position(p_row, reviewer) < position(p_row, cur),
                };
                let r_tempted = match matching.proposer_of(reviewer) {
                    None => true,
                    Some(cur) => position(r_row, proposer) < position(r_row, cur),
                };
                if p_tempted && r_tempted {
                    out.push(BipartiteBlockingPair { proposer, reviewer });
                }
            }
        }
        out
    }

    #[test]
    fn random_matchings_agree_with_brute_force() {
        let mut rng = XorShiftRng::seed_from_u64(0xB1);
        let mut seen_blocking = 0usize;
        let mut seen_stable = 0usize;
        for _ in 0..200 {
            let m = rng.random_range(1..12);
            let n = rng.random_range(1..12);
            let pu = UtilityMatrix::random(&mut rng, m, n);
            let ru = UtilityMatrix::random(&mut rng, n, m);
            let p_ranks = RankTable::from_utilities(&pu);
            let r_ranks = RankTable::from_utilities(&ru);

            let matching = if rng.random_bool(0.25) {
                deferred_acceptance(&p_ranks, &r_ranks)
            } else {
                let mut reviewers: Vec<usize> = (0..n).collect();
                reviewers.shuffle(&mut rng);
                let pairs: Vec<(usize, usize)> = reviewers
                    .iter()
                    .take(m)
                    .enumerate()
                    .filter(|_| rng.random_bool(0.7))
                    .map(|(p, &r)| (p, r))
                    .collect();
                BipartiteMatching::from_pairs(m, n, &pairs).unwrap()
            };

            let expected = brute_force_blocking_pairs(&p_ranks, &r_ranks, &matching);
            let checker = BipartiteChecker::new(&p_ranks, &r_ranks, &matching).unwrap();
            assert_eq!(checker.blocking_pairs(), expected);
            assert_eq!(checker.find_blocking_pair(), expected.first().copied());
            assert_eq!(checker.is_stable(), expected.is_empty());

            let par = BipartiteChecker::new(&p_ranks, &r_ranks, &matching)
                .unwrap()
                .with_parallel_threshold(1);
            assert_eq!(par.find_blocking_pair(), expected.first().copied());

            if expected.is_empty() {
                seen_stable += 1;
            } else {
                seen_blocking += 1;
            }
        }
        assert!(seen_blocking > 0 && seen_stable > 0);
    }

    #[test]
    fn dimension_mismatch_is_reported() {
        let pu = UtilityMatrix::from_rows(&[[1.0, 0.0]]).unwrap();
        let ru = UtilityMatrix::from_rows(&[[1.0], [0.0]]).unwrap();
        let wrong = BipartiteMatching::unmatched(2, 2);
        assert_eq!(
            check_bipartite_stability(&pu, &ru, &wrong),
            Err(MatchError::InvalidInput(InputError::DimensionMismatch {
                what: "matching proposers",
                expected: 1,
                got: 2
            }))
        );
        assert!(check_bipartite_stability(&pu, &pu, &BipartiteMatching::unmatched(1, 2)).is_err());
    }
}
