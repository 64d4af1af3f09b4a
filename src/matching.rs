//! Candidate matchings supplied for verification.
//!
//! Both types are validated on construction (range and reciprocity), so the
//! stability checkers only need to compare their sizes against the rank tables.

use crate::error::{MatchError, Result};
use crate::validate;

// ============================================================================
// One-sided
// ============================================================================

/// A one-sided (roommate) matching: each agent has at most one partner and
/// assignments are mutual.
///
/// An agent assigned to itself is read as unmatched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Matching {
    partners: Vec<Option<usize>>,
}

impl Matching {
    /// A matching of `n` agents in which nobody is matched.
    pub fn unmatched(n: usize) -> Self {
        Self {
            partners: vec![None; n],
        }
    }

    /// Wraps a per-agent assignment vector. Self-assignments are stored as `None`.
    ///
    /// # Errors
    /// Returns [`MatchError::IndexOutOfRange`] for a partner `>= partners.len()`, or
    /// [`MatchError::MatchingAsymmetry`] if some `a -> b` is not matched by `b -> a`.
    pub fn new(mut partners: Vec<Option<usize>>) -> Result<Self> {
        validate::roommate_matching(&partners)?;
        for (agent, slot) in partners.iter_mut().enumerate() {
            if *slot == Some(agent) {
                *slot = None;
            }
        }
        Ok(Self { partners })
    }

    /// Builds a matching of `n` agents from unordered pairs.
    ///
    /// A pair `(a, a)` leaves `a` unmatched.
    ///
    /// # Errors
    /// Returns [`MatchError::IndexOutOfRange`] if a pair references an agent `>= n`,
    /// or [`MatchError::MatchingAsymmetry`] if an agent appears in two pairs.
    pub fn from_pairs(n: usize, pairs: &[(usize, usize)]) -> Result<Self> {
        let mut partners = vec![None; n];
        for &(a, b) in pairs {
            for (agent, partner) in [(a, b), (b, a)] {
                if partner >= n {
                    return Err(MatchError::IndexOutOfRange {
                        agent,
                        partner,
                        len: n,
                    });
                }
            }
            partners[a] = Some(b);
            partners[b] = Some(a);
        }
        Self::new(partners)
    }

    /// Reads the sentinel encoding: `indices[i] == indices.len()` (or `i`) means
    /// agent `i` is unmatched.
    ///
    /// # Errors
    /// Same as [`Matching::new`]; values past the sentinel are out of range.
    pub fn from_indices(indices: &[usize]) -> Result<Self> {
        let sentinel = indices.len();
        let mut partners = Vec::with_capacity(indices.len());
        for (agent, &partner) in indices.iter().enumerate() {
            match partner {
                p if p == sentinel => partners.push(None),
                p if p > sentinel => {
                    return Err(MatchError::IndexOutOfRange {
                        agent,
                        partner: p,
                        len: sentinel,
                    })
                }
                p => partners.push(Some(p)),
            }
        }
        Self::new(partners)
    }

    /// Writes the sentinel encoding read by [`Matching::from_indices`].
    pub fn to_indices(&self) -> Vec<usize> {
        let sentinel = self.len();
        (0..sentinel)
            .map(|agent| self.partner(agent).unwrap_or(sentinel))
            .collect()
    }

    /// Number of agents.
    #[inline]
    pub fn len(&self) -> usize {
        self.partners.len()
    }

    /// Returns whether there are no agents.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.partners.is_empty()
    }

    /// The partner of `agent`, or `None` if unmatched (including self-matched).
    #[inline(always)]
    pub fn partner(&self, agent: usize) -> Option<usize> {
        self.partners[agent]
    }

    /// Returns whether `agent` has a partner other than itself.
    #[inline]
    pub fn is_matched(&self, agent: usize) -> bool {
        self.partner(agent).is_some()
    }

    /// Iterates over matched pairs `(a, b)` with `a < b`.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.len()).filter_map(move |a| match self.partner(a) {
            Some(b) if a < b => Some((a, b)),
            _ => None,
        })
    }
}

// ============================================================================
// Two-sided
// ============================================================================

/// A two-sided matching between proposers and reviewers, held in both
/// directions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BipartiteMatching {
    proposer_side: Vec<Option<usize>>,
    reviewer_side: Vec<Option<usize>>,
}

impl BipartiteMatching {
    /// Nobody matched.
    pub fn unmatched(proposers: usize, reviewers: usize) -> Self {
        Self {
            proposer_side: vec![None; proposers],
            reviewer_side: vec![None; reviewers],
        }
    }

    /// Wraps both directions of an assignment.
    ///
    /// # Errors
    /// Returns [`MatchError::IndexOutOfRange`] or [`MatchError::MatchingAsymmetry`]
    /// if the two directions are out of range or disagree.
    pub fn new(proposer_side: Vec<Option<usize>>, reviewer_side: Vec<Option<usize>>) -> Result<Self> {
        validate::bipartite_matching(&proposer_side, &reviewer_side)?;
        Ok(Self {
            proposer_side,
            reviewer_side,
        })
    }

    /// Builds the reviewer direction from the proposer direction.
    ///
    /// # Errors
    /// Returns [`MatchError::IndexOutOfRange`] for a reviewer `>= reviewers`, or
    /// [`MatchError::MatchingAsymmetry`] when two proposers claim one reviewer.
    pub fn from_proposer_side(reviewers: usize, proposer_side: Vec<Option<usize>>) -> Result<Self> {
        let mut reviewer_side = vec![None; reviewers];
        for (proposer, slot) in proposer_side.iter().enumerate() {
            let Some(reviewer) = *slot else { continue };
            if reviewer >= reviewers {
                return Err(MatchError::IndexOutOfRange {
                    agent: proposer,
                    partner: reviewer,
                    len: reviewers,
                });
            }
            if let Some(holder) = reviewer_side[reviewer] {
                return Err(MatchError::MatchingAsymmetry {
                    agent: proposer,
                    partner: reviewer,
                    back: Some(holder),
                });
            }
            reviewer_side[reviewer] = Some(proposer);
        }
        Ok(Self {
            proposer_side,
            reviewer_side,
        })
    }

    /// Builds a matching from `(proposer, reviewer)` pairs.
    ///
    /// # Errors
    /// Same as [`BipartiteMatching::from_proposer_side`]; a proposer listed twice is
    /// also [`MatchError::MatchingAsymmetry`].
    pub fn from_pairs(proposers: usize, reviewers: usize, pairs: &[(usize, usize)]) -> Result<Self> {
        let mut proposer_side = vec![None; proposers];
        for &(proposer, reviewer) in pairs {
            if proposer >= proposers {
                return Err(MatchError::IndexOutOfRange {
                    agent: reviewer,
                    partner: proposer,
                    len: proposers,
                });
            }
            if let Some(previous) = proposer_side[proposer] {
                return Err(MatchError::MatchingAsymmetry {
                    agent: proposer,
                    partner: reviewer,
                    back: Some(previous),
                });
            }
            proposer_side[proposer] = Some(reviewer);
        }
        Self::from_proposer_side(reviewers, proposer_side)
    }

    /// Number of proposers.
    #[inline]
    pub fn proposers(&self) -> usize {
        self.proposer_side.len()
    }

    /// Number of reviewers.
    #[inline]
    pub fn reviewers(&self) -> usize {
        self.reviewer_side.len()
    }

    /// The reviewer `proposer` is matched to.
    #[inline(always)]
    pub fn reviewer_of(&self, proposer: usize) -> Option<usize> {
        self.proposer_side[proposer]
    }

    /// The proposer `reviewer` is matched to.
    #[inline(always)]
    pub fn proposer_of(&self, reviewer: usize) -> Option<usize> {
        self.reviewer_side[reviewer]
    }

    /// Iterates over matched `(proposer, reviewer)` pairs in proposer order.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.proposer_side
            .iter()
            .enumerate()
            .filter_map(|(p, r)| r.map(|r| (p, r)))
    }
}

// ============================================================================
// Tests
// ============================================================================
