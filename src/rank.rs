//! Inverse-permutation rank tables for O(1) preference comparisons.

use crate::error::Result;
use crate::ordering::{fill_rows, OrderingKind, PreferenceOrdering, DEFAULT_PARALLEL_THRESHOLD};
use crate::utility::UtilityMatrix;
use tracing::debug;

// ============================================================================
// RankTable
// ============================================================================

/// Direct lookup from `(agent, partner)` to the partner's 0-based rank in the
/// agent's preference ordering (0 = most preferred).
///
/// Invariant: `rank(a, ordering.row(a)[i]) == i` for every position `i`. For a
/// self-excluding ordering the agent itself is assigned rank `n - 1`, one past
/// its least preferred partner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RankTable {
    agents: usize,
    partners: usize,
    kind: OrderingKind,
    ranks: Vec<usize>,
}

impl RankTable {
    /// Inverts every row of `ordering`.
    ///
    /// Every `PreferenceOrdering` constructor derives or validates its rows, so
    /// each row is already a permutation and inversion cannot fail. Raw rows from
    /// outside the crate go through [`RankTable::from_rows`], which reports
    /// [`crate::error::MatchError::MalformedPermutation`].
    pub fn invert(ordering: &PreferenceOrdering) -> Self {
        let agents = ordering.agents();
        let partners = ordering.partners();
        let kind = ordering.kind();

        let mut ranks = vec![0usize; agents * partners];
        let parallel = agents >= DEFAULT_PARALLEL_THRESHOLD;
        fill_rows(&mut ranks, partners, parallel, |agent, out| {
            for (rank, &partner) in ordering.row(agent).iter().enumerate() {
                out[partner] = rank;
            }
            if kind == OrderingKind::ExcludingSelf {
                out[agent] = partners - 1;
            }
        });
        debug!(agents, partners, "inverted preference ordering into rank table");

        let table = Self {
            agents,
            partners,
            kind,
            ranks,
        };
        debug_assert!(table.is_inverse_of(ordering));
        table
    }

    /// Validates raw preference rows and inverts them.
    ///
    /// # Errors
    /// Returns [`crate::error::MatchError::MalformedPermutation`] if a row is not a
    /// bijection over `0..partners`; see [`PreferenceOrdering::from_rows`].
    pub fn from_rows<R: AsRef<[usize]>>(rows: &[R]) -> Result<Self> {
        let ordering = PreferenceOrdering::from_rows(rows)?;
        Ok(Self::invert(&ordering))
    }

    /// Derives the full ordering of `utils` and inverts it.
    pub fn from_utilities(utils: &UtilityMatrix) -> Self {
        Self::invert(&PreferenceOrdering::derive(utils))
    }

    /// Number of agents (rows).
    #[inline]
    pub fn agents(&self) -> usize {
        self.agents
    }

    /// Number of partner indices (columns).
    #[inline]
    pub fn partners(&self) -> usize {
        self.partners
    }

    /// Layout of the ordering this table was inverted from.
    #[inline]
    pub fn kind(&self) -> OrderingKind {
        self.kind
    }

    /// Rank of `partner` in `agent`'s ordering.
    #[inline(always)]
    pub fn rank(&self, agent: usize, partner: usize) -> usize {
        debug_assert!(agent < self.agents && partner < self.partners);
        self.ranks[agent * self.partners + partner]
    }

    /// All ranks for `agent`, indexed by partner.
    #[inline]
    pub fn row(&self, agent: usize) -> &[usize] {
        let start = agent * self.partners;
        &self.ranks[start..start + self.partners]
    }

    /// Returns whether `agent` strictly prefers `x` to `y`.
    #[inline(always)]
    pub fn prefers(&self, agent: usize, x: usize, y: usize) -> bool {
        self.rank(agent, x) < self.rank(agent, y)
    }

    /// Rebuilds the ordering this table inverts.
    pub fn to_ordering(&self) -> PreferenceOrdering {
        let mut order = vec![0usize; self.agents * self.partners];
        for agent in 0..self.agents {
            let out = &mut order[agent * self.partners..(agent + 1) * self.partners];
            for (partner, &rank) in self.row(agent).iter().enumerate() {
                out[rank] = partner;
            }
        }
        if self.kind == OrderingKind::ExcludingSelf {
            // Drop the trailing self entry of each row.
            let width = self.partners - 1;
            order = order
                .chunks(self.partners)
                .flat_map(|row| &row[..width])
                .copied()
                .collect();
        }
        PreferenceOrdering::from_parts(self.agents, self.partners, self.kind, order)
    }

    fn is_inverse_of(&self, ordering: &PreferenceOrdering) -> bool {
        ordering.rows().enumerate().all(|(agent, row)| {
            row.iter()
                .enumerate()
                .all(|(i, &partner)| self.rank(agent, partner) == i)
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
