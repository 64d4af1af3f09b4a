//! Preference orderings derived from cardinal utilities.
//!
//! Each agent's row lists partner indices from most to least preferred. Rows are
//! produced by a stable descending sort, so equal utilities keep their column
//! order and repeated runs on the same input are bit-identical.

use crate::error::{InputError, Result};
use crate::utility::UtilityMatrix;
use crate::validate;
use rayon::prelude::*;
use std::cmp::Ordering;
use tracing::debug;

/// Agent count at or above which rows are processed on the rayon pool.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 256;

// ============================================================================
// PreferenceOrdering
// ============================================================================

/// Which partner indices a row ranks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderingKind {
    /// Every row is a permutation of `0..partners`, including the agent itself
    /// when the problem is one-sided.
    Full,
    /// One-sided only: row `i` is a permutation of `0..partners` without `i`.
    ExcludingSelf,
}

/// Per-agent preference rows, stored flat (`agent * width + position`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreferenceOrdering {
    agents: usize,
    partners: usize,
    kind: OrderingKind,
    order: Vec<usize>,
}

impl PreferenceOrdering {
    /// Ranks every column of every row by descending utility.
    ///
    /// Works on rectangular matrices (two-sided problems) as well as square ones.
    pub fn derive(utils: &UtilityMatrix) -> Self {
        Self::derive_with_threshold(utils, DEFAULT_PARALLEL_THRESHOLD)
    }

    /// Like [`PreferenceOrdering::derive`], parallelising once `utils.rows()`
    /// reaches `parallel_threshold`. The result does not depend on the threshold.
    pub fn derive_with_threshold(utils: &UtilityMatrix, parallel_threshold: usize) -> Self {
        let agents = utils.rows();
        let partners = utils.cols();
        let mut order = vec![0usize; agents * partners];
        fill_rows(&mut order, partners, agents >= parallel_threshold, |agent, out| {
            sort_descending(utils.row(agent), None, out);
        });
        debug!(agents, partners, "derived preference ordering");
        Self {
            agents,
            partners,
            kind: OrderingKind::Full,
            order,
        }
    }

    /// Ranks every *other* agent by descending utility, ignoring the diagonal.
    ///
    /// This is the roommate form: row `i` has `n - 1` entries.
    ///
    /// # Errors
    /// Returns [`InputError::NotSquare`] for a rectangular matrix.
    pub fn derive_excluding_self(utils: &UtilityMatrix) -> Result<Self> {
        validate::square(utils.rows(), utils.cols())?;
        let n = utils.rows();
        let width = n - 1;
        let mut order = vec![0usize; n * width];
        fill_rows(&mut order, width, n >= DEFAULT_PARALLEL_THRESHOLD, |agent, out| {
            sort_descending(utils.row(agent), Some(agent), out);
        });
        debug!(agents = n, "derived self-excluding preference ordering");
        Ok(Self {
            agents: n,
            partners: n,
            kind: OrderingKind::ExcludingSelf,
            order,
        })
    }

    /// Wraps externally supplied full preference rows.
    ///
    /// The partner count is taken from the first row; every row must be a
    /// permutation of `0..partners`.
    ///
    /// # Errors
    /// Returns [`InputError::Empty`] for no rows, or
    /// [`crate::error::MatchError::MalformedPermutation`] for a bad row.
    pub fn from_rows<R: AsRef<[usize]>>(rows: &[R]) -> Result<Self> {
        let partners = rows.first().map_or(0, |r| r.as_ref().len());
        Self::from_rows_of_kind(rows, partners, OrderingKind::Full)
    }

    /// Wraps externally supplied self-excluding rows (`n` rows of `n - 1` entries).
    ///
    /// # Errors
    /// Returns [`InputError::Empty`] for no rows, or
    /// [`crate::error::MatchError::MalformedPermutation`] for a bad row.
    pub fn from_rows_excluding_self<R: AsRef<[usize]>>(rows: &[R]) -> Result<Self> {
        Self::from_rows_of_kind(rows, rows.len(), OrderingKind::ExcludingSelf)
    }

    fn from_rows_of_kind<R: AsRef<[usize]>>(
        rows: &[R],
        partners: usize,
        kind: OrderingKind,
    ) -> Result<Self> {
        let agents = rows.len();
        if agents == 0 || partners == 0 {
            return Err(InputError::Empty {
                rows: agents,
                cols: partners,
            }
            .into());
        }
        let exclude_self = kind == OrderingKind::ExcludingSelf;
        let mut seen = vec![false; partners];
        let mut order = Vec::with_capacity(validate::cell_count(agents, partners)?);
        for (agent, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            validate::permutation_row(agent, row, partners, exclude_self, &mut seen)?;
            order.extend_from_slice(row);
        }
        Ok(Self {
            agents,
            partners,
            kind,
            order,
        })
    }

    pub(crate) fn from_parts(
        agents: usize,
        partners: usize,
        kind: OrderingKind,
        order: Vec<usize>,
    ) -> Self {
        let ordering = Self {
            agents,
            partners,
            kind,
            order,
        };
        debug_assert_eq!(ordering.order.len(), agents * ordering.width());
        ordering
    }

    /// Number of agents (rows).
    #[inline]
    pub fn agents(&self) -> usize {
        self.agents
    }

    /// Number of distinct partner indices.
    #[inline]
    pub fn partners(&self) -> usize {
        self.partners
    }

    /// Row layout.
    #[inline]
    pub fn kind(&self) -> OrderingKind {
        self.kind
    }

    /// Entries per row.
    #[inline]
    pub fn width(&self) -> usize {
        match self.kind {
            OrderingKind::Full => self.partners,
            OrderingKind::ExcludingSelf => self.partners - 1,
        }
    }

    /// Agent `agent`'s partners, most preferred first.
    #[inline]
    pub fn row(&self, agent: usize) -> &[usize] {
        let width = self.width();
        let start = agent * width;
        &self.order[start..start + width]
    }

    /// Iterates over all rows in agent order.
    pub fn rows(&self) -> impl Iterator<Item = &[usize]> + '_ {
        (0..self.agents).map(move |agent| self.row(agent))
    }

    /// Returns the flat row-major buffer.
    #[inline]
    pub fn as_slice(&self) -> &[usize] {
        &self.order
    }
}

// ============================================================================
// Internal
// ============================================================================

/// Runs `fill` over every `width`-sized row of `buf`.
pub(crate) fn fill_rows<F>(buf: &mut [usize], width: usize, parallel: bool, fill: F)
where
    F: Fn(usize, &mut [usize]) + Sync,
{
    if width == 0 {
        return;
    }
    if parallel {
        buf.par_chunks_mut(width)
            .enumerate()
            .for_each(|(row, out)| fill(row, out));
    } else {
        buf.chunks_mut(width)
            .enumerate()
            .for_each(|(row, out)| fill(row, out));
    }
}

/// Writes the column indices of `utils` (minus `skip`) into `out`, best first.
fn sort_descending(utils: &[f64], skip: Option<usize>, out: &mut [usize]) {
    let cols = (0..utils.len()).filter(|&c| Some(c) != skip);
    for (slot, col) in out.iter_mut().zip(cols) {
        *slot = col;
    }
    // `sort_by` is stable: ties keep ascending column order.
    out.sort_by(|&a, &b| utils[b].partial_cmp(&utils[a]).unwrap_or(Ordering::Equal));
}

// ============================================================================
// Tests
// ============================================================================
