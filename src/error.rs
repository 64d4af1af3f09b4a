//! Error types for preference ranking and stability checks.
//!
//! Every failure is detected by a validation pass that runs before the core
//! algorithm; a successful validation guarantees the algorithm completes.

use thiserror::Error;

/// Result type alias using this crate's [`MatchError`].
pub type Result<T> = std::result::Result<T, MatchError>;

/// Errors reported by ranking, inversion and stability verification.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatchError {
    /// Utilities or dimensions are unusable.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),

    /// A preference row is not a bijection over its index set.
    #[error("malformed permutation in row {row}: {problem}")]
    MalformedPermutation {
        /// The agent whose ordering is malformed.
        row: usize,
        /// What is wrong with it.
        problem: PermutationProblem,
    },

    /// `agent -> partner` holds but `partner -> agent` does not.
    #[error("matching is asymmetric: {agent} -> {partner}, but {partner} -> {back:?}")]
    MatchingAsymmetry {
        /// The agent whose assignment is not reciprocated.
        agent: usize,
        /// The partner it claims.
        partner: usize,
        /// Who the partner is actually assigned to.
        back: Option<usize>,
    },

    /// A matching references a partner outside `0..len`.
    #[error("agent {agent} references partner {partner}, out of range for {len} agents")]
    IndexOutOfRange {
        /// The referencing agent.
        agent: usize,
        /// The offending partner index.
        partner: usize,
        /// Number of valid partner indices.
        len: usize,
    },
}

/// Details for [`MatchError::InvalidInput`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    /// The matrix has no rows or no columns.
    #[error("matrix must have at least one row and one column, got {rows} x {cols}")]
    Empty {
        /// Row count.
        rows: usize,
        /// Column count.
        cols: usize,
    },

    /// A utility is NaN or infinite.
    #[error("non-finite utility {value} at ({row}, {col})")]
    NonFinite {
        /// Row index.
        row: usize,
        /// Column index.
        col: usize,
        /// The offending value.
        value: f64,
    },

    /// A one-sided operation was given a rectangular matrix.
    #[error("matrix is not square: {rows} rows x {cols} columns")]
    NotSquare {
        /// Row count.
        rows: usize,
        /// Column count.
        cols: usize,
    },

    /// Flat data length does not equal `rows * cols`.
    #[error("data length {got} does not match {rows} x {cols}")]
    DataLength {
        /// Row count.
        rows: usize,
        /// Column count.
        cols: usize,
        /// Supplied element count.
        got: usize,
    },

    /// `rows * cols` does not fit in `usize`.
    #[error("{rows} x {cols} utility matrix overflows the address space")]
    TooLarge {
        /// Row count.
        rows: usize,
        /// Column count.
        cols: usize,
    },

    /// Nested rows of differing lengths.
    #[error("ragged row {row}: expected {expected} entries, got {got}")]
    Ragged {
        /// Row index.
        row: usize,
        /// Length of the first row.
        expected: usize,
        /// Length of this row.
        got: usize,
    },

    /// Two structures that must agree in size do not.
    #[error("dimension mismatch for {what}: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Which dimension disagrees.
        what: &'static str,
        /// Required size.
        expected: usize,
        /// Supplied size.
        got: usize,
    },

    /// An assigned partner is ranked below the agent's outside option.
    #[error("agent {agent} is matched to unacceptable partner {partner}")]
    UnacceptablePartner {
        /// The agent.
        agent: usize,
        /// The partner it ranks below being unmatched.
        partner: usize,
    },
}

/// Details for [`MatchError::MalformedPermutation`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermutationProblem {
    /// Row has the wrong number of entries.
    #[error("expected {expected} entries, got {got}")]
    WrongLength {
        /// Required length.
        expected: usize,
        /// Actual length.
        got: usize,
    },
    /// Entry is not a valid partner index.
    #[error("index {index} is out of range for {len} partners")]
    OutOfRange {
        /// The entry.
        index: usize,
        /// Number of partners.
        len: usize,
    },
    /// Entry appears more than once.
    #[error("index {index} appears more than once")]
    Duplicate {
        /// The repeated entry.
        index: usize,
    },
    /// A self-excluding row lists its own agent.
    #[error("row lists its own agent")]
    ContainsSelf,
}

impl MatchError {
    /// Shorthand for a dimension mismatch wrapped as invalid input.
    pub(crate) fn dimension(what: &'static str, expected: usize, got: usize) -> Self {
        Self::InvalidInput(InputError::DimensionMismatch {
            what,
            expected,
            got,
        })
    }
}
