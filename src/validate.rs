//! Up-front validation passes for utilities, orderings and matchings.
//!
//! These run before any ranking or stability algorithm so that the algorithms
//! themselves can index without bounds anxiety.

use crate::error::{InputError, MatchError, PermutationProblem, Result};

// ============================================================================
// Utilities
// ============================================================================

/// Validates a flat row-major utility buffer.
///
/// # Errors
/// Returns [`MatchError::InvalidInput`] if either dimension is zero, `rows * cols`
/// overflows, the buffer length is not `rows * cols`, or any value is NaN or
/// infinite.
pub fn utilities(rows: usize, cols: usize, data: &[f64]) -> Result<()> {
    if rows == 0 || cols == 0 {
        return Err(InputError::Empty { rows, cols }.into());
    }
    let len = cell_count(rows, cols)?;
    if data.len() != len {
        return Err(InputError::DataLength {
            rows,
            cols,
            got: data.len(),
        }
        .into());
    }
    if let Some(pos) = data.iter().position(|v| !v.is_finite()) {
        return Err(InputError::NonFinite {
            row: pos / cols,
            col: pos % cols,
            value: data[pos],
        }
        .into());
    }
    Ok(())
}

/// Number of cells in a `rows x cols` matrix.
///
/// # Errors
/// Returns [`InputError::TooLarge`] when the product overflows `usize`.
pub fn cell_count(rows: usize, cols: usize) -> Result<usize> {
    rows.checked_mul(cols)
        .ok_or_else(|| InputError::TooLarge { rows, cols }.into())
}

/// Requires a square shape for one-sided problems.
///
/// # Errors
/// Returns [`InputError::NotSquare`] when `rows != cols`.
pub fn square(rows: usize, cols: usize) -> Result<()> {
    if rows == cols {
        Ok(())
    } else {
        Err(InputError::NotSquare { rows, cols }.into())
    }
}

// ============================================================================
// Orderings
// ============================================================================

/// Validates one preference row.
///
/// With `exclude_self == false` the row must be a permutation of
/// `0..partners`. With `exclude_self == true` it must be a permutation of
/// `0..partners` minus `row` itself.
///
/// `seen` is scratch space of length `partners`; it is cleared on return.
///
/// # Errors
/// Returns [`MatchError::MalformedPermutation`] describing the first defect.
pub fn permutation_row(
    row: usize,
    entries: &[usize],
    partners: usize,
    exclude_self: bool,
    seen: &mut [bool],
) -> Result<()> {
    debug_assert_eq!(seen.len(), partners);
    let expected = if exclude_self {
        partners.saturating_sub(1)
    } else {
        partners
    };
    let malformed = |problem| MatchError::MalformedPermutation { row, problem };

    if entries.len() != expected {
        return Err(malformed(PermutationProblem::WrongLength {
            expected,
            got: entries.len(),
        }));
    }

    let mut outcome = Ok(());
    for &index in entries {
        if index >= partners {
            outcome = Err(malformed(PermutationProblem::OutOfRange {
                index,
                len: partners,
            }));
            break;
        }
        if exclude_self && index == row {
            outcome = Err(malformed(PermutationProblem::ContainsSelf));
            break;
        }
        if seen[index] {
            outcome = Err(malformed(PermutationProblem::Duplicate { index }));
            break;
        }
        seen[index] = true;
    }

    for &index in entries {
        if index < partners {
            seen[index] = false;
        }
    }
    outcome
}

// ============================================================================
// Matchings
// ============================================================================

/// Validates a one-sided (roommate) assignment vector.
///
/// `partners[i] == Some(i)` is read as "unmatched". Every other assignment must
/// be in range and reciprocated.
///
/// # Errors
/// Returns [`MatchError::IndexOutOfRange`] or [`MatchError::MatchingAsymmetry`].
pub fn roommate_matching(partners: &[Option<usize>]) -> Result<()> {
    let len = partners.len();
    slots_in_range(partners, len)?;

    for (agent, slot) in partners.iter().enumerate() {
        let Some(partner) = *slot else { continue };
        if partner == agent {
            continue;
        }
        let back = partners[partner];
        if back != Some(agent) {
            return Err(MatchError::MatchingAsymmetry {
                agent,
                partner,
                back,
            });
        }
    }
    Ok(())
}

/// Validates a two-sided assignment given in both directions.
///
/// # Errors
/// Returns [`MatchError::IndexOutOfRange`] if any side points past the other
/// side's length, or [`MatchError::MatchingAsymmetry`] if the two directions
/// disagree. Asymmetry indices are reported as proposer -> reviewer when the
/// proposer side is at fault and reviewer -> proposer otherwise.
pub fn bipartite_matching(
    proposer_side: &[Option<usize>],
    reviewer_side: &[Option<usize>],
) -> Result<()> {
    slots_in_range(proposer_side, reviewer_side.len())?;
    slots_in_range(reviewer_side, proposer_side.len())?;

    for (proposer, slot) in proposer_side.iter().enumerate() {
        let Some(reviewer) = *slot else { continue };
        let back = reviewer_side[reviewer];
        if back != Some(proposer) {
            return Err(MatchError::MatchingAsymmetry {
                agent: proposer,
                partner: reviewer,
                back,
            });
        }
    }
    for (reviewer, slot) in reviewer_side.iter().enumerate() {
        let Some(proposer) = *slot else { continue };
        let back = proposer_side[proposer];
        if back != Some(reviewer) {
            return Err(MatchError::MatchingAsymmetry {
                agent: reviewer,
                partner: proposer,
                back,
            });
        }
    }
    Ok(())
}

fn slots_in_range(slots: &[Option<usize>], len: usize) -> Result<()> {
    for (agent, slot) in slots.iter().enumerate() {
        if let Some(partner) = *slot {
            if partner >= len {
                return Err(MatchError::IndexOutOfRange {
                    agent,
                    partner,
                    len,
                });
            }
        }
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn check_row(row: usize, entries: &[usize], partners: usize, exclude_self: bool) -> Result<()> {
        let mut seen = vec![false; partners];
        let out = permutation_row(row, entries, partners, exclude_self, &mut seen);
        assert!(seen.iter().all(|&s| !s), "scratch space must be cleared");
        out
    }

    // -------------------------------------------------------------------------
    // Utilities
    // -------------------------------------------------------------------------

    #[test]
    fn utilities_accepts_finite_square_data() {
        assert!(utilities(2, 2, &[0.0, 1.0, -3.5, 2.0]).is_ok());
    }

    #[test]
    fn utilities_rejects_empty_dimensions() {
        assert_eq!(
            utilities(0, 3, &[]),
            Err(InputError::Empty { rows: 0, cols: 3 }.into())
        );
    }

    #[test]
    fn utilities_rejects_wrong_length() {
        assert_eq!(
            utilities(2, 2, &[1.0, 2.0, 3.0]),
            Err(InputError::DataLength {
                rows: 2,
                cols: 2,
                got: 3
            }
            .into())
        );
    }

    #[test]
    fn utilities_rejects_overflowing_dimensions() {
        let big = 1usize << (usize::BITS / 2);
        assert_eq!(
            utilities(big, big, &[]),
            Err(InputError::TooLarge {
                rows: big,
                cols: big
            }
            .into())
        );
        assert_eq!(
            utilities(usize::MAX, 2, &[1.0]),
            Err(InputError::TooLarge {
                rows: usize::MAX,
                cols: 2
            }
            .into())
        );
        assert_eq!(cell_count(big - 1, big), Ok((big - 1) * big));
    }

    #[test]
    fn utilities_locates_nan() {
        let err = utilities(2, 3, &[0.0, 1.0, 2.0, 3.0, f64::NAN, 5.0]).unwrap_err();
        match err {
            MatchError::InvalidInput(InputError::NonFinite { row, col, value }) => {
                assert_eq!((row, col), (1, 1));
                assert!(value.is_nan());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn utilities_rejects_infinity() {
        assert!(utilities(1, 2, &[f64::NEG_INFINITY, 0.0]).is_err());
    }

    #[test]
    fn square_rejects_rectangles() {
        assert!(square(3, 3).is_ok());
        assert_eq!(
            square(2, 3),
            Err(InputError::NotSquare { rows: 2, cols: 3 }.into())
        );
    }

    // -------------------------------------------------------------------------
    // Permutations
    // -------------------------------------------------------------------------

    #[test]
    fn permutation_row_accepts_full_permutation() {
        assert!(check_row(0, &[2, 0, 1], 3, false).is_ok());
    }

    #[test]
    fn permutation_row_reports_each_defect() {
        let problem = |r: Result<()>| match r {
            Err(MatchError::MalformedPermutation { problem, .. }) => problem,
            other => panic!("expected malformed permutation, got {other:?}"),
        };
        assert_eq!(
            problem(check_row(0, &[0, 1], 3, false)),
            PermutationProblem::WrongLength {
                expected: 3,
                got: 2
            }
        );
        assert_eq!(
            problem(check_row(0, &[0, 3, 1], 3, false)),
            PermutationProblem::OutOfRange { index: 3, len: 3 }
        );
        assert_eq!(
            problem(check_row(0, &[0, 1, 1], 3, false)),
            PermutationProblem::Duplicate { index: 1 }
        );
        assert_eq!(
            problem(check_row(1, &[1, 0], 3, true)),
            PermutationProblem::ContainsSelf
        );
    }

    #[test]
    fn permutation_row_accepts_self_excluding_row() {
        assert!(check_row(1, &[2, 0], 3, true).is_ok());
        assert!(check_row(0, &[], 1, true).is_ok());
    }

    // -------------------------------------------------------------------------
    // Matchings
    // -------------------------------------------------------------------------

    #[test]
    fn roommate_matching_accepts_symmetric_pairs_and_self_matches() {
        assert!(roommate_matching(&[Some(1), Some(0), Some(2), None]).is_ok());
    }

    #[test]
    fn roommate_matching_rejects_one_way_assignment() {
        assert_eq!(
            roommate_matching(&[Some(1), None, None]),
            Err(MatchError::MatchingAsymmetry {
                agent: 0,
                partner: 1,
                back: None
            })
        );
    }

    #[test]
    fn roommate_matching_rejects_out_of_range_partner() {
        assert_eq!(
            roommate_matching(&[Some(5), None]),
            Err(MatchError::IndexOutOfRange {
                agent: 0,
                partner: 5,
                len: 2
            })
        );
    }

    #[test]
    fn bipartite_matching_checks_both_directions() {
        assert!(bipartite_matching(&[Some(1), None], &[None, Some(0), None]).is_ok());
        assert_eq!(
            bipartite_matching(&[Some(1), None], &[None, Some(1), None]),
            Err(MatchError::MatchingAsymmetry {
                agent: 0,
                partner: 1,
                back: Some(1)
            })
        );
        assert_eq!(
            bipartite_matching(&[None, None], &[Some(0)]),
            Err(MatchError::MatchingAsymmetry {
                agent: 0,
                partner: 0,
                back: None
            })
        );
        assert_eq!(
            bipartite_matching(&[Some(3)], &[None]),
            Err(MatchError::IndexOutOfRange {
                agent: 0,
                partner: 3,
                len: 1
            })
        );
    }
}
