//! Dynamic entry point for coordinate rows of unknown arity.
//!
//! Callers that hold points as rows of `f64` (deserialized JSON, columns
//! read from a file) go through [`simplify_rows`]. The arity is checked
//! once here; after that it is fixed by the const generic on
//! [`Point`], so the engine never re-validates it.

use crate::simplify::simplify_with_config;
use crate::types::{Point, Polyline, Simplified, SimplifyConfig, SimplifyError};

/// Coordinate count shared by every row, or `None` for no rows.
///
/// # Errors
///
/// Returns [`SimplifyError::InconsistentDimensionality`] naming the first
/// row whose length differs from row 0.
pub fn uniform_arity<R: AsRef<[f64]>>(rows: &[R]) -> Result<Option<usize>, SimplifyError> {
    let Some(first) = rows.first() else {
        return Ok(None);
    };
    let expected = first.as_ref().len();
    if let Some((index, row)) = rows
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, row)| row.as_ref().len() != expected)
    {
        return Err(SimplifyError::InconsistentDimensionality {
            expected,
            found: row.as_ref().len(),
            index,
        });
    }
    Ok(Some(expected))
}

/// Convert rows of exactly `D` coordinates into a polyline.
///
/// # Errors
///
/// Returns [`SimplifyError::InconsistentDimensionality`] for the first
/// row that does not have `D` coordinates.
pub fn points_from_rows<const D: usize, R: AsRef<[f64]>>(
    rows: &[R],
) -> Result<Polyline<D>, SimplifyError> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            let row = row.as_ref();
            <[f64; D]>::try_from(row).map(Point::new).map_err(|_| {
                SimplifyError::InconsistentDimensionality {
                    expected: D,
                    found: row.len(),
                    index,
                }
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Polyline::new)
}

/// Simplify a curve given as coordinate rows.
///
/// The config is validated first, then the rows. Rows of 2 or 3
/// coordinates are dispatched to the typed engine; an empty input is
/// returned unchanged.
///
/// # Errors
///
/// - [`SimplifyError::InvalidTolerance`] / [`SimplifyError::InvalidConfig`]
///   if `config` fails validation.
/// - [`SimplifyError::InconsistentDimensionality`] if the rows differ in
///   length.
/// - [`SimplifyError::UnsupportedDimensionality`] for any other arity.
pub fn simplify_rows<R: AsRef<[f64]>>(
    rows: &[R],
    config: &SimplifyConfig,
) -> Result<Simplified, SimplifyError> {
    config.validate()?;
    let result = match uniform_arity(rows) {
        Ok(None) => Ok(Simplified::all(0)),
        Ok(Some(2)) => {
            points_from_rows::<2, _>(rows).and_then(|pl| simplify_with_config(&pl, config))
        }
        Ok(Some(3)) => {
            points_from_rows::<3, _>(rows).and_then(|pl| simplify_with_config(&pl, config))
        }
        Ok(Some(arity)) => Err(SimplifyError::UnsupportedDimensionality { arity }),
        Err(e) => Err(e),
    };
    if let Err(e) = &result {
        log::debug!("rejected {} rows: {e}", rows.len());
    }
    result
}

/// Keep-mask form of [`simplify_rows`].
///
/// # Errors
///
/// Same as [`simplify_rows`].
pub fn simplify_rows_mask<R: AsRef<[f64]>>(
    rows: &[R],
    config: &SimplifyConfig,
) -> Result<Vec<bool>, SimplifyError> {
    Ok(simplify_rows(rows, config)?.mask())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn arity_of_empty_input_is_none() {
        let rows: Vec<Vec<f64>> = vec![];
        assert_eq!(uniform_arity(&rows).unwrap(), None);
    }

    #[test]
    fn mixed_arity_names_offending_row() {
        let rows = vec![vec![0.0, 0.0], vec![1.0, 1.0], vec![2.0, 2.0, 2.0]];
        assert_eq!(
            uniform_arity(&rows),
            Err(SimplifyError::InconsistentDimensionality {
                expected: 2,
                found: 3,
                index: 2,
            })
        );
    }

    #[test]
    fn mixed_arity_rejected_before_simplifying() {
        let rows = vec![vec![0.0, 0.0], vec![1.0]];
        assert!(matches!(
            simplify_rows(&rows, &SimplifyConfig::new(1.0)),
            Err(SimplifyError::InconsistentDimensionality { index: 1, .. })
        ));
    }

    #[test]
    fn invalid_tolerance_checked_before_rows() {
        let rows = vec![vec![0.0], vec![1.0, 2.0]];
        assert!(matches!(
            simplify_rows(&rows, &SimplifyConfig::new(-1.0)),
            Err(SimplifyError::InvalidTolerance(_))
        ));
    }

    #[test]
    fn unsupported_arity() {
        let rows = vec![[0.0; 4], [1.0; 4], [2.0; 4]];
        assert_eq!(
            simplify_rows(&rows, &SimplifyConfig::new(1.0)),
            Err(SimplifyError::UnsupportedDimensionality { arity: 4 })
        );
        let empty_rows: Vec<Vec<f64>> = vec![vec![], vec![]];
        assert_eq!(
            simplify_rows(&empty_rows, &SimplifyConfig::new(1.0)),
            Err(SimplifyError::UnsupportedDimensionality { arity: 0 })
        );
    }

    #[test]
    fn empty_rows_unchanged() {
        let rows: Vec<[f64; 2]> = vec![];
        let result = simplify_rows(&rows, &SimplifyConfig::new(1.0)).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn planar_rows_match_typed_api() {
        let rows = vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
            vec![2.0, 1.0],
            vec![2.0, 0.0],
            vec![3.0, 0.0],
        ];
        let config = SimplifyConfig::new(0.5);
        let result = simplify_rows(&rows, &config).unwrap();
        let polyline = points_from_rows::<2, _>(&rows).unwrap();
        let typed = simplify_with_config(&polyline, &config).unwrap();
        assert_eq!(result, typed);
        assert_eq!(result.indices(), &[0, 1, 2, 5]);
    }

    #[test]
    fn spatial_rows_dispatch() {
        let rows = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
            [3.0, 0.0, 0.0],
        ];
        let mask = simplify_rows_mask(&rows, &SimplifyConfig::new(0.0)).unwrap();
        assert_eq!(mask, vec![true, false, false, true]);
    }

    #[test]
    fn points_from_rows_rejects_wrong_arity() {
        let rows = vec![vec![0.0, 0.0, 0.0]];
        assert_eq!(
            points_from_rows::<2, _>(&rows),
            Err(SimplifyError::InconsistentDimensionality {
                expected: 2,
                found: 3,
                index: 0,
            })
        );
    }
}
