//! Curve simplification using the Ramer-Douglas-Peucker algorithm.
//!
//! The segment between the first and last point is the initial
//! approximation. The interior point farthest from it is kept if its
//! deviation exceeds the tolerance, and both halves are processed the same
//! way; otherwise the whole interior is dropped.
//!
//! Instead of recursing, the engine drains an explicit LIFO stack of
//! [`Span`]s. A span pairs a slice of points with the disjoint slice of
//! the keep-mask covering its interior, so splitting never copies points
//! and the call stack stays flat no matter how lopsided the splits are.
//! With the `parallel` feature, splits whose halves are both at least
//! [`PARALLEL_SPLIT_THRESHOLD`] points long are forked with `rayon::join`;
//! the mask each branch writes is disjoint, so the result is identical
//! to the sequential driver.

use crate::closed;
use crate::diagnostics::SimplifyStats;
use crate::geometry;
use crate::parallel::{self, IntoParallelIterator};
use crate::types::{Point, Polyline, Simplified, SimplifyConfig, SimplifyError, Tolerance};

#[cfg(feature = "parallel")]
use crate::parallel::ParallelIterator;

/// Minimum length of both halves of a split before it is forked onto the
/// rayon pool.
pub const PARALLEL_SPLIT_THRESHOLD: usize = 4096;

/// Simplify a polyline with the given tolerance and default closure
/// detection.
///
/// Returns the indices of the retained points. Curves with two or fewer
/// points are returned unchanged.
///
/// # Errors
///
/// Returns [`SimplifyError::InvalidTolerance`] if `tolerance` is negative
/// or NaN.
pub fn simplify<const D: usize>(
    polyline: &Polyline<D>,
    tolerance: f64,
) -> Result<Simplified, SimplifyError> {
    simplify_with_config(polyline, &SimplifyConfig::new(tolerance))
}

/// Simplify a polyline with a full configuration.
///
/// # Errors
///
/// Returns [`SimplifyError::InvalidTolerance`] or
/// [`SimplifyError::InvalidConfig`] if `config` fails validation.
pub fn simplify_with_config<const D: usize>(
    polyline: &Polyline<D>,
    config: &SimplifyConfig,
) -> Result<Simplified, SimplifyError> {
    simplify_points(polyline.points(), config).map(|(simplified, _)| simplified)
}

/// Simplify a polyline and return a keep-mask over its points.
///
/// # Errors
///
/// Same as [`simplify_with_config`].
pub fn simplify_mask<const D: usize>(
    polyline: &Polyline<D>,
    config: &SimplifyConfig,
) -> Result<Vec<bool>, SimplifyError> {
    Ok(simplify_with_config(polyline, config)?.mask())
}

/// Simplify several independent polylines with the same configuration.
///
/// The config is validated once up front. Results are in input order.
/// With the `parallel` feature the curves are processed concurrently.
///
/// # Errors
///
/// Returns the config validation error, if any.
pub fn simplify_many<const D: usize>(
    polylines: &[Polyline<D>],
    config: &SimplifyConfig,
) -> Result<Vec<Simplified>, SimplifyError> {
    let tolerance = config.validate()?;
    log::trace!("simplifying {} polylines", polylines.len());
    let engine = Engine::new(tolerance);
    Ok(polylines
        .into_par_iter()
        .map(|pl| engine.run(pl.points(), config).0)
        .collect())
}

/// Validate `config` and simplify a point slice, returning the counters
/// collected along the way.
pub(crate) fn simplify_points<const D: usize>(
    points: &[Point<D>],
    config: &SimplifyConfig,
) -> Result<(Simplified, SimplifyStats), SimplifyError> {
    let tolerance = config.validate()?;
    Ok(Engine::new(tolerance).run(points, config))
}

/// Tolerance plus the fork threshold for one simplification call.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Engine {
    tolerance: f64,
    fork_at: usize,
}

impl Engine {
    pub(crate) const fn new(tolerance: Tolerance) -> Self {
        let fork_at = if parallel::ENABLED {
            PARALLEL_SPLIT_THRESHOLD
        } else {
            usize::MAX
        };
        Self::with_fork_threshold(tolerance, fork_at)
    }

    pub(crate) const fn with_fork_threshold(tolerance: Tolerance, fork_at: usize) -> Self {
        Self {
            tolerance: tolerance.get(),
            fork_at,
        }
    }

    /// Simplify an already validated curve.
    pub(crate) fn run<const D: usize>(
        self,
        points: &[Point<D>],
        config: &SimplifyConfig,
    ) -> (Simplified, SimplifyStats) {
        let mut stats = SimplifyStats::default();
        if points.len() <= 2 {
            return (Simplified::all(points.len()), stats);
        }

        let mut keep = vec![false; points.len()];
        match closed::classify(points, config) {
            Some(ring) => {
                stats.closed = true;
                closed::mark(self, points, ring, &mut keep, &mut stats);
            }
            None => self.mark_open(points, &mut keep, &mut stats),
        }

        let simplified = Simplified::from_mask(&keep);
        log::trace!(
            "simplified {} -> {} points ({} splits)",
            points.len(),
            simplified.len(),
            stats.splits,
        );
        (simplified, stats)
    }

    /// Mark the points an open curve retains.
    ///
    /// Sets both endpoints of `keep`; interior flags are only ever set,
    /// never cleared. `keep` must be as long as `points`.
    pub(crate) fn mark_open<const D: usize>(
        self,
        points: &[Point<D>],
        keep: &mut [bool],
        stats: &mut SimplifyStats,
    ) {
        debug_assert_eq!(points.len(), keep.len(), "mask must cover every point");
        let n = keep.len().min(points.len());
        if n == 0 {
            return;
        }
        keep[0] = true;
        keep[n - 1] = true;
        if n > 2 {
            let root = Span {
                points: &points[..n],
                interior: &mut keep[1..n - 1],
            };
            stats.absorb(&self.drain(root));
        }
    }

    /// Process `root` and everything split off it.
    fn drain<const D: usize>(self, root: Span<'_, D>) -> SimplifyStats {
        let mut stats = SimplifyStats::default();
        let mut pending = vec![root];
        stats.max_pending = 1;

        while let Some(span) = pending.pop() {
            stats.ranges_processed += 1;
            let Some((left, right)) = self.split(span, &mut stats) else {
                continue;
            };

            if left.points.len() >= self.fork_at && right.points.len() >= self.fork_at {
                let (l, r) = parallel::join(move || self.drain(left), move || self.drain(right));
                stats.absorb(&l);
                stats.absorb(&r);
                continue;
            }

            // Left on top, so ranges are finished in index order.
            pending.push(right);
            pending.push(left);
            stats.max_pending = stats.max_pending.max(pending.len());
        }

        stats
    }

    /// Split `span` at its farthest interior point, or return `None` when
    /// every interior point is within tolerance (and so dropped).
    fn split<'a, const D: usize>(
        self,
        span: Span<'a, D>,
        stats: &mut SimplifyStats,
    ) -> Option<(Span<'a, D>, Span<'a, D>)> {
        let Span { points, interior } = span;
        if points.len() < 3 {
            return None;
        }
        stats.distance_evaluations += points.len() - 2;

        let (index, deviation) = geometry::farthest_from_chord(points)?;
        if deviation <= self.tolerance {
            return None;
        }

        // `index` is in 1..len-1, so interior[index - 1] is its flag.
        let (left, rest) = interior.split_at_mut(index - 1);
        let (pivot, right) = rest.split_first_mut()?;
        *pivot = true;
        stats.splits += 1;

        Some((
            Span {
                points: &points[..=index],
                interior: left,
            },
            Span {
                points: &points[index..],
                interior: right,
            },
        ))
    }
}

/// A contiguous range of the curve awaiting a split decision.
///
/// `interior` covers `points[1..len - 1]`; the two endpoints are anchors
/// that are already kept.
struct Span<'a, const D: usize> {
    points: &'a [Point<D>],
    interior: &'a mut [bool],
}
