//! Closed-curve handling: split a ring into two open arcs.
//!
//! On a ring the chord between the first and last point has zero length,
//! so the plain algorithm would measure every point against a single
//! location. Instead the ring is cut at two anchors: the first point, and
//! the point farthest from it (lowest index on ties). Each arc is then
//! simplified as an open curve.
//!
//! The anchor depends only on the input points, never on the tolerance,
//! so results stay monotonic in the tolerance and re-simplifying a result
//! picks the same anchor again.

use crate::diagnostics::SimplifyStats;
use crate::geometry;
use crate::simplify::Engine;
use crate::types::{ClosureMode, Point, SimplifyConfig};

/// How a ring's closing edge is represented in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ring {
    /// The last point repeats the first (within epsilon).
    Repeated,
    /// The caller flagged the curve closed; the edge from the last point
    /// back to the first is implicit.
    Implicit,
}

/// Decide whether `points` should be simplified as a ring.
#[must_use]
pub fn classify<const D: usize>(points: &[Point<D>], config: &SimplifyConfig) -> Option<Ring> {
    let (&first, &last) = (points.first()?, points.last()?);
    if points.len() < 3 {
        return None;
    }
    let repeated = geometry::is_near(first, last, config.epsilon);
    match config.closure {
        ClosureMode::Open => None,
        ClosureMode::Auto => repeated.then_some(Ring::Repeated),
        ClosureMode::Closed if repeated => Some(Ring::Repeated),
        ClosureMode::Closed => Some(Ring::Implicit),
    }
}

/// Mark the points a ring retains.
///
/// Rings of three or fewer points are kept whole. A ring whose anchor
/// candidates all coincide exactly with the first point collapses to its
/// two endpoints; every dropped point then has zero deviation.
pub(crate) fn mark<const D: usize>(
    engine: Engine,
    points: &[Point<D>],
    ring: Ring,
    keep: &mut [bool],
    stats: &mut SimplifyStats,
) {
    let n = points.len().min(keep.len());
    if n <= 3 {
        keep[..n].fill(true);
        return;
    }

    // A repeated closing point is not an anchor candidate: it is the
    // first point again.
    let candidates = match ring {
        Ring::Repeated => &points[1..n - 1],
        Ring::Implicit => &points[1..n],
    };
    let anchor = geometry::farthest_from_point(candidates, points[0])
        .map(|(offset, distance)| (offset + 1, distance));

    let Some((anchor, distance)) = anchor else {
        log::debug!("degenerate ring of {n} points collapsed to its endpoints");
        keep[0] = true;
        keep[n - 1] = true;
        return;
    };
    log::debug!("ring of {n} points ({ring:?}) anchored at 0 and {anchor} ({distance:.6} apart)");
    stats.anchor = Some(anchor);

    engine.mark_open(&points[..=anchor], &mut keep[..=anchor], stats);

    match ring {
        Ring::Repeated => engine.mark_open(&points[anchor..n], &mut keep[anchor..n], stats),
        Ring::Implicit => {
            // The second arc runs anchor..n-1 and then back to point 0.
            let arc: Vec<Point<D>> = points[anchor..n]
                .iter()
                .copied()
                .chain(std::iter::once(points[0]))
                .collect();
            let mut arc_keep = vec![false; arc.len()];
            engine.mark_open(&arc, &mut arc_keep, stats);

            // The final arc slot is point 0 again, already kept.
            for (flag, &kept) in keep[anchor..n].iter_mut().zip(&arc_keep) {
                *flag |= kept;
            }
        }
    }
}
