//! Geometry primitives backing the simplification decision.
//!
//! Every function here is pure and works for any dimension `D`. All
//! arithmetic is `f64`.

use crate::types::Point;

/// Default distance under which two points count as coincident.
pub const DEFAULT_EPSILON: f64 = 1e-9;

/// Squared perpendicular distance from `p` to the infinite line through
/// `a` and `b`.
///
/// Uses the Lagrange identity `|v x w|^2 = sum_{i<j} (v_i w_j - v_j w_i)^2`
/// with `v = p - a` and `w = b - a`, divided by `|w|^2`. In 2D this is the
/// familiar `cross(w, v)^2 / |w|^2`.
///
/// When `a` and `b` coincide (zero-length segment), returns the squared
/// distance from `p` to `a`.
#[must_use]
// Mirrored products must round identically so that exactly collinear
// inputs cancel to 0.0; a fused multiply-add would break that.
#[allow(clippy::suboptimal_flops)]
pub fn perpendicular_distance_squared<const D: usize>(
    p: Point<D>,
    a: Point<D>,
    b: Point<D>,
) -> f64 {
    let (p, a, b) = (p.coords(), a.coords(), b.coords());
    let v: [f64; D] = std::array::from_fn(|i| p[i] - a[i]);
    let w: [f64; D] = std::array::from_fn(|i| b[i] - a[i]);

    let length_sq: f64 = w.iter().map(|c| c * c).sum();
    if length_sq == 0.0 {
        // a and b are the same point.
        return v.iter().map(|c| c * c).sum();
    }

    let mut cross_sq = 0.0;
    for (i, (&vi, &wi)) in v.iter().zip(&w).enumerate() {
        for (&vj, &wj) in v[i + 1..].iter().zip(&w[i + 1..]) {
            let c = vi * wj - vj * wi;
            cross_sq += c * c;
        }
    }
    cross_sq / length_sq
}

/// Perpendicular distance from `p` to the infinite line through `a` and
/// `b`.
///
/// Never negative and never NaN for finite inputs. A degenerate segment
/// (`a == b`) falls back to the Euclidean distance from `p` to `a`.
#[must_use]
pub fn perpendicular_distance<const D: usize>(p: Point<D>, a: Point<D>, b: Point<D>) -> f64 {
    perpendicular_distance_squared(p, a, b).sqrt()
}

/// Returns `true` if `a` and `b` are within `epsilon` of each other
/// (Euclidean distance, inclusive).
#[must_use]
pub fn is_near<const D: usize>(a: Point<D>, b: Point<D>, epsilon: f64) -> bool {
    a.distance(b) <= epsilon
}

/// Index and deviation of the interior point farthest from the line
/// through the first and last points of `points`.
///
/// Ties go to the lowest index. Returns `None` when `points` has no
/// interior or every interior deviation is `0.0` (or NaN).
#[must_use]
pub fn farthest_from_chord<const D: usize>(points: &[Point<D>]) -> Option<(usize, f64)> {
    let (&first, &last) = (points.first()?, points.last()?);
    let interior = points.get(1..points.len().saturating_sub(1))?;

    let mut best = None;
    let mut max_dist = 0.0;
    for (offset, &p) in interior.iter().enumerate() {
        let d = perpendicular_distance(p, first, last);
        if d > max_dist {
            max_dist = d;
            best = Some(offset + 1);
        }
    }
    best.map(|i| (i, max_dist))
}

/// Index and distance of the point in `candidates` farthest from
/// `origin`, lowest index on ties. Returns `None` if every candidate
/// coincides exactly with `origin`.
#[must_use]
pub fn farthest_from_point<const D: usize>(
    candidates: &[Point<D>],
    origin: Point<D>,
) -> Option<(usize, f64)> {
    let mut best = None;
    let mut max_dist = 0.0;
    for (i, &p) in candidates.iter().enumerate() {
        let d = p.distance(origin);
        if d > max_dist {
            max_dist = d;
            best = Some(i);
        }
    }
    best.map(|i| (i, max_dist))
}
