//! Shared types for the curved simplification core.

use std::fmt;
use std::hash::Hasher;
use std::ops::Index;

use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeTuple;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use siphasher::sip::SipHasher13;

use crate::geometry;

/// A point with `D` floating-point coordinates.
///
/// Points are plain `Copy` values. Equality via `==` is exact; use
/// [`approx_eq`](Self::approx_eq) for an epsilon comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point<const D: usize>([f64; D]);

/// A point in the plane.
pub type Point2 = Point<2>;

/// A point in space.
pub type Point3 = Point<3>;

impl<const D: usize> Point<D> {
    /// Create a point from its coordinates.
    #[must_use]
    pub const fn new(coords: [f64; D]) -> Self {
        Self(coords)
    }

    /// The coordinates of this point.
    #[must_use]
    pub const fn coords(&self) -> &[f64; D] {
        &self.0
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        self.0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| {
                let d = a - b;
                d * d
            })
            .sum()
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Returns `true` if `other` lies within `epsilon` of this point.
    #[must_use]
    pub fn approx_eq(self, other: Self, epsilon: f64) -> bool {
        geometry::is_near(self, other, epsilon)
    }
}

impl Point<2> {
    /// Create a planar point.
    #[must_use]
    pub const fn xy(x: f64, y: f64) -> Self {
        Self([x, y])
    }
}

impl Point<3> {
    /// Create a spatial point.
    #[must_use]
    pub const fn xyz(x: f64, y: f64, z: f64) -> Self {
        Self([x, y, z])
    }
}

impl<const D: usize> From<[f64; D]> for Point<D> {
    fn from(coords: [f64; D]) -> Self {
        Self(coords)
    }
}

impl From<(f64, f64)> for Point<2> {
    fn from((x, y): (f64, f64)) -> Self {
        Self([x, y])
    }
}

impl From<(f64, f64, f64)> for Point<3> {
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Self([x, y, z])
    }
}

impl<const D: usize> Index<usize> for Point<D> {
    type Output = f64;

    fn index(&self, axis: usize) -> &f64 {
        &self.0[axis]
    }
}

// serde only implements its traits for fixed array sizes, so points are
// (de)serialized by hand as a `D`-tuple (a JSON array of coordinates).
impl<const D: usize> Serialize for Point<D> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(D)?;
        for coord in &self.0 {
            tuple.serialize_element(coord)?;
        }
        tuple.end()
    }
}

struct PointVisitor<const D: usize>;

impl<'de, const D: usize> Visitor<'de> for PointVisitor<D> {
    type Value = Point<D>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "an array of {D} coordinates")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Point<D>, A::Error> {
        let mut coords = [0.0; D];
        for (i, slot) in coords.iter_mut().enumerate() {
            *slot = seq
                .next_element()?
                .ok_or_else(|| de::Error::invalid_length(i, &self))?;
        }
        Ok(Point(coords))
    }
}

impl<'de, const D: usize> Deserialize<'de> for Point<D> {
    fn deserialize<De: Deserializer<'de>>(deserializer: De) -> Result<Self, De::Error> {
        deserializer.deserialize_tuple(D, PointVisitor::<D>)
    }
}

/// An ordered sequence of points forming a piecewise-linear path.
///
/// Order is significant: it is the traversal order of the curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline<const D: usize>(Vec<Point<D>>);

impl<const D: usize> Polyline<D> {
    /// Create a new polyline from a vector of points.
    #[must_use]
    pub const fn new(points: Vec<Point<D>>) -> Self {
        Self(points)
    }

    /// Returns `true` if the polyline has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points in the polyline.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the first point, if any.
    #[must_use]
    pub fn first(&self) -> Option<&Point<D>> {
        self.0.first()
    }

    /// Returns the last point, if any.
    #[must_use]
    pub fn last(&self) -> Option<&Point<D>> {
        self.0.last()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[Point<D>] {
        &self.0
    }

    /// Consumes the polyline and returns the underlying vector of points.
    #[must_use]
    pub fn into_points(self) -> Vec<Point<D>> {
        self.0
    }
}

impl<const D: usize> FromIterator<Point<D>> for Polyline<D> {
    fn from_iter<I: IntoIterator<Item = Point<D>>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const D: usize, P: Into<Point<D>>> From<Vec<P>> for Polyline<D> {
    fn from(points: Vec<P>) -> Self {
        points.into_iter().map(Into::into).collect()
    }
}

/// A validated simplification tolerance.
///
/// Must be non-negative. Zero is valid and only removes points with an
/// exact deviation of `0.0`. Infinity is valid and removes every interior
/// point.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct Tolerance(f64);

impl Tolerance {
    /// A tolerance that only removes exactly collinear points.
    pub const ZERO: Self = Self(0.0);

    /// Validate a raw tolerance.
    ///
    /// # Errors
    ///
    /// Returns [`SimplifyError::InvalidTolerance`] if `value` is negative
    /// or NaN.
    pub fn new(value: f64) -> Result<Self, SimplifyError> {
        if value >= 0.0 {
            Ok(Self(value))
        } else {
            Err(SimplifyError::InvalidTolerance(value))
        }
    }

    /// The raw tolerance value.
    #[must_use]
    pub const fn get(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Tolerance {
    type Error = SimplifyError;

    fn try_from(value: f64) -> Result<Self, SimplifyError> {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for Tolerance {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Self::new(value).map_err(de::Error::custom)
    }
}

/// How the engine decides whether a curve is a closed ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClosureMode {
    /// Closed when the first and last points are within
    /// [`SimplifyConfig::epsilon`] of each other.
    #[default]
    Auto,

    /// Always open, even when the endpoints coincide.
    Open,

    /// Always closed. If the endpoints differ, an implicit closing edge
    /// runs from the last point back to the first.
    Closed,
}

/// Configuration for a simplification call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimplifyConfig {
    /// Maximum perpendicular deviation of a removed point from the
    /// simplified curve. Points exactly at the tolerance are removed.
    pub tolerance: f64,

    /// How closed rings are detected.
    pub closure: ClosureMode,

    /// Distance under which two points count as coincident. Used for
    /// closure detection and degenerate rings.
    pub epsilon: f64,
}

impl SimplifyConfig {
    /// Default tolerance in coordinate units.
    pub const DEFAULT_TOLERANCE: f64 = 1.0;

    /// Default closure detection mode.
    pub const DEFAULT_CLOSURE: ClosureMode = ClosureMode::Auto;

    /// Default coincidence epsilon.
    pub const DEFAULT_EPSILON: f64 = geometry::DEFAULT_EPSILON;

    /// Config with the given tolerance and default closure handling.
    #[must_use]
    pub const fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            closure: Self::DEFAULT_CLOSURE,
            epsilon: Self::DEFAULT_EPSILON,
        }
    }

    /// Replace the closure mode.
    #[must_use]
    pub const fn with_closure(mut self, closure: ClosureMode) -> Self {
        self.closure = closure;
        self
    }

    /// Replace the coincidence epsilon.
    #[must_use]
    pub const fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Check the config, returning the validated tolerance.
    ///
    /// # Errors
    ///
    /// Returns [`SimplifyError::InvalidTolerance`] for a negative or NaN
    /// tolerance, and [`SimplifyError::InvalidConfig`] for a negative or
    /// NaN epsilon.
    pub fn validate(&self) -> Result<Tolerance, SimplifyError> {
        let tolerance = Tolerance::new(self.tolerance)?;
        if self.epsilon.is_nan() || self.epsilon < 0.0 {
            return Err(SimplifyError::InvalidConfig(format!(
                "epsilon must be non-negative, got {}",
                self.epsilon
            )));
        }
        Ok(tolerance)
    }
}

impl Default for SimplifyConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TOLERANCE)
    }
}

/// The points retained by a simplification, as indices into the input.
///
/// Indices are strictly increasing, so the retained points always form
/// an order-preserving subsequence of the input. Coordinates are never
/// recomputed: [`points`](Self::points) copies the original values.
///
/// Deserialization checks that the indices are strictly increasing and
/// within `input_len`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Simplified {
    indices: Vec<usize>,
    input_len: usize,
}

#[derive(Deserialize)]
struct RawSimplified {
    indices: Vec<usize>,
    input_len: usize,
}

impl<'de> Deserialize<'de> for Simplified {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let RawSimplified { indices, input_len } = RawSimplified::deserialize(deserializer)?;
        if let Some(pair) = indices.windows(2).find(|w| w[0] >= w[1]) {
            return Err(de::Error::custom(format!(
                "indices must be strictly increasing, found {} then {}",
                pair[0], pair[1]
            )));
        }
        if let Some(&last) = indices.last()
            && last >= input_len
        {
            return Err(de::Error::custom(format!(
                "index {last} is out of range for an input of {input_len} points"
            )));
        }
        Ok(Self { indices, input_len })
    }
}

impl Simplified {
    /// A result that retains every one of `input_len` points.
    #[must_use]
    pub fn all(input_len: usize) -> Self {
        Self {
            indices: (0..input_len).collect(),
            input_len,
        }
    }

    /// Build a result from a keep-mask over the input.
    #[must_use]
    pub fn from_mask(mask: &[bool]) -> Self {
        let indices = mask
            .iter()
            .enumerate()
            .filter(|&(_, &keep)| keep)
            .map(|(i, _)| i)
            .collect();
        Self {
            indices,
            input_len: mask.len(),
        }
    }

    /// Indices of the retained points, in increasing order.
    #[must_use]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Consumes the result and returns the retained indices.
    #[must_use]
    pub fn into_indices(self) -> Vec<usize> {
        self.indices
    }

    /// Number of retained points.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.indices.len()
    }

    /// Returns `true` if nothing was retained (empty input).
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Number of points in the input that produced this result.
    #[must_use]
    pub const fn input_len(&self) -> usize {
        self.input_len
    }

    /// Number of input points that were dropped.
    #[must_use]
    pub const fn removed_count(&self) -> usize {
        self.input_len - self.indices.len()
    }

    /// Returns `true` if the input point at `index` was retained.
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.indices.binary_search(&index).is_ok()
    }

    /// Keep-mask over the input: `true` for every retained point.
    #[must_use]
    pub fn mask(&self) -> Vec<bool> {
        let mut mask = vec![false; self.input_len];
        for &i in &self.indices {
            mask[i] = true;
        }
        mask
    }

    /// Gather the retained points from the input they were computed on.
    ///
    /// Indices beyond the end of `input` are skipped, so passing a
    /// different curve never panics.
    #[must_use]
    pub fn points<const D: usize>(&self, input: &Polyline<D>) -> Polyline<D> {
        let source = input.points();
        self.indices
            .iter()
            .filter_map(|&i| source.get(i).copied())
            .collect()
    }

    /// Stable 64-bit digest of the retained indices.
    ///
    /// Two results with the same fingerprint retained the same points from
    /// inputs of the same length. Used to check that repeated and parallel
    /// runs agree exactly.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = SipHasher13::new();
        hasher.write_u64(self.input_len as u64);
        for &i in &self.indices {
            hasher.write_u64(i as u64);
        }
        hasher.finish()
    }
}

/// Errors reported by the simplification core.
///
/// Every error is raised during validation, before any geometric work.
/// Degenerate geometry is never an error.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
pub enum SimplifyError {
    /// The tolerance is negative or NaN.
    #[error("tolerance must be non-negative, got {0}")]
    InvalidTolerance(f64),

    /// A point's coordinate count differs from the rest of the curve.
    #[error("point {index} has {found} coordinates, expected {expected}")]
    InconsistentDimensionality {
        /// Arity established by the first point.
        expected: usize,
        /// Arity of the offending point.
        found: usize,
        /// Position of the offending point in the input.
        index: usize,
    },

    /// The points have an arity the dynamic entry point cannot dispatch.
    #[error("points with {arity} coordinates are not supported (expected 2 or 3)")]
    UnsupportedDimensionality {
        /// Coordinate count shared by every input point.
        arity: usize,
    },

    /// A configuration value other than the tolerance is invalid.
    #[error("invalid simplify configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // --- Point tests ---

    #[test]
    fn point_distance() {
        let a = Point::xy(0.0, 0.0);
        let b = Point::xy(3.0, 4.0);
        assert!((a.distance_squared(b) - 25.0).abs() < f64::EPSILON);
        assert!((a.distance(b) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn point_distance_3d() {
        let a = Point::xyz(1.0, 2.0, 3.0);
        let b = Point::xyz(3.0, 5.0, 9.0);
        assert!((a.distance(b) - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn point_approx_eq_uses_epsilon() {
        let a = Point::xy(1.0, 1.0);
        let b = Point::xy(1.0, 1.0 + 1e-12);
        assert_ne!(a, b);
        assert!(a.approx_eq(b, 1e-9));
        assert!(!a.approx_eq(b, 0.0));
    }

    #[test]
    fn point_conversions() {
        assert_eq!(Point::from((1.0, 2.0)), Point::xy(1.0, 2.0));
        assert_eq!(Point::from((1.0, 2.0, 3.0)), Point::xyz(1.0, 2.0, 3.0));
        let p = Point::from([4.0, 5.0, 6.0]);
        assert!((p[2] - 6.0).abs() < f64::EPSILON);
        assert_eq!(p.coords(), &[4.0, 5.0, 6.0]);
    }

    // --- Polyline tests ---

    #[test]
    fn polyline_from_tuples() {
        let pl: Polyline<2> = vec![(0.0, 0.0), (1.0, 1.0)].into();
        assert_eq!(pl.len(), 2);
        assert_eq!(pl.first(), Some(&Point::xy(0.0, 0.0)));
        assert_eq!(pl.last(), Some(&Point::xy(1.0, 1.0)));
    }

    #[test]
    fn polyline_empty() {
        let pl = Polyline::<3>::new(vec![]);
        assert!(pl.is_empty());
        assert!(pl.first().is_none());
    }

    // --- Tolerance tests ---

    #[test]
    fn tolerance_rejects_negative_and_nan() {
        assert_eq!(
            Tolerance::new(-0.5),
            Err(SimplifyError::InvalidTolerance(-0.5))
        );
        assert!(matches!(
            Tolerance::new(f64::NAN),
            Err(SimplifyError::InvalidTolerance(_))
        ));
    }

    #[test]
    fn tolerance_try_from_f64() {
        let t = Tolerance::try_from(0.5).unwrap();
        assert!((t.get() - 0.5).abs() < f64::EPSILON);
        assert_eq!(
            Tolerance::try_from(-1.0),
            Err(SimplifyError::InvalidTolerance(-1.0))
        );
    }

    #[test]
    fn tolerance_accepts_zero_and_infinity() {
        assert_eq!(Tolerance::new(0.0).unwrap(), Tolerance::ZERO);
        assert!(Tolerance::new(f64::INFINITY).unwrap().get().is_infinite());
    }

    // --- Config tests ---

    #[test]
    fn config_defaults() {
        let config = SimplifyConfig::default();
        assert!((config.tolerance - 1.0).abs() < f64::EPSILON);
        assert_eq!(config.closure, ClosureMode::Auto);
        assert!((config.epsilon - 1e-9).abs() < f64::EPSILON);
    }

    #[test]
    fn config_validate_errors() {
        assert!(matches!(
            SimplifyConfig::new(-1.0).validate(),
            Err(SimplifyError::InvalidTolerance(_))
        ));
        assert!(matches!(
            SimplifyConfig::new(1.0).with_epsilon(-1.0).validate(),
            Err(SimplifyError::InvalidConfig(_))
        ));
        assert!(matches!(
            SimplifyConfig::new(1.0).with_epsilon(f64::NAN).validate(),
            Err(SimplifyError::InvalidConfig(_))
        ));
    }

    // --- Simplified tests ---

    #[test]
    fn simplified_mask_round_trip() {
        let mask = [true, false, false, true, true];
        let s = Simplified::from_mask(&mask);
        assert_eq!(s.indices(), &[0, 3, 4]);
        assert_eq!(s.input_len(), 5);
        assert_eq!(s.removed_count(), 2);
        assert_eq!(s.mask(), mask);
        assert!(s.contains(3));
        assert!(!s.contains(1));
    }

    #[test]
    fn simplified_points_copies_originals() {
        let pl: Polyline<2> = vec![(0.0, 0.0), (0.5, 0.1), (1.0, 0.0)].into();
        let s = Simplified::from_mask(&[true, false, true]);
        let out = s.points(&pl);
        assert_eq!(out.points(), &[Point::xy(0.0, 0.0), Point::xy(1.0, 0.0)]);
    }

    #[test]
    fn simplified_points_skips_out_of_range() {
        let pl: Polyline<2> = vec![(0.0, 0.0)].into();
        let s = Simplified::all(3);
        assert_eq!(s.points(&pl).len(), 1);
    }

    #[test]
    fn simplified_into_indices() {
        let s = Simplified::from_mask(&[true, false, true, true]);
        assert_eq!(s.into_indices(), vec![0, 2, 3]);
        assert!(Simplified::all(0).into_indices().is_empty());
    }

    #[test]
    fn fingerprint_distinguishes_results() {
        let a = Simplified::from_mask(&[true, false, true]);
        let b = Simplified::from_mask(&[true, true, true]);
        assert_eq!(a.fingerprint(), a.clone().fingerprint());
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    // --- Error tests ---

    #[test]
    fn error_display() {
        assert_eq!(
            SimplifyError::InvalidTolerance(-2.0).to_string(),
            "tolerance must be non-negative, got -2"
        );
        assert_eq!(
            SimplifyError::InconsistentDimensionality {
                expected: 2,
                found: 3,
                index: 7
            }
            .to_string(),
            "point 7 has 3 coordinates, expected 2"
        );
    }

    // --- Serde tests ---

    #[test]
    fn point_serializes_as_array() {
        let json = serde_json::to_string(&Point::xyz(1.0, 2.5, -3.0)).unwrap();
        assert_eq!(json, "[1.0,2.5,-3.0]");
        let back: Point3 = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Point::xyz(1.0, 2.5, -3.0));
    }

    #[test]
    fn point_rejects_wrong_arity() {
        assert!(serde_json::from_str::<Point3>("[1.0, 2.0]").is_err());
        assert!(serde_json::from_str::<Point2>("[1.0, 2.0, 3.0]").is_err());
    }

    #[test]
    fn config_serde_round_trip() {
        let config = SimplifyConfig::new(0.25).with_closure(ClosureMode::Closed);
        let json = serde_json::to_string(&config).unwrap();
        let back: SimplifyConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn tolerance_deserialize_validates() {
        assert!(serde_json::from_str::<Tolerance>("-1.0").is_err());
        let t: Tolerance = serde_json::from_str("0.5").unwrap();
        assert!((t.get() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn simplified_serde_round_trip() {
        let s = Simplified::from_mask(&[true, false, true, false, true]);
        let json = serde_json::to_string(&s).unwrap();
        let back: Simplified = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
        assert_eq!(back.mask(), s.mask());
    }

    #[test]
    fn simplified_deserialize_rejects_out_of_range_index() {
        let err = serde_json::from_str::<Simplified>(r#"{"indices":[0,5],"input_len":3}"#)
            .unwrap_err();
        assert!(err.to_string().contains("out of range"), "{err}");
        assert!(
            serde_json::from_str::<Simplified>(r#"{"indices":[0],"input_len":0}"#).is_err()
        );
    }

    #[test]
    fn simplified_deserialize_rejects_unordered_indices() {
        for json in [
            r#"{"indices":[0,2,1],"input_len":3}"#,
            r#"{"indices":[0,1,1],"input_len":3}"#,
        ] {
            let err = serde_json::from_str::<Simplified>(json).unwrap_err();
            assert!(err.to_string().contains("strictly increasing"), "{err}");
        }
    }

    #[test]
    fn simplified_deserialize_accepts_empty() {
        let s: Simplified = serde_json::from_str(r#"{"indices":[],"input_len":0}"#).unwrap();
        assert_eq!(s, Simplified::all(0));
        assert_eq!(s.removed_count(), 0);
    }

    #[test]
    fn error_serde_round_trip() {
        let err = SimplifyError::UnsupportedDimensionality { arity: 4 };
        let json = serde_json::to_string(&err).unwrap();
        let back: SimplifyError = serde_json::from_str(&json).unwrap();
        assert_eq!(err, back);
    }
}
