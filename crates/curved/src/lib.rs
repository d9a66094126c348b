//! curved: Pure Ramer-Douglas-Peucker curve simplification (sans-IO).
//!
//! Reduces the number of points in a polyline while keeping every removed
//! point within a tolerance of the simplified curve:
//! validate -> classify (open or ring) -> split on the farthest point ->
//! collect retained indices.
//!
//! This crate has **no I/O dependencies**. It works on in-memory points
//! and returns the indices of the points to keep, so the caller decides
//! how to materialize the result. Results are deterministic: the same
//! input and tolerance always produce the same indices, with or without
//! the `parallel` feature.
//!
//! ```
//! use curved::{Polyline, simplify};
//!
//! let line: Polyline<2> = vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0)].into();
//! let result = simplify(&line, 0.0)?;
//! assert_eq!(result.indices(), &[0, 3]);
//! # Ok::<(), curved::SimplifyError>(())
//! ```

pub mod boundary;
pub mod closed;
pub mod diagnostics;
pub mod geometry;
pub mod parallel;
pub mod simplify;
pub mod types;

pub use boundary::{simplify_rows, simplify_rows_mask};
pub use diagnostics::{
    Clock, SimplifyDiagnostics, SimplifyMetrics, SimplifyStats, SystemClock,
    simplify_with_diagnostics,
};
pub use simplify::{simplify, simplify_many, simplify_mask, simplify_with_config};
pub use types::{
    ClosureMode, Point, Point2, Point3, Polyline, Simplified, SimplifyConfig, SimplifyError,
    Tolerance,
};
