//! Simplification diagnostics: timing, counts, and work metrics.
//!
//! These diagnostics are permanent instrumentation intended for tuning
//! tolerances and judging how much work a curve costs. The engine always
//! collects [`SimplifyStats`] (a handful of counters);
//! [`simplify_with_diagnostics`] adds timing and before/after metrics.
//!
//! Timing goes through the [`Clock`] trait so callers pick the time
//! source. [`SystemClock`] uses the `web-time` crate, which maps to
//! `performance.now()` on WASM and `std::time::Instant` on native.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::simplify::simplify_points;
use crate::types::{Polyline, Simplified, SimplifyConfig, SimplifyError};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// A monotonic time source.
pub trait Clock {
    /// Opaque timestamp type.
    type Instant;

    /// Capture the current time.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// [`Clock`] backed by [`web_time::Instant`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    type Instant = web_time::Instant;

    fn now(&self) -> web_time::Instant {
        web_time::Instant::now()
    }

    fn elapsed(&self, since: &web_time::Instant) -> Duration {
        since.elapsed()
    }
}

/// Work counters collected by the engine on every call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimplifyStats {
    /// Point-to-chord distances computed.
    pub distance_evaluations: usize,
    /// Ranges split at a retained point.
    pub splits: usize,
    /// Ranges popped off the work stack (including trivial ones).
    pub ranges_processed: usize,
    /// Peak size of any single work stack.
    pub max_pending: usize,
    /// Whether the curve was simplified as a ring.
    pub closed: bool,
    /// Second ring anchor, when the curve was a non-degenerate ring.
    pub anchor: Option<usize>,
}

impl SimplifyStats {
    /// Fold in the counters of an independently processed range.
    pub(crate) fn absorb(&mut self, other: &Self) {
        self.distance_evaluations += other.distance_evaluations;
        self.splits += other.splits;
        self.ranges_processed += other.ranges_processed;
        self.max_pending = self.max_pending.max(other.max_pending);
        self.closed |= other.closed;
        self.anchor = self.anchor.or(other.anchor);
    }
}

/// Before/after metrics for one simplification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimplifyMetrics {
    /// Tolerance in coordinate units.
    pub tolerance: f64,
    /// Coordinates per point.
    pub dimensions: usize,
    /// Points in the input.
    pub points_before: usize,
    /// Points retained.
    pub points_after: usize,
    /// Reduction ratio: `1.0 - (after / before)`.
    pub reduction_ratio: f64,
    /// [`Simplified::fingerprint`] of the result.
    pub fingerprint: u64,
}

/// Diagnostics collected from a single simplification run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimplifyDiagnostics {
    /// Wall-clock duration of the call (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Before/after metrics.
    pub metrics: SimplifyMetrics,
    /// Engine work counters.
    pub stats: SimplifyStats,
}

/// Simplify `polyline`, timing the call with `clock`.
///
/// Validation happens before the clock starts, so invalid input costs
/// nothing and produces no diagnostics.
///
/// # Errors
///
/// Same as [`simplify_with_config`](crate::simplify_with_config).
pub fn simplify_with_diagnostics<const D: usize, C: Clock>(
    polyline: &Polyline<D>,
    config: &SimplifyConfig,
    clock: &C,
) -> Result<(Simplified, SimplifyDiagnostics), SimplifyError> {
    config.validate()?;

    let start = clock.now();
    let (simplified, stats) = simplify_points(polyline.points(), config)?;
    let duration = clock.elapsed(&start);

    let metrics = SimplifyMetrics {
        tolerance: config.tolerance,
        dimensions: D,
        points_before: polyline.len(),
        points_after: simplified.len(),
        reduction_ratio: reduction_ratio(polyline.len(), simplified.len()),
        fingerprint: simplified.fingerprint(),
    };

    Ok((
        simplified,
        SimplifyDiagnostics {
            duration,
            metrics,
            stats,
        },
    ))
}

impl SimplifyDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let m = &self.metrics;
        let s = &self.stats;
        let mut lines = Vec::new();

        lines.push(format!("Simplification Diagnostics\n{}", "=".repeat(60)));
        lines.push(format!(
            "Curve: {} points, {}D, {}",
            m.points_before,
            m.dimensions,
            if s.closed { "closed" } else { "open" },
        ));
        lines.push(format!("Duration: {:.3}ms", duration_ms(self.duration)));
        lines.push(format!(
            "Tolerance: {}  |  {} -> {} pts ({:.1}% reduction)",
            m.tolerance,
            m.points_before,
            m.points_after,
            m.reduction_ratio * 100.0,
        ));
        lines.push(format!(
            "Work: {} distance evals, {} splits, {} ranges, peak stack {}",
            s.distance_evaluations, s.splits, s.ranges_processed, s.max_pending,
        ));
        if let Some(anchor) = s.anchor {
            lines.push(format!("Ring anchors: 0, {anchor}"));
        }
        lines.push(format!("Fingerprint: {:016x}", m.fingerprint));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
#[must_use]
pub fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// `1.0 - after / before`, or `0.0` for an empty input.
#[allow(clippy::cast_precision_loss)]
fn reduction_ratio(before: usize, after: usize) -> f64 {
    if before == 0 {
        0.0
    } else {
        1.0 - after as f64 / before as f64
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::types::Point;

    /// Clock that advances one millisecond per reading.
    struct StepClock(Cell<u64>);

    impl Clock for StepClock {
        type Instant = u64;

        fn now(&self) -> u64 {
            let t = self.0.get();
            self.0.set(t + 1);
            t
        }

        fn elapsed(&self, since: &u64) -> Duration {
            Duration::from_millis(self.0.get() - since)
        }
    }

    fn zigzag() -> Polyline<2> {
        vec![(0.0, 0.0), (1.0, 0.1), (2.0, 0.0), (3.0, 5.0), (4.0, 0.0)].into()
    }

    #[test]
    fn duration_ms_converts_correctly() {
        let ms = duration_ms(Duration::from_millis(1234));
        assert!((ms - 1234.0).abs() < 0.01);
    }

    #[test]
    fn reduction_ratio_handles_empty() {
        assert!((reduction_ratio(0, 0) - 0.0).abs() < f64::EPSILON);
        assert!((reduction_ratio(10, 4) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn diagnostics_capture_metrics() {
        let clock = StepClock(Cell::new(0));
        let (result, diag) =
            simplify_with_diagnostics(&zigzag(), &SimplifyConfig::new(0.5), &clock).unwrap();
        assert_eq!(result.indices(), &[0, 2, 3, 4]);
        assert_eq!(diag.duration, Duration::from_millis(1));
        assert_eq!(diag.metrics.points_before, 5);
        assert_eq!(diag.metrics.points_after, 4);
        assert_eq!(diag.metrics.dimensions, 2);
        assert_eq!(diag.metrics.fingerprint, result.fingerprint());
        assert!(diag.stats.splits >= 1);
    }

    #[test]
    fn invalid_config_produces_no_diagnostics() {
        let clock = StepClock(Cell::new(0));
        let result = simplify_with_diagnostics(&zigzag(), &SimplifyConfig::new(-1.0), &clock);
        assert!(matches!(result, Err(SimplifyError::InvalidTolerance(_))));
        assert_eq!(clock.0.get(), 0, "clock must not start on invalid input");
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock;
        let start = clock.now();
        assert!(clock.elapsed(&start) >= Duration::ZERO);
    }

    #[test]
    fn absorb_sums_counters_and_keeps_peak() {
        let mut a = SimplifyStats {
            distance_evaluations: 10,
            splits: 2,
            ranges_processed: 5,
            max_pending: 3,
            closed: false,
            anchor: None,
        };
        let b = SimplifyStats {
            distance_evaluations: 4,
            splits: 1,
            ranges_processed: 3,
            max_pending: 7,
            closed: true,
            anchor: Some(9),
        };
        a.absorb(&b);
        assert_eq!(a.distance_evaluations, 14);
        assert_eq!(a.splits, 3);
        assert_eq!(a.ranges_processed, 8);
        assert_eq!(a.max_pending, 7);
        assert!(a.closed);
        assert_eq!(a.anchor, Some(9));
    }

    #[test]
    fn report_mentions_ring_anchor() {
        let square: Polyline<2> = Polyline::new(vec![
            Point::xy(0.0, 0.0),
            Point::xy(0.0, 1.0),
            Point::xy(1.0, 1.0),
            Point::xy(1.0, 0.0),
            Point::xy(0.0, 0.0),
        ]);
        let (_, diag) =
            simplify_with_diagnostics(&square, &SimplifyConfig::new(0.01), &SystemClock).unwrap();
        let report = diag.report();
        assert!(report.contains("Simplification Diagnostics"));
        assert!(report.contains("closed"));
        assert!(report.contains("Ring anchors: 0, 2"));
    }

    #[test]
    fn diagnostics_serde_round_trip() {
        let (_, diag) =
            simplify_with_diagnostics(&zigzag(), &SimplifyConfig::new(0.5), &SystemClock).unwrap();
        let json = serde_json::to_string(&diag).unwrap();
        let back: SimplifyDiagnostics = serde_json::from_str(&json).unwrap();
        assert_eq!(back.metrics, diag.metrics);
        assert_eq!(back.stats, diag.stats);
    }
}
