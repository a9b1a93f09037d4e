use geo::{Destination as _, Geodesic, Point};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::distance::Distance;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum Direction {
    #[default]
    Clockwise,
    CounterClockwise,
}

/// A circular arc around `center`, bearings in degrees clockwise from true
/// north.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ArcSpec {
    pub center: Point,
    pub radius: Distance,
    pub start_bearing: f64,
    pub end_bearing: f64,
    pub direction: Direction,
}

impl ArcSpec {
    /// Signed angular sweep, positive when clockwise.
    pub fn sweep(&self) -> f64 {
        let diff = (self.end_bearing - self.start_bearing).rem_euclid(360.0);
        match self.direction {
            Direction::Clockwise => diff,
            Direction::CounterClockwise if diff == 0.0 => 0.0,
            Direction::CounterClockwise => diff - 360.0,
        }
    }
}

/// Approximates arcs by geodesic points spaced evenly in bearing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArcRasterizer {
    step: f64,
}

impl Default for ArcRasterizer {
    fn default() -> Self {
        Self {
            step: Self::DEFAULT_STEP,
        }
    }
}

impl ArcRasterizer {
    pub const DEFAULT_STEP: f64 = 5.0;

    pub fn new(step: f64) -> Self {
        if step.is_finite() && step > 0.0 && step <= 90.0 {
            Self { step }
        } else {
            warn!("invalid arc step {step}°, using {}°", Self::DEFAULT_STEP);
            Self::default()
        }
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    fn intervals(&self, sweep: f64) -> usize {
        // the epsilon keeps exact multiples of the step from gaining an interval
        ((sweep.abs() / self.step - 1e-9).ceil() as usize).max(1)
    }

    /// Rasterizes `arc` from its start to its end bearing. Both endpoints are
    /// computed from their bearing, the interior points are evenly spaced.
    pub fn rasterize(&self, arc: &ArcSpec) -> Vec<Point> {
        let radius = arc.radius.metres();
        let destination = |bearing: f64| {
            Geodesic.destination(arc.center, bearing.rem_euclid(360.0), radius)
        };

        let sweep = arc.sweep();
        if sweep.abs() < 1e-9 {
            return vec![destination(arc.end_bearing)];
        }

        let n = self.intervals(sweep);
        (0..=n)
            .map(|i| {
                if i == n {
                    destination(arc.end_bearing)
                } else {
                    destination(arc.start_bearing + sweep * i as f64 / n as f64)
                }
            })
            .collect()
    }

    /// Points of a full circle clockwise from north, without the closing
    /// point.
    pub fn full_circle(&self, center: Point, radius: &Distance) -> Vec<Point> {
        let radius = radius.metres();
        let n = self.intervals(360.0);
        (0..n)
            .map(|i| Geodesic.destination(center, 360.0 * i as f64 / n as f64, radius))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use geo::{point, Destination as _, Distance as _, Geodesic};

    use crate::geometry::{ArcRasterizer, ArcSpec, Direction};
    use crate::{Distance, DistanceUnit};

    fn arc(start: f64, end: f64, direction: Direction) -> ArcSpec {
        ArcSpec {
            center: point! { x: 17.148_333, y: 48.17 },
            radius: Distance::new(3000.0, DistanceUnit::Metre),
            start_bearing: start,
            end_bearing: end,
            direction,
        }
    }

    #[test]
    fn test_sweep() {
        assert!((arc(0.0, 90.0, Direction::Clockwise).sweep() - 90.0).abs() < 1e-9);
        assert!((arc(90.0, 0.0, Direction::Clockwise).sweep() - 270.0).abs() < 1e-9);
        assert!((arc(350.0, 10.0, Direction::Clockwise).sweep() - 20.0).abs() < 1e-9);
        assert!((arc(90.0, 0.0, Direction::CounterClockwise).sweep() + 90.0).abs() < 1e-9);
        assert!((arc(0.0, 90.0, Direction::CounterClockwise).sweep() + 270.0).abs() < 1e-9);
        assert_eq!(arc(45.0, 45.0, Direction::CounterClockwise).sweep(), 0.0);
    }

    #[test]
    fn test_quarter_arc() {
        let spec = arc(0.0, 90.0, Direction::Clockwise);
        let points = ArcRasterizer::default().rasterize(&spec);

        assert_eq!(points.len(), 19);
        assert_eq!(points[0], Geodesic.destination(spec.center, 0.0, 3000.0));
        assert_eq!(points[18], Geodesic.destination(spec.center, 90.0, 3000.0));
        for p in &points {
            assert!((Geodesic.distance(spec.center, *p) - 3000.0).abs() < 1e-3);
        }
        // clockwise from north runs east first
        assert!(points[1].x() > points[0].x());
    }

    #[test]
    fn test_counter_clockwise_and_wrap() {
        let points =
            ArcRasterizer::default().rasterize(&arc(90.0, 0.0, Direction::CounterClockwise));
        assert_eq!(points.len(), 19);

        let points = ArcRasterizer::default().rasterize(&arc(350.0, 10.0, Direction::Clockwise));
        assert_eq!(points.len(), 5);
        let spec = arc(350.0, 10.0, Direction::Clockwise);
        assert_eq!(points[2], Geodesic.destination(spec.center, 0.0, 3000.0));

        // uneven sweeps keep an even spacing
        let points = ArcRasterizer::new(10.0).rasterize(&arc(0.0, 25.0, Direction::Clockwise));
        assert_eq!(points.len(), 4);
    }

    #[test]
    fn test_degenerate() {
        let spec = arc(120.0, 120.0, Direction::Clockwise);
        assert_eq!(
            ArcRasterizer::default().rasterize(&spec),
            vec![Geodesic.destination(spec.center, 120.0, 3000.0)]
        );
    }

    #[test]
    fn test_full_circle() {
        let center = point! { x: 17.0, y: 48.0 };
        let radius = Distance::new(5.0, DistanceUnit::NauticalMile);
        let points = ArcRasterizer::default().full_circle(center, &radius);
        assert_eq!(points.len(), 72);
        for p in &points {
            assert!((Geodesic.distance(center, *p) - 9260.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_invalid_step() {
        assert_eq!(ArcRasterizer::new(0.0).step(), ArcRasterizer::DEFAULT_STEP);
        assert_eq!(ArcRasterizer::new(f64::NAN).step(), ArcRasterizer::DEFAULT_STEP);
        assert_eq!(ArcRasterizer::new(2.5).step(), 2.5);
    }
}
