use crate::model::curve::Point;
use log::info;
use std::f64::consts::PI;

/// Easing curve used to fill the space between two anchors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Kernel {
    Linear,
    #[default]
    CosineEaseInOut,
    CosineEaseIn,
    CosineEaseOut,
}

impl Kernel {
    /// Maps a foreign interpolation mode name onto a kernel. Cubic has no kernel of its own and
    /// shares the cosine one, as does anything unrecognised.
    pub fn from_mode(mode: &str) -> Self {
        match mode.to_lowercase().as_str() {
            "linear" => Kernel::Linear,
            "cosine" | "cubic" => Kernel::CosineEaseInOut,
            "ease-in" | "cosine-ease-in" => Kernel::CosineEaseIn,
            "ease-out" | "cosine-ease-out" => Kernel::CosineEaseOut,
            other => {
                info!("Unknown interpolation mode '{}', defaulting to `cosine`..!", other);
                Kernel::CosineEaseInOut
            }
        }
    }

    /// Value at `x` on the curve running from `start` to `end`.
    pub fn sample(self, start: Point, end: Point, x: i64) -> f64 {
        let (x0, y0) = (start.tick as f64, start.value);
        let (x1, y1) = (end.tick as f64, end.value);
        let x = x as f64;
        let dx = x1 - x0;

        match self {
            Kernel::Linear => y0 + (x - x0) * (y1 - y0) / dx,
            Kernel::CosineEaseInOut => {
                let amp = (y0 - y1) / 2.0;
                let offset = (y0 + y1) / 2.0;
                amp * (PI / dx * (x - x0)).cos() + offset
            }
            Kernel::CosineEaseIn => (y0 - y1) * (PI / dx / 2.0 * (x - x0)).cos() + y1,
            Kernel::CosineEaseOut => (y0 - y1) * (PI / dx / 2.0 * (x - x0) + PI / 2.0).cos() + y0,
        }
    }
}

/// Ticks strictly between `x0` and `x1` that sit on the sampling grid anchored at `x0`.
fn grid_between(x0: i64, x1: i64, interval: i64) -> impl Iterator<Item = i64> {
    let interval = interval.max(1);
    (x0 + 1..x1).filter(move |x| (x - x0) % interval == 0)
}

/// Fills every gap between consecutive anchors with points on the sampling grid. Anchors are kept
/// exactly as given.
pub fn interpolate(points: &[Point], interval: i64, kernel: Kernel) -> Vec<Point> {
    let Some(last) = points.last() else {
        return Vec::new();
    };

    let mut result = Vec::with_capacity(points.len());
    for pair in points.windows(2) {
        let (start, end) = (pair[0], pair[1]);

        result.push(start);
        result.extend(grid_between(start.tick, end.tick, interval).map(|x| Point::new(x, kernel.sample(start, end, x))));
    }
    result.push(*last);

    result
}

/// Inserts one hold point before each anchor that is at least `interval` after its predecessor,
/// so that renderers which interpolate between points keep the previous value until just before
/// the next one.
pub fn append_hold_points(points: &[Point], interval: i64) -> Vec<Point> {
    let Some(first) = points.first() else {
        return Vec::new();
    };

    let mut result = vec![*first];
    for pair in points.windows(2) {
        let (last, current) = (pair[0], pair[1]);
        let diff = current.tick - last.tick;

        if diff >= interval {
            let tick = if diff < 2 * interval {
                (current.tick + last.tick) / 2
            } else {
                current.tick - interval
            };
            result.push(Point::new(tick, last.value));
        }
        result.push(current);
    }

    result
}

#[cfg(test)]
mod test {
    use super::*;
    use float_cmp::approx_eq;

    fn anchors() -> Vec<Point> {
        vec![Point::new(0, 0.0), Point::new(16, 4.0), Point::new(18, -1.0)]
    }

    #[test]
    fn anchors_are_preserved() {
        for kernel in [
            Kernel::Linear,
            Kernel::CosineEaseInOut,
            Kernel::CosineEaseIn,
            Kernel::CosineEaseOut,
        ] {
            let out = interpolate(&anchors(), 4, kernel);
            for anchor in anchors() {
                assert!(out.contains(&anchor), "{:?} lost anchor {:?}", kernel, anchor);
            }
        }
    }

    #[test]
    fn linear_fills_grid() {
        let out = interpolate(&anchors(), 4, Kernel::Linear);
        let ticks: Vec<i64> = out.iter().map(|p| p.tick).collect();

        assert_eq!(ticks, vec![0, 4, 8, 12, 16, 18]);
        assert!(approx_eq!(f64, out[2].value, 2.0, epsilon = 1e-12));
    }

    #[test]
    fn cosine_midpoint_is_mean() {
        let out = interpolate(&[Point::new(0, 1.0), Point::new(40, 3.0)], 4, Kernel::CosineEaseInOut);
        let mid = out.iter().find(|p| p.tick == 20).unwrap();

        assert!(approx_eq!(f64, mid.value, 2.0, epsilon = 1e-12));
    }

    #[test]
    fn ease_in_and_out_are_monotonic() {
        let pair = [Point::new(0, 0.0), Point::new(100, 1.0)];

        for kernel in [Kernel::CosineEaseIn, Kernel::CosineEaseOut] {
            let out = interpolate(&pair, 4, kernel);
            assert!(out.windows(2).all(|w| w[1].value >= w[0].value - 1e-12), "{:?}", kernel);
        }
    }

    #[test]
    fn ease_in_and_out_quarter_point() {
        let (start, end) = (Point::new(0, 0.0), Point::new(100, 1.0));

        // A quarter of the way along, both kernels sit an eighth of a turn into their quarter-cosine.
        let ease_in = Kernel::CosineEaseIn.sample(start, end, 25);
        let ease_out = Kernel::CosineEaseOut.sample(start, end, 25);

        assert!(approx_eq!(f64, ease_in, 1.0 - (PI / 8.0).cos(), epsilon = 1e-12));
        assert!(approx_eq!(f64, ease_out, (PI / 8.0).sin(), epsilon = 1e-12));
        assert!(ease_in < 0.25 && ease_out > 0.25);
    }

    #[test]
    fn single_and_empty_inputs() {
        assert!(interpolate(&[], 4, Kernel::Linear).is_empty());
        assert_eq!(interpolate(&[Point::new(3, 1.0)], 4, Kernel::Linear), vec![Point::new(3, 1.0)]);
    }

    #[test]
    fn mode_names() {
        assert_eq!(Kernel::from_mode("linear"), Kernel::Linear);
        assert_eq!(Kernel::from_mode("cubic"), Kernel::CosineEaseInOut);
        assert_eq!(Kernel::from_mode("Cosine"), Kernel::CosineEaseInOut);
        assert_eq!(Kernel::from_mode("whatever"), Kernel::CosineEaseInOut);
    }

    #[test]
    fn hold_points_before_long_jumps() {
        let points = [Point::new(0, 1.0), Point::new(2, 2.0), Point::new(8, 3.0), Point::new(100, 0.0)];
        let out = append_hold_points(&points, 4);

        assert_eq!(
            out,
            vec![
                Point::new(0, 1.0),
                Point::new(2, 2.0),
                Point::new(5, 2.0),
                Point::new(8, 3.0),
                Point::new(96, 3.0),
                Point::new(100, 0.0),
            ]
        );
    }
}
