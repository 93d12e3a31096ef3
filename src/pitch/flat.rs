use crate::model::curve::Point;
use crate::pitch::interpolation::append_hold_points;
use crate::pitch::reduce::collapse_runs;
use crate::pitch::{Encoder, SAMPLING_INTERVAL_TICK};
use serde::{Serialize, Serializer};

/// Sub-tick units per tick in the flat format.
pub const TICK_SCALE: i64 = 1_470_000;
/// Flat format values are hundredths of a semitone.
pub const VALUE_SCALE: f64 = 100.0;

/// Absolute-time point list, serialized as `[tick, value, tick, value, ...]`.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct FlatCurve {
    #[serde(rename = "pitchDelta", serialize_with = "serialize_interleaved")]
    pub points: Vec<Point>,
}

impl FlatCurve {
    pub fn interleaved(&self) -> Vec<f64> {
        self.points
            .iter()
            .flat_map(|p| [p.tick as f64, p.value])
            .collect()
    }
}

fn serialize_interleaved<S: Serializer>(points: &[Point], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(points.iter().flat_map(|p| [p.tick as f64, p.value]))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FlatEncoder;

impl Encoder for FlatEncoder {
    type Output = FlatCurve;

    fn border_radius(&self) -> i64 {
        0
    }

    fn finish(&self, points: Vec<Point>) -> Option<FlatCurve> {
        let held = collapse_runs(&append_hold_points(&points, SAMPLING_INTERVAL_TICK));

        Some(FlatCurve {
            points: held
                .into_iter()
                .map(|p| Point::new(p.tick * TICK_SCALE, p.value * VALUE_SCALE))
                .collect(),
        })
    }
}
