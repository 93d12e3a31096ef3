use crate::model::curve::Point;
use crate::pitch::Encoder;
use log::debug;
use serde::Serialize;

pub const PITCH_MAX_VALUE: i32 = 8191;
pub const DEFAULT_PITCH_BEND_SENSITIVITY: i32 = 2;
/// A silence at least this long between two samples starts a new section.
pub const MIN_BREAK_LENGTH_BETWEEN_PITCH_SECTIONS: i64 = 480;
pub const BORDER_APPEND_RADIUS: i64 = 5;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerEvent {
    pub pos: i64,
    pub value: i32,
}

impl ControllerEvent {
    pub fn new(pos: i64, value: i32) -> Self {
        Self { pos, value }
    }
}

/// Pitch bend events plus the sensitivity changes they are scaled against.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SectionedCurve {
    pub pitch_bend_sensitivity: Vec<ControllerEvent>,
    pub pitch_bend: Vec<ControllerEvent>,
}

/// Splits points wherever two consecutive samples are at least
/// [`MIN_BREAK_LENGTH_BETWEEN_PITCH_SECTIONS`] apart.
pub fn sections(points: &[Point]) -> Vec<&[Point]> {
    points
        .chunk_by(|a, b| b.tick - a.tick < MIN_BREAK_LENGTH_BETWEEN_PITCH_SECTIONS)
        .collect()
}

/// Sensitivity needed to represent `section` without clipping, or `None` when the default
/// covers it.
pub fn section_sensitivity(section: &[Point]) -> Option<i32> {
    let max_abs = section.iter().map(|p| p.value.abs()).fold(0.0, f64::max);
    let needed = max_abs.ceil() as i32;

    (needed > DEFAULT_PITCH_BEND_SENSITIVITY).then_some(needed)
}

/// Scales a deviation in semitones onto the 14-bit bend range, rounding half up and saturating.
pub fn quantize(deviation: f64, sensitivity: i32) -> i32 {
    let value = (deviation * PITCH_MAX_VALUE as f64 / sensitivity as f64 + 0.5).floor() as i32;
    value.clamp(-PITCH_MAX_VALUE, PITCH_MAX_VALUE)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SectionedEncoder;

impl Encoder for SectionedEncoder {
    type Output = SectionedCurve;

    fn border_radius(&self) -> i64 {
        BORDER_APPEND_RADIUS
    }

    fn finish(&self, points: Vec<Point>) -> Option<SectionedCurve> {
        if points.is_empty() {
            return None;
        }

        let mut curve = SectionedCurve::default();
        let sections = sections(&points);

        for section in sections.iter() {
            let (Some(first), Some(last)) = (section.first(), section.last()) else {
                continue;
            };

            let sensitivity = match section_sensitivity(section) {
                Some(pbs) => {
                    debug!(
                        "Raising bend sensitivity to {} for section {}..{}..!",
                        pbs, first.tick, last.tick
                    );
                    curve
                        .pitch_bend_sensitivity
                        .push(ControllerEvent::new(first.tick, pbs));
                    curve.pitch_bend_sensitivity.push(ControllerEvent::new(
                        last.tick + MIN_BREAK_LENGTH_BETWEEN_PITCH_SECTIONS / 2,
                        DEFAULT_PITCH_BEND_SENSITIVITY,
                    ));
                    pbs
                }
                None => DEFAULT_PITCH_BEND_SENSITIVITY,
            };

            curve.pitch_bend.extend(
                section
                    .iter()
                    .map(|p| ControllerEvent::new(p.tick, quantize(p.value, sensitivity))),
            );
        }

        debug!(
            "Encoded {} pitch bend events over {} sections..!",
            curve.pitch_bend.len(),
            sections.len()
        );

        Some(curve)
    }
}
