use crate::error::{PitchError, PitchResult};
use crate::model::curve::{PitchCurve, PitchPoint, Point, Sample};
use crate::model::song::Note;
use log::debug;

/// Ticks where the active note changes. Touching notes share their boundary tick; notes with a
/// gap between them switch over halfway through the gap.
pub fn borders(notes: &[Note]) -> PitchResult<Vec<i64>> {
    notes
        .windows(2)
        .enumerate()
        .map(|(index, pair)| {
            let (last, next) = (&pair[0], &pair[1]);

            if last.tick_off == next.tick_on {
                Ok(last.tick_off)
            } else if last.tick_off < next.tick_on {
                Ok((next.tick_on + last.tick_off) / 2)
            } else {
                Err(PitchError::OverlappingNotes {
                    index,
                    tick_off: last.tick_off,
                    next_tick_on: next.tick_on,
                })
            }
        })
        .collect()
}

/// Position of a forward scan through the notes.
#[derive(Debug, Clone, Copy)]
struct ActiveNote {
    index: usize,
    key: f64,
}

impl ActiveNote {
    fn first(notes: &[Note]) -> Self {
        Self {
            index: 0,
            key: notes[0].key as f64,
        }
    }

    fn advance(mut self, tick: i64, borders: &[i64], notes: &[Note]) -> Self {
        while borders.get(self.index).is_some_and(|&border| tick >= border) {
            self.index += 1;
            self.key = notes[self.index].key as f64;
        }

        self
    }
}

/// Rebuilds `curve` in the requested representation. Returns `Ok(None)` when a conversion is
/// needed but there are no notes to measure against.
///
/// Converting to absolute treats a deviation of exactly `0.0` as "nothing recorded" and emits a
/// gap for it, while converting to relative keeps every value. When converting to relative with a
/// non-zero `border_append_radius`, points are also inserted at close note borders.
pub fn convert_relativity(
    curve: &PitchCurve,
    notes: &[Note],
    to_absolute: bool,
    border_append_radius: i64,
) -> PitchResult<Option<PitchCurve>> {
    if curve.is_absolute() == to_absolute {
        return Ok(Some(curve.clone()));
    }

    if notes.is_empty() {
        debug!("No notes to convert pitch relativity against..!");
        return Ok(None);
    }

    let borders = borders(notes)?;
    let start = (ActiveNote::first(notes), Vec::with_capacity(curve.len()));

    let (_, converted) = curve.points().iter().fold(start, |(active, mut out), p| {
        let active = active.advance(p.tick, &borders, notes);

        let sample = match p.sample {
            Sample::Gap => Sample::Gap,
            Sample::Value(v) if to_absolute => {
                if v == 0.0 {
                    Sample::Gap
                } else {
                    Sample::Value(v + active.key)
                }
            }
            Sample::Value(v) => Sample::Value(v - active.key),
        };

        out.push(PitchPoint { tick: p.tick, sample });
        (active, out)
    });

    let converted = if to_absolute {
        converted
    } else {
        append_points_at_borders(converted, notes, border_append_radius)
    };

    Ok(Some(PitchCurve::from_sorted(converted, to_absolute)))
}

pub fn absolute_data(curve: &PitchCurve, notes: &[Note]) -> PitchResult<Option<PitchCurve>> {
    convert_relativity(curve, notes, true, 0)
}

/// Relative deviation of every recorded sample, gaps dropped.
pub fn relative_data(curve: &PitchCurve, notes: &[Note], border_append_radius: i64) -> PitchResult<Option<Vec<Point>>> {
    Ok(convert_relativity(curve, notes, false, border_append_radius)?.map(|c| c.values()))
}

/// For each pair of notes no more than `radius` ticks apart, moves the pitch transition in front
/// of the second note: the first sample found within `radius` after its start is copied to
/// `tick_on - radius`, and everything between that tick and the note start is dropped.
fn append_points_at_borders(mut data: Vec<PitchPoint>, notes: &[Note], radius: i64) -> Vec<PitchPoint> {
    if radius <= 0 {
        return data;
    }

    for pair in notes.windows(2) {
        let (last, this) = (&pair[0], &pair[1]);

        if this.tick_on - last.tick_off > radius {
            continue;
        }

        let at = data.partition_point(|p| p.tick < this.tick_on);
        let Some(first) = data.get(at).copied() else {
            continue;
        };

        if first.tick == this.tick_on || first.tick - this.tick_on > radius {
            continue;
        }

        let border_point = PitchPoint {
            tick: this.tick_on - radius,
            sample: first.sample,
        };

        let from = data.partition_point(|p| p.tick < border_point.tick);
        data.splice(from..at, [border_point]);
    }

    data
}

#[cfg(test)]
mod test {
    use super::*;

    fn two_notes() -> Vec<Note> {
        vec![Note::new(60, 0, 480, "a"), Note::new(64, 480, 960, "i")]
    }

    #[test]
    fn borders_shared_and_midpoint() {
        let notes = vec![
            Note::new(60, 0, 480, "a"),
            Note::new(62, 480, 960, "i"),
            Note::new(64, 1000, 1200, "u"),
        ];

        assert_eq!(borders(&notes).unwrap(), vec![480, 980]);
    }

    #[test]
    fn overlapping_notes_fail() {
        let notes = vec![Note::new(60, 0, 500, "a"), Note::new(62, 480, 960, "i")];

        assert_eq!(
            borders(&notes),
            Err(PitchError::OverlappingNotes {
                index: 0,
                tick_off: 500,
                next_tick_on: 480
            })
        );

        let curve = PitchCurve::from_values([(0, 60.0)], true);
        assert!(convert_relativity(&curve, &notes, false, 0).is_err());
    }

    #[test]
    fn absolute_to_relative_switches_key_at_border() {
        let curve = PitchCurve::from_values([(0, 60.0), (480, 62.0), (960, 64.0)], true);
        let relative = relative_data(&curve, &two_notes(), 0).unwrap().unwrap();

        assert_eq!(
            relative,
            vec![Point::new(0, 0.0), Point::new(480, -2.0), Point::new(960, 0.0)]
        );
    }

    #[test]
    fn matching_representation_is_copied() {
        let curve = PitchCurve::from_values([(0, 1.0)], false);

        assert_eq!(convert_relativity(&curve, &[], false, 5).unwrap(), Some(curve.clone()));
    }

    #[test]
    fn no_notes_means_no_curve() {
        let curve = PitchCurve::from_values([(0, 1.0)], false);

        assert_eq!(absolute_data(&curve, &[]).unwrap(), None);
    }

    #[test]
    fn zero_deviation_becomes_gap_when_absolute() {
        let curve = PitchCurve::from_values([(0, 0.0), (100, 1.5), (600, -1.0)], false);
        let absolute = absolute_data(&curve, &two_notes()).unwrap().unwrap();

        assert!(absolute.is_absolute());
        assert_eq!(
            absolute.points(),
            &[PitchPoint::gap(0), PitchPoint::new(100, 61.5), PitchPoint::new(600, 63.0)]
        );
    }

    #[test]
    fn relative_absolute_round_trip() {
        let notes = vec![
            Note::new(60, 0, 480, "a"),
            Note::new(67, 600, 960, "i"),
            Note::new(55, 960, 1440, "u"),
        ];
        let curve = PitchCurve::from_values(
            [(0, 60.5), (240, 61.0), (539, 59.0), (540, 66.0), (960, 54.25), (1400, 56.0)],
            true,
        );

        let relative = convert_relativity(&curve, &notes, false, 0).unwrap().unwrap();
        let back = absolute_data(&relative, &notes).unwrap().unwrap();

        assert_eq!(back, curve);
    }

    #[test]
    fn border_point_moves_transition_forward() {
        let notes = vec![Note::new(60, 0, 480, "a"), Note::new(62, 482, 960, "i")];
        let curve = PitchCurve::from_values(
            [(470, 0.5), (478, 0.25), (480, 0.0), (484, 1.0), (500, 1.5)],
            false,
        );

        // Already relative, so force an absolute round first.
        let absolute = absolute_data(&curve, &notes).unwrap().unwrap();
        let relative = relative_data(&absolute, &notes, 5).unwrap().unwrap();

        assert_eq!(
            relative,
            vec![
                Point::new(470, 0.5),
                Point::new(477, 1.0),
                Point::new(484, 1.0),
                Point::new(500, 1.5),
            ]
        );
    }

    #[test]
    fn border_points_at_every_close_pair() {
        let notes = vec![
            Note::new(60, 0, 480, "a"),
            Note::new(62, 482, 960, "i"),
            Note::new(64, 963, 1440, "u"),
        ];
        let curve = PitchCurve::from_values(
            [(470, 60.0), (478, 60.0), (484, 63.0), (950, 62.0), (966, 65.0)],
            true,
        );

        let relative = relative_data(&curve, &notes, 5).unwrap().unwrap();

        assert_eq!(
            relative,
            vec![
                Point::new(470, 0.0),
                Point::new(477, 1.0),
                Point::new(484, 1.0),
                Point::new(950, 0.0),
                Point::new(958, 1.0),
                Point::new(966, 1.0),
            ]
        );
    }

    #[test]
    fn zero_radius_inserts_nothing() {
        let notes = vec![Note::new(60, 0, 480, "a"), Note::new(62, 482, 960, "i")];
        let curve = PitchCurve::from_values([(478, 60.0), (484, 63.0)], true);

        let relative = relative_data(&curve, &notes, 0).unwrap().unwrap();
        assert_eq!(relative, vec![Point::new(478, 0.0), Point::new(484, 1.0)]);
    }
}
