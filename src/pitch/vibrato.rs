use crate::error::{PitchError, PitchResult};
use crate::model::curve::{Point, merge_points};
use crate::model::song::{Note, Tempo};
use crate::model::vibrato::{Vibrato, VibratoParams};
use crate::pitch::SAMPLING_INTERVAL_TICK;
use crate::pitch::interpolation::{Kernel, interpolate};
use crate::pitch::reduce::collapse_adjacent;
use crate::pitch::time::TickTimeTransformer;
use log::debug;
use std::f64::consts::PI;

/// Time-varying multiplier for vibrato depth, given as sparse anchors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Envelope {
    pub points: Vec<Point>,
    pub kernel: Kernel,
}

impl Envelope {
    /// Same envelope with its anchors sorted and duplicate ticks averaged.
    pub fn normalized(&self) -> Self {
        Self {
            points: merge_points(&self.points),
            kernel: self.kernel,
        }
    }

    /// Envelope value at `tick`, following the kernel between the surrounding anchors. Outside the
    /// anchored range the envelope is neutral (`1.0`). Anchors must be sorted by tick.
    pub fn value_at(&self, tick: i64) -> f64 {
        let at = self.points.partition_point(|p| p.tick < tick);
        let prev = at.checked_sub(1).and_then(|i| self.points.get(i));

        match (prev, self.points.get(at)) {
            (_, Some(next)) if next.tick == tick => next.value,
            (Some(&prev), Some(&next)) => self.kernel.sample(prev, next, tick),
            _ => 1.0,
        }
    }
}

/// Densifies a relative curve and layers per-note vibrato on top of it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shaping {
    pub kernel: Kernel,
    pub defaults: VibratoParams,
    pub envelope: Option<Envelope>,
}

impl Shaping {
    pub fn apply(&self, points: &[Point], notes: &[Note], tempos: &[Tempo]) -> PitchResult<Vec<Point>> {
        let interpolated = interpolate(&merge_points(points), SAMPLING_INTERVAL_TICK, self.kernel);
        let envelope = self.envelope.as_ref().map(Envelope::normalized);
        let with_vibrato = append_vibrato(&interpolated, notes, &self.defaults, tempos, envelope.as_ref())?;

        debug!(
            "Shaped {} pitch points into {} (vibrato applied over {} notes)..!",
            points.len(),
            with_vibrato.len(),
            notes.len()
        );

        Ok(collapse_adjacent(&with_vibrato))
    }
}

/// Splits the timeline into note ranges and the gaps around them, adds vibrato inside every note
/// range and passes gap ranges through untouched. `points` must be sorted by tick.
pub fn append_vibrato(
    points: &[Point],
    notes: &[Note],
    defaults: &VibratoParams,
    tempos: &[Tempo],
    envelope: Option<&Envelope>,
) -> PitchResult<Vec<Point>> {
    let transformer = TickTimeTransformer::new(tempos);

    let mut ranges: Vec<(i64, i64, Option<&Note>)> = Vec::with_capacity(notes.len() * 2 + 1);
    let mut last_end = 0;
    for (index, note) in notes.iter().enumerate() {
        if index > 0 && note.tick_on < last_end {
            return Err(PitchError::OverlappingNotes {
                index: index - 1,
                tick_off: last_end,
                next_tick_on: note.tick_on,
            });
        }

        if last_end < note.tick_on {
            ranges.push((last_end, note.tick_on, None));
        }
        ranges.push((note.tick_on, note.tick_off, Some(note)));
        last_end = note.tick_off;
    }
    ranges.push((last_end, i64::MAX, None));

    let mut result: Vec<Point> = Vec::with_capacity(points.len());
    for (start, end, note) in ranges {
        let from = points.partition_point(|p| p.tick < start);
        let to = points.partition_point(|p| p.tick < end);
        let inside = points[from..to.max(from)].to_vec();

        let shaped = match note {
            Some(note) => vibrato_in_note(inside, note, defaults, &transformer, envelope),
            None => inside,
        };

        for p in shaped {
            // A note's closing anchor may land on a real sample of the next range; the sample wins.
            match result.last_mut() {
                Some(last) if last.tick == p.tick => *last = p,
                _ => result.push(p),
            }
        }
    }

    Ok(result)
}

/// Vibrato resolved against a single note and the tempo map.
#[derive(Debug, Clone, Copy)]
struct NoteVibrato {
    start_sec: f64,
    start_tick: i64,
    end_sec: f64,
    ease_in_sec: f64,
    ease_out_sec: f64,
    half_depth: f64,
    frequency_hz: f64,
    phase_rad: f64,
    sec_per_tick: f64,
}

impl NoteVibrato {
    fn new(note: &Note, defaults: &VibratoParams, transformer: &TickTimeTransformer) -> Self {
        let vibrato = Vibrato::resolve(&note.vibrato, defaults);
        let start_sec = transformer.tick_to_sec(note.tick_on) + vibrato.start_sec;

        Self {
            start_sec,
            start_tick: transformer.sec_to_tick(start_sec),
            end_sec: transformer.tick_to_sec(note.tick_off),
            ease_in_sec: vibrato.ease_in_sec,
            ease_out_sec: vibrato.ease_out_sec,
            half_depth: vibrato.depth_semitone * 0.5,
            frequency_hz: vibrato.frequency_hz,
            phase_rad: vibrato.phase_rad,
            sec_per_tick: transformer.sec_per_tick_at(note.tick_on),
        }
    }

    fn ease(elapsed_sec: f64, length_sec: f64) -> f64 {
        if length_sec <= 0.0 {
            return 1.0;
        }
        (elapsed_sec / length_sec).clamp(0.0, 1.0)
    }

    /// Offset in semitones added at `tick`.
    fn at(&self, tick: i64, transformer: &TickTimeTransformer, envelope: Option<&Envelope>) -> f64 {
        let current_sec = transformer.tick_to_sec(tick);
        if current_sec < self.start_sec {
            return 0.0;
        }

        let ease_in = Self::ease(current_sec - self.start_sec, self.ease_in_sec);
        let ease_out = Self::ease(self.end_sec - current_sec, self.ease_out_sec);
        let phase = 2.0 * PI * self.frequency_hz * (tick - self.start_tick) as f64 * self.sec_per_tick + self.phase_rad;
        let depth = envelope.map_or(1.0, |e| e.value_at(tick));

        depth * self.half_depth * ease_in * ease_out * phase.sin()
    }
}

fn vibrato_in_note(
    points: Vec<Point>,
    note: &Note,
    defaults: &VibratoParams,
    transformer: &TickTimeTransformer,
    envelope: Option<&Envelope>,
) -> Vec<Point> {
    if note.tick_on < 0 {
        return points;
    }

    let vibrato = NoteVibrato::new(note, defaults, transformer);
    if vibrato.half_depth == 0.0 {
        return points;
    }

    let mut base = points;
    match (base.first().copied(), base.last().copied()) {
        (Some(first), Some(last)) => {
            if first.tick > note.tick_on {
                base.insert(0, Point::new(note.tick_on, first.value));
            }
            if last.tick != note.tick_off {
                base.push(Point::new(note.tick_off, last.value));
            }
        }
        _ => {
            base = vec![Point::new(note.tick_on, 0.0), Point::new(note.tick_off, 0.0)];
        }
    }

    let mut result = Vec::with_capacity(note.length().max(0) as usize / SAMPLING_INTERVAL_TICK as usize + base.len());
    for (i, current) in base.iter().enumerate() {
        if i > 0 {
            let last = base[i - 1];
            for tick in (last.tick + 1..current.tick).filter(|t| (t - last.tick) % SAMPLING_INTERVAL_TICK == 0) {
                result.push(Point::new(tick, last.value + vibrato.at(tick, transformer, envelope)));
            }
        }

        result.push(Point::new(
            current.tick,
            current.value + vibrato.at(current.tick, transformer, envelope),
        ));
    }

    result
}
