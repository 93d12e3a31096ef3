use crate::model::song::{DEFAULT_BPM, TICKS_IN_BEAT, Tempo};

pub fn bpm_to_sec_per_tick(bpm: f64) -> f64 {
    60.0 / TICKS_IN_BEAT as f64 / bpm
}

/// Converts between ticks and seconds over a tempo map. [`DEFAULT_BPM`] applies until the first
/// tempo entry.
#[derive(Debug, Clone)]
pub struct TickTimeTransformer {
    tempos: Vec<Tempo>,
}

impl TickTimeTransformer {
    pub fn new(tempos: &[Tempo]) -> Self {
        let mut tempos = tempos.to_vec();
        tempos.sort_by_key(|t| t.tick_position);

        Self { tempos }
    }

    pub fn tick_to_sec(&self, tick: i64) -> f64 {
        let mut accumulated_sec = 0.0;
        let mut last_tick = 0;
        let mut last_bpm = DEFAULT_BPM;

        for tempo in self.tempos.iter() {
            if tempo.tick_position > tick {
                break;
            }

            accumulated_sec += (tempo.tick_position - last_tick) as f64 * bpm_to_sec_per_tick(last_bpm);
            last_tick = tempo.tick_position;
            last_bpm = tempo.bpm;
        }

        accumulated_sec + (tick - last_tick) as f64 * bpm_to_sec_per_tick(last_bpm)
    }

    /// Inverse of [`Self::tick_to_sec`], truncated toward zero.
    pub fn sec_to_tick(&self, sec: f64) -> i64 {
        let mut remaining_sec = sec;
        let mut accumulated_tick = 0;
        let mut last_tick = 0;
        let mut last_bpm = DEFAULT_BPM;

        for tempo in self.tempos.iter() {
            let max_sec_in_segment = (tempo.tick_position - last_tick) as f64 * bpm_to_sec_per_tick(last_bpm);

            if remaining_sec <= max_sec_in_segment {
                return accumulated_tick + (remaining_sec / bpm_to_sec_per_tick(last_bpm)) as i64;
            }

            accumulated_tick += tempo.tick_position - last_tick;
            remaining_sec -= max_sec_in_segment;
            last_tick = tempo.tick_position;
            last_bpm = tempo.bpm;
        }

        accumulated_tick + (remaining_sec / bpm_to_sec_per_tick(last_bpm)) as i64
    }

    /// Seconds per tick of the tempo in effect at `tick`.
    pub fn sec_per_tick_at(&self, tick: i64) -> f64 {
        let bpm = self
            .tempos
            .iter()
            .take_while(|t| t.tick_position <= tick)
            .last()
            .map(|t| t.bpm)
            .unwrap_or(DEFAULT_BPM);

        bpm_to_sec_per_tick(bpm)
    }
}
