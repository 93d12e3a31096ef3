use serde::{Deserialize, Serialize};

pub const DEFAULT_VIBRATO_START_SEC: f64 = 0.25;
pub const DEFAULT_VIBRATO_EASE_IN_SEC: f64 = 0.2;
pub const DEFAULT_VIBRATO_EASE_OUT_SEC: f64 = 0.2;
pub const DEFAULT_VIBRATO_DEPTH_SEMITONE: f64 = 1.0;
pub const DEFAULT_VIBRATO_FREQUENCY_HZ: f64 = 5.5;
pub const DEFAULT_VIBRATO_PHASE_RAD: f64 = 0.0;

/// Optional vibrato settings. Used both for per-note overrides and for the global default set;
/// anything left empty falls through to the next level.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct VibratoParams {
    /// Seconds after the note start.
    pub vibrato_start: Option<f64>,
    pub ease_in_length: Option<f64>,
    pub ease_out_length: Option<f64>,
    /// Peak-to-peak depth in semitones.
    pub depth: Option<f64>,
    pub frequency: Option<f64>,
    pub phase: Option<f64>,
}

/// Fully resolved vibrato settings for a single note.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vibrato {
    pub start_sec: f64,
    pub ease_in_sec: f64,
    pub ease_out_sec: f64,
    pub depth_semitone: f64,
    pub frequency_hz: f64,
    pub phase_rad: f64,
}

impl Default for Vibrato {
    fn default() -> Self {
        Self {
            start_sec: DEFAULT_VIBRATO_START_SEC,
            ease_in_sec: DEFAULT_VIBRATO_EASE_IN_SEC,
            ease_out_sec: DEFAULT_VIBRATO_EASE_OUT_SEC,
            depth_semitone: DEFAULT_VIBRATO_DEPTH_SEMITONE,
            frequency_hz: DEFAULT_VIBRATO_FREQUENCY_HZ,
            phase_rad: DEFAULT_VIBRATO_PHASE_RAD,
        }
    }
}

pub fn resolve_parameter(note: Option<f64>, global: Option<f64>, fallback: f64) -> f64 {
    note.or(global).unwrap_or(fallback)
}

impl Vibrato {
    pub fn resolve(note: &VibratoParams, global: &VibratoParams) -> Self {
        let fallback = Vibrato::default();

        Self {
            start_sec: resolve_parameter(note.vibrato_start, global.vibrato_start, fallback.start_sec),
            ease_in_sec: resolve_parameter(note.ease_in_length, global.ease_in_length, fallback.ease_in_sec),
            ease_out_sec: resolve_parameter(note.ease_out_length, global.ease_out_length, fallback.ease_out_sec),
            depth_semitone: resolve_parameter(note.depth, global.depth, fallback.depth_semitone),
            frequency_hz: resolve_parameter(note.frequency, global.frequency, fallback.frequency_hz),
            phase_rad: resolve_parameter(note.phase, global.phase, fallback.phase_rad),
        }
    }
}
