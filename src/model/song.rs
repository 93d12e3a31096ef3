use crate::model::curve::PitchCurve;
use crate::model::vibrato::VibratoParams;
use serde::{Deserialize, Serialize};

pub const TICKS_IN_BEAT: i64 = 480;
pub const DEFAULT_BPM: f64 = 120.0;
pub const DEFAULT_LYRIC: &str = "あ";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Note {
    pub key: u8,
    pub tick_on: i64,
    pub tick_off: i64,
    pub lyric: String,

    /// Per-note vibrato overrides, empty unless a foreign config supplies them.
    #[serde(default)]
    pub vibrato: VibratoParams,
}

impl Note {
    pub fn new(key: u8, tick_on: i64, tick_off: i64, lyric: impl Into<String>) -> Self {
        Self {
            key,
            tick_on,
            tick_off,
            lyric: lyric.into(),
            vibrato: VibratoParams::default(),
        }
    }

    pub fn length(&self) -> i64 {
        self.tick_off - self.tick_on
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Tempo {
    pub tick_position: i64,
    pub bpm: f64,
}

impl Tempo {
    pub fn new(tick_position: i64, bpm: f64) -> Self {
        Self { tick_position, bpm }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Metadata {
    pub title: Option<String>,
    pub source_ticks_per_beat: Option<u16>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Song {
    pub metadata: Metadata,
    pub notes: Vec<Note>,
    pub tempos: Vec<Tempo>,
    pub pitch: PitchCurve,
}
