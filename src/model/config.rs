use crate::model::curve::Point;
use crate::model::song::Song;
use crate::model::vibrato::VibratoParams;
use crate::pitch::interpolation::Kernel;
use crate::pitch::vibrato::{Envelope, Shaping};
use anyhow::{Result, anyhow};
use clap::Parser;
use log::{debug, warn};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "VOX_BEND",
    about = "Convert MIDI pitch bends into singing-voice project pitch curves!"
)]
pub struct Args {
    /// Path to the source MIDI file.
    pub midi: PathBuf,

    /// Which pitch curve format(s) to emit: flat|sectioned|both.
    #[arg(short, long, default_value = "both")]
    pub target: String,

    /// Write the JSON result here instead of printing it.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Transpose note keys in semitones (positive or negative). Pitch bends are left untouched.
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    pub transpose: i32,

    /// Polyphony reduction policy for overlapping notes: highest|lowest|loudest.
    #[arg(short, long, default_value = "highest")]
    pub policy: String,

    /// Keep overlapping notes as they are and fail instead of reducing them to monophony.
    #[arg(long, default_value_t = false)]
    pub strict: bool,

    /// MIDI channel (0-15) to read notes and pitch bends from.
    #[arg(short, long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..16))]
    pub channel: u8,

    /// Densify the curve with the given interpolation mode and add vibrato: linear|cosine|cubic|ease-in|ease-out.
    #[arg(short, long)]
    pub interpolation: Option<String>,

    /// JSON file with default/per-note vibrato parameters and a depth envelope. Enables vibrato.
    #[arg(long = "vibrato-config")]
    pub vibrato_config: Option<PathBuf>,

    /// Dry run (print the first dry_run_max notes and exit).
    #[arg(short, long, default_value_t = false)]
    pub dry_run: bool,

    /// Maximum notes to print in dry run.
    #[arg(long, default_value_t = 80)]
    pub dry_run_max: usize,

    /// Prints extra information to the terminal.
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct EnvelopeConfig {
    pub points: Vec<(i64, f64)>,
    pub mode: Option<String>,
}

/// Foreign vibrato settings, loaded from JSON.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct VibratoConfig {
    pub defaults: VibratoParams,
    /// Overrides keyed by note index.
    pub notes: BTreeMap<usize, VibratoParams>,
    pub envelope: Option<EnvelopeConfig>,
}

impl VibratoConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref()).map_err(|e| {
            anyhow!(
                "Failed to read vibrato config {}: {}",
                path.as_ref().display(),
                e
            )
        })?;

        serde_json::from_str(&text).map_err(|e| {
            anyhow!(
                "Failed to parse vibrato config {}: {}",
                path.as_ref().display(),
                e
            )
        })
    }

    /// Copies per-note overrides onto the song's notes.
    pub fn apply_overrides(&self, song: &mut Song) {
        for (&index, params) in self.notes.iter() {
            match song.notes.get_mut(index) {
                Some(note) => note.vibrato = *params,
                None => warn!(
                    "Vibrato override for note {} ignored, song only has {} notes..!",
                    index,
                    song.notes.len()
                ),
            }
        }

        debug!("Applied {} vibrato overrides..!", self.notes.len());
    }

    pub fn shaping(&self, kernel: Kernel) -> Shaping {
        Shaping {
            kernel,
            defaults: self.defaults,
            envelope: self.envelope.as_ref().map(|env| Envelope {
                points: env.points.iter().copied().map(Point::from).collect(),
                kernel: env.mode.as_deref().map(Kernel::from_mode).unwrap_or_default(),
            }),
        }
    }
}
