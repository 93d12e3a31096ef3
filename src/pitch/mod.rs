use crate::error::PitchResult;
use crate::model::curve::Point;
use crate::model::song::Song;
use crate::pitch::relativity::{borders, relative_data};
use crate::pitch::vibrato::Shaping;

pub mod flat;
pub mod interpolation;
pub mod reduce;
pub mod relativity;
pub mod sectioned;
pub mod time;
pub mod vibrato;

/// Grid spacing for every generated point.
pub const SAMPLING_INTERVAL_TICK: i64 = 4;

/// One output format for a song's pitch curve.
pub trait Encoder: Send + Sync {
    type Output: Send;

    /// Radius used to pull pitch transitions in front of close note borders. `0` disables it.
    fn border_radius(&self) -> i64;

    /// Format-specific pass over the relative curve.
    fn finish(&self, points: Vec<Point>) -> Option<Self::Output>;

    /// Converts the song's curve to relative deviation, optionally densifies it with vibrato,
    /// then hands it to [`Self::finish`]. `Ok(None)` means there is nothing to emit.
    ///
    /// Overlapping notes are rejected up front, even when the curve needs no conversion.
    fn encode(&self, song: &Song, shaping: Option<&Shaping>) -> PitchResult<Option<Self::Output>> {
        borders(&song.notes)?;

        let Some(relative) = relative_data(&song.pitch, &song.notes, self.border_radius())? else {
            return Ok(None);
        };

        let relative = match shaping {
            Some(shaping) => shaping.apply(&relative, &song.notes, &song.tempos)?,
            None => relative,
        };

        Ok(self.finish(relative))
    }
}
