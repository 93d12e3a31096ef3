use crate::error::{PitchError, PitchResult};
use crate::model::song::Song;
use crate::pitch::Encoder;
use crate::pitch::flat::{FlatCurve, FlatEncoder};
use crate::pitch::sectioned::{SectionedCurve, SectionedEncoder};
use crate::pitch::vibrato::Shaping;
use log::{debug, info};
use serde::Serialize;
use std::panic;
use std::thread;

/// Which project formats to produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Target {
    Flat,
    Sectioned,
    #[default]
    Both,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct Conversion {
    pub flat: Option<FlatCurve>,
    pub sectioned: Option<SectionedCurve>,
}

#[derive(Debug, Clone, Default)]
pub struct Converter {
    shaping: Option<Shaping>,
}

impl Converter {
    /// With `shaping` set, every target densifies the curve and adds vibrato before encoding.
    pub fn new(shaping: Option<Shaping>) -> Self {
        Self { shaping }
    }

    pub fn shaping(&self) -> Option<&Shaping> {
        self.shaping.as_ref()
    }

    pub fn convert_flat(&self, song: &Song) -> PitchResult<Option<FlatCurve>> {
        FlatEncoder.encode(song, self.shaping.as_ref())
    }

    pub fn convert_sectioned(&self, song: &Song) -> PitchResult<Option<SectionedCurve>> {
        SectionedEncoder.encode(song, self.shaping.as_ref())
    }

    pub fn convert(&self, song: &Song, target: Target) -> PitchResult<Conversion> {
        debug!(
            "Converting {} pitch points over {} notes for {:?}..!",
            song.pitch.len(),
            song.notes.len(),
            target
        );

        let conversion = match target {
            Target::Flat => Conversion {
                flat: self.convert_flat(song)?,
                sectioned: None,
            },
            Target::Sectioned => Conversion {
                flat: None,
                sectioned: self.convert_sectioned(song)?,
            },
            Target::Both => thread::scope(|scope| {
                let flat = scope.spawn(|| self.convert_flat(song));
                let sectioned = self.convert_sectioned(song);
                let flat = flat.join().unwrap_or_else(|why| panic::resume_unwind(why));

                Ok::<_, PitchError>(Conversion {
                    flat: flat?,
                    sectioned: sectioned?,
                })
            })?,
        };

        if conversion.flat.is_none() && conversion.sectioned.is_none() {
            info!("No pitch data to emit..!");
        }

        Ok(conversion)
    }
}
