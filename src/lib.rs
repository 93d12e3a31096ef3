#![allow(non_snake_case)]

mod converter;
mod error;
mod midi_importer;
mod model;
mod util;
pub mod pitch;

pub use converter::*;
pub use error::*;
pub use midi_importer::*;
pub use model::config::*;
pub use model::curve::*;
pub use model::song::*;
pub use model::vibrato::*;
pub use util::*;
