use thiserror::Error;

pub type PitchResult<T> = Result<T, PitchError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PitchError {
    /// Note `index` ends after note `index + 1` starts.
    #[error("overlapping notes: note {index} ends at tick {tick_off} but the next one starts at tick {next_tick_on}")]
    OverlappingNotes {
        index: usize,
        tick_off: i64,
        next_tick_on: i64,
    },
}
