pub mod config;
pub mod curve;
pub mod song;
pub mod vibrato;
