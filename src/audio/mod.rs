// Audio playback module
// Symphonia decode -> rubato resample -> cpal output

pub mod decoder;
pub mod output;
pub mod player;
pub mod resampler;

pub use player::{Player, PlayerError};
