pub mod annotation;
pub mod cli;
pub mod commands;
pub mod detect;
pub mod plot;
pub mod session;
pub mod store;
pub mod utils;
pub mod waveform;
