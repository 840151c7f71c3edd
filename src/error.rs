use thiserror::Error;

/// Errors surfaced at the boundaries of the visualizer library.
///
/// Nothing in the per-frame render path returns one of these; they are raised
/// where names and settings enter the system (CLI, config, key/IPC wiring).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum VizError {
    #[error("Unknown mode: {0} (expected one of bars, waves, circle, spectrum)")]
    UnknownMode(String),

    #[error("Unknown theme: {0}")]
    UnknownTheme(String),

    #[error("Invalid FFT size {0}: must be a power of two between 32 and 32768")]
    InvalidFftSize(usize),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Audio error: {0}")]
    Audio(String),
}
