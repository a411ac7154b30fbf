use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Unsupported format: {0}")]
    Unsupported(#[source] symphonia::core::errors::Error),
    #[error("No supported audio track")]
    NoTrack,
    #[error("Unsupported codec: {0}")]
    Codec(#[source] symphonia::core::errors::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("No audio output stream: {0}")]
    Stream(#[from] rodio::StreamError),
    #[error("Audio output unavailable: {0}")]
    Output(#[from] rodio::PlayError),
}
