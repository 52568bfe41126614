use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: ffmpeg_next::Error,
    },
    #[error("no audio stream in {path}")]
    NoAudioStream { path: PathBuf },
    #[error("{0} encoder not available")]
    EncoderNotFound(&'static str),
    #[error("failed to write audio to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: ffmpeg_next::Error,
    },
    #[error("audio transcode failed: {0}")]
    Ffmpeg(#[from] ffmpeg_next::Error),
}

/// Demuxes a source's audio track into a standalone audio file.
pub trait AudioExtractor: Send {
    /// Writes the audio of `source` to `destination` and returns the path written.
    fn extract_audio(&self, source: &Path, destination: &Path)
        -> Result<PathBuf, ExtractionError>;
}
