use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::video_metadata::VideoMetadata;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: ffmpeg_next::Error,
    },
    #[error("no video stream in {path}")]
    NoVideoStream { path: PathBuf },
    #[error("frame rate of {path} ({reported}) rounds to zero, duration is undefined")]
    ZeroFrameRate { path: PathBuf, reported: f64 },
    #[error("failed to read video parameters: {0}")]
    Ffmpeg(#[from] ffmpeg_next::Error),
}

/// Reads frame rate, frame count, duration and frame size from a source.
pub trait MediaProbe: Send {
    fn probe(&self, path: &Path) -> Result<VideoMetadata, ProbeError>;
}
