use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RemuxError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: ffmpeg_next::Error,
    },
    #[error("no {kind} stream in {path}")]
    MissingStream { path: PathBuf, kind: &'static str },
    #[error("no usable video encoder (tried {0})")]
    EncoderNotFound(String),
    #[error("frame rate must be positive")]
    ZeroFrameRate,
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: ffmpeg_next::Error,
    },
    #[error("remux failed: {0}")]
    Ffmpeg(#[from] ffmpeg_next::Error),
}

/// Combines a silent video with an audio track into the final output.
pub trait Remuxer: Send {
    fn remux(
        &self,
        silent_video: &Path,
        audio: &Path,
        frame_rate: u32,
        output: &Path,
    ) -> Result<(), RemuxError>;
}
