use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::dimensions::Dimensions;
use crate::shared::video_metadata::VideoMetadata;

type SendError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum ResizeError {
    #[error("failed to open source {path}: {source}")]
    OpenSource {
        path: PathBuf,
        #[source]
        source: SendError,
    },
    #[error("failed to create {path}: {source}")]
    CreateWriter {
        path: PathBuf,
        #[source]
        source: SendError,
    },
    #[error("failed to decode frame {index}: {source}")]
    Decode {
        index: usize,
        #[source]
        source: SendError,
    },
    #[error("failed to resample frame {index}: {source}")]
    Resample {
        index: usize,
        #[source]
        source: SendError,
    },
    #[error("failed to write frame {index}: {source}")]
    Write {
        index: usize,
        #[source]
        source: SendError,
    },
    #[error("failed to finalize resampled video: {source}")]
    Finalize {
        #[source]
        source: SendError,
    },
}

/// Rewrites every frame of a video at a new size into a silent video.
pub trait FrameResampler: Send {
    /// Reads `source` frame by frame, resizes each to `target` and writes them
    /// to `output` at `metadata.frame_rate`. Returns the number of frames written.
    fn resample(
        &mut self,
        source: &Path,
        output: &Path,
        target: Dimensions,
        metadata: &VideoMetadata,
        logger: &mut dyn PipelineLogger,
    ) -> Result<usize, ResizeError>;
}
