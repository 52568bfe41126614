use thiserror::Error;

use crate::job::domain::job::Stage;
use crate::resampling::domain::frame_resampler::ResizeError;
use crate::video::domain::audio_extractor::ExtractionError;
use crate::video::domain::media_probe::ProbeError;
use crate::video::domain::remuxer::RemuxError;

/// The first failure of an upscale run, tagged with the stage it came from.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("audio extraction failed: {0}")]
    Extraction(#[from] ExtractionError),
    #[error("probe failed: {0}")]
    Probe(#[from] ProbeError),
    #[error("frame resampling failed: {0}")]
    Resize(#[from] ResizeError),
    #[error("remux failed: {0}")]
    Remux(#[from] RemuxError),
    #[error("upscale worker stopped without reporting a result")]
    WorkerDisconnected,
}

impl PipelineError {
    /// The stage that failed, or `None` when the run never reported back.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::Extraction(_) => Some(Stage::ExtractAudio),
            PipelineError::Probe(_) => Some(Stage::Probe),
            PipelineError::Resize(_) => Some(Stage::Resample),
            PipelineError::Remux(_) => Some(Stage::Remux),
            PipelineError::WorkerDisconnected => None,
        }
    }
}
