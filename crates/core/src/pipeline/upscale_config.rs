use crate::shared::constants::{DEFAULT_CRF, MAX_CRF};
use crate::video::domain::video_codec::VideoCodec;

/// Runtime options for an upscale run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpscaleConfig {
    /// Codec of the final output.
    pub video_codec: VideoCodec,
    /// H.264 constant rate factor; `None` uses [`DEFAULT_CRF`].
    pub crf: Option<u32>,
}

impl UpscaleConfig {
    pub fn crf_or_default(&self) -> u32 {
        self.crf.unwrap_or(DEFAULT_CRF).min(MAX_CRF)
    }
}
