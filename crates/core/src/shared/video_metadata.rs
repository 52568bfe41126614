use std::path::{Path, PathBuf};

use crate::shared::dimensions::Dimensions;
use crate::video::domain::media_probe::ProbeError;

/// Probed properties of a source video.
///
/// `frame_rate` is always positive: the reported container rate is rounded to
/// the nearest whole number and a rate that rounds to zero never makes it
/// into a `VideoMetadata`.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub dimensions: Dimensions,
    pub frame_rate: u32,
    pub frame_count: usize,
    pub codec: String,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    /// Builds metadata from the raw values a container reports.
    pub fn from_reported(
        path: &Path,
        reported_fps: f64,
        frame_count: usize,
        dimensions: Dimensions,
        codec: String,
    ) -> Result<Self, ProbeError> {
        let frame_rate = round_frame_rate(reported_fps).ok_or_else(|| ProbeError::ZeroFrameRate {
            path: path.to_path_buf(),
            reported: reported_fps,
        })?;

        Ok(Self {
            dimensions,
            frame_rate,
            frame_count,
            codec,
            source_path: Some(path.to_path_buf()),
        })
    }

    /// Length in seconds, `frame_count / frame_rate`.
    pub fn duration(&self) -> f64 {
        self.frame_count as f64 / self.frame_rate as f64
    }

    /// Length of one frame in seconds.
    pub fn frame_interval(&self) -> f64 {
        1.0 / self.frame_rate as f64
    }
}

/// Rounds a reported rate to a whole number of frames per second.
/// Returns `None` for rates that round to zero, are negative, or are not finite.
pub fn round_frame_rate(reported_fps: f64) -> Option<u32> {
    if !reported_fps.is_finite() {
        return None;
    }
    let rounded = reported_fps.round();
    if rounded < 1.0 || rounded > u32::MAX as f64 {
        return None;
    }
    Some(rounded as u32)
}
