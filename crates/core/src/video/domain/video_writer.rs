use std::path::Path;

use crate::shared::dimensions::Dimensions;
use crate::shared::frame::Frame;

/// Encodes frames into a video file with no audio track.
pub trait VideoWriter: Send {
    fn open(
        &mut self,
        path: &Path,
        dimensions: Dimensions,
        frame_rate: u32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Flushes the encoder and finalizes the container.
    fn close(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
