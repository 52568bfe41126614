use std::path::Path;

use crate::shared::dimensions::Dimensions;
use crate::shared::frame::Frame;

/// Decodes frames from a video source.
///
/// Implementations handle I/O details (codec, container format, pixel
/// format) while the pipeline works with packed RGB [`Frame`]s.
pub trait VideoReader: Send {
    /// Opens a video file and returns the size of the frames it will yield.
    fn open(
        &mut self,
        path: &Path,
    ) -> Result<Dimensions, Box<dyn std::error::Error + Send + Sync>>;

    /// Returns an iterator over frames in decode order.
    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error + Send + Sync>>> + '_>;

    /// Releases any resources held by the reader.
    fn close(&mut self);
}
