use crate::shared::dimensions::Dimensions;
use crate::shared::frame::Frame;

/// Geometric resize of a single frame.
pub trait FrameResizer: Send {
    /// Returns a new frame of exactly `target` size carrying the same index.
    fn resize(
        &self,
        frame: &Frame,
        target: Dimensions,
    ) -> Result<Frame, Box<dyn std::error::Error + Send + Sync>>;
}
