use image::imageops::FilterType;
use image::RgbImage;

use crate::resampling::domain::frame_resizer::FrameResizer;
use crate::shared::dimensions::Dimensions;
use crate::shared::frame::Frame;

/// Resizes frames with cubic (Catmull-Rom) interpolation via the `image` crate.
///
/// Deterministic for a given input: the same frame and target always yield
/// the same pixels.
pub struct CubicFrameResizer {
    filter: FilterType,
}

impl CubicFrameResizer {
    pub fn new() -> Self {
        Self {
            filter: FilterType::CatmullRom,
        }
    }
}

impl Default for CubicFrameResizer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameResizer for CubicFrameResizer {
    fn resize(
        &self,
        frame: &Frame,
        target: Dimensions,
    ) -> Result<Frame, Box<dyn std::error::Error + Send + Sync>> {
        if frame.channels() != 3 {
            return Err(format!("expected RGB frame, got {} channels", frame.channels()).into());
        }
        if target.width == 0 || target.height == 0 {
            return Err(format!("cannot resize to {target}").into());
        }

        if frame.dimensions() == target {
            return Ok(frame.clone());
        }

        let img = RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
            .ok_or("Failed to create image from frame data")?;
        let resized = image::imageops::resize(&img, target.width, target.height, self.filter);

        Ok(Frame::new(
            resized.into_raw(),
            target.width,
            target.height,
            3,
            frame.index(),
        ))
    }
}
