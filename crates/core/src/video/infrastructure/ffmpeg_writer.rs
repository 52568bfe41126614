use std::path::Path;

use crate::shared::dimensions::Dimensions;
use crate::shared::frame::Frame;
use crate::video::domain::video_writer::VideoWriter;

type SendError = Box<dyn std::error::Error + Send + Sync>;

/// Bits per pixel per frame for the intermediate encode. Generous so the
/// final re-encode starts from a near-lossless picture.
const INTERMEDIATE_BITS_PER_PIXEL: f64 = 0.25;

/// Encodes a silent video via ffmpeg-next using MPEG-4 Part 2.
///
/// Used for the intermediate resampled video: every container ffmpeg can
/// write accepts MPEG-4, and the encoder is always compiled in.
pub struct FfmpegWriter {
    octx: Option<ffmpeg_next::format::context::Output>,
    encoder: Option<ffmpeg_next::codec::encoder::video::Encoder>,
    scaler: Option<ffmpeg_next::software::scaling::Context>,
    dimensions: Dimensions,
    time_base: ffmpeg_next::Rational,
    frame_count: usize,
    video_stream_index: usize,
}

// Safety: FfmpegWriter is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegWriter {}

impl FfmpegWriter {
    pub fn new() -> Self {
        Self {
            octx: None,
            encoder: None,
            scaler: None,
            dimensions: Dimensions::new(0, 0),
            time_base: ffmpeg_next::Rational(1, 1),
            frame_count: 0,
            video_stream_index: 0,
        }
    }

    /// Frames written since the last `open`.
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    fn drain_packets(&mut self) -> Result<(), SendError> {
        let (Some(encoder), Some(octx)) = (self.encoder.as_mut(), self.octx.as_mut()) else {
            return Err("FfmpegWriter: not opened".into());
        };

        let ost_time_base = octx
            .stream(self.video_stream_index)
            .ok_or("FfmpegWriter: output stream missing")?
            .time_base();

        let mut encoded = ffmpeg_next::Packet::empty();
        while encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(self.video_stream_index);
            encoded.rescale_ts(self.time_base, ost_time_base);
            encoded.write_interleaved(octx)?;
        }
        Ok(())
    }
}

impl Default for FfmpegWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoWriter for FfmpegWriter {
    fn open(
        &mut self,
        path: &Path,
        dimensions: Dimensions,
        frame_rate: u32,
    ) -> Result<(), SendError> {
        ffmpeg_next::init()?;

        if frame_rate == 0 {
            return Err("FfmpegWriter: frame rate must be positive".into());
        }

        let mut octx = ffmpeg_next::format::output(path)?;

        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4)
            .ok_or("MPEG4 encoder not found")?;

        let mut ost = octx.add_stream(Some(codec))?;
        let video_stream_index = ost.index();

        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()?;

        let time_base = ffmpeg_next::Rational(1, frame_rate as i32);

        encoder_ctx.set_width(dimensions.width);
        encoder_ctx.set_height(dimensions.height);
        encoder_ctx.set_format(ffmpeg_next::format::Pixel::YUV420P);
        encoder_ctx.set_time_base(time_base);
        encoder_ctx.set_frame_rate(Some(ffmpeg_next::Rational(frame_rate as i32, 1)));
        encoder_ctx.set_bit_rate(intermediate_bit_rate(dimensions, frame_rate));

        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let encoder = encoder_ctx.open_with(ffmpeg_next::Dictionary::new())?;
        ost.set_parameters(&encoder);
        ost.set_avg_frame_rate(ffmpeg_next::Rational(frame_rate as i32, 1));

        octx.write_header()?;

        // Set up RGB -> YUV scaler
        let scaler = ffmpeg_next::software::scaling::Context::get(
            ffmpeg_next::format::Pixel::RGB24,
            dimensions.width,
            dimensions.height,
            ffmpeg_next::format::Pixel::YUV420P,
            dimensions.width,
            dimensions.height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        self.octx = Some(octx);
        self.encoder = Some(encoder);
        self.scaler = Some(scaler);
        self.dimensions = dimensions;
        self.time_base = time_base;
        self.video_stream_index = video_stream_index;
        self.frame_count = 0;

        Ok(())
    }

    fn write(&mut self, frame: &Frame) -> Result<(), SendError> {
        let (Some(encoder), Some(scaler)) = (self.encoder.as_mut(), self.scaler.as_mut()) else {
            return Err("FfmpegWriter: not opened".into());
        };

        if frame.dimensions() != self.dimensions || frame.channels() != 3 {
            return Err(format!(
                "FfmpegWriter: expected {} RGB frame, got {} with {} channels",
                self.dimensions,
                frame.dimensions(),
                frame.channels()
            )
            .into());
        }

        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::new(
            ffmpeg_next::format::Pixel::RGB24,
            self.dimensions.width,
            self.dimensions.height,
        );

        let stride = rgb_frame.stride(0);
        let data = rgb_frame.data_mut(0);
        let src = frame.data();
        let row_len = self.dimensions.width as usize * 3;

        // Copy pixel data, respecting stride
        for row in 0..self.dimensions.height as usize {
            let src_start = row * row_len;
            let dst_start = row * stride;
            data[dst_start..dst_start + row_len].copy_from_slice(&src[src_start..src_start + row_len]);
        }

        let mut yuv_frame = ffmpeg_next::util::frame::video::Video::empty();
        scaler.run(&rgb_frame, &mut yuv_frame)?;
        yuv_frame.set_pts(Some(self.frame_count as i64));

        encoder.send_frame(&yuv_frame)?;
        self.drain_packets()?;

        self.frame_count += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), SendError> {
        if let Some(encoder) = self.encoder.as_mut() {
            encoder.send_eof()?;
            self.drain_packets()?;
            if let Some(octx) = self.octx.as_mut() {
                octx.write_trailer()?;
            }
        }

        self.octx = None;
        self.encoder = None;
        self.scaler = None;

        Ok(())
    }
}

fn intermediate_bit_rate(dimensions: Dimensions, frame_rate: u32) -> usize {
    let pixels_per_second = dimensions.width as f64 * dimensions.height as f64 * frame_rate as f64;
    (pixels_per_second * INTERMEDIATE_BITS_PER_PIXEL) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::count_video_frames;
    use crate::video::domain::video_reader::VideoReader;
    use crate::video::infrastructure::ffmpeg_reader::FfmpegReader;

    fn solid_frame(index: usize, w: u32, h: u32, value: u8) -> Frame {
        let data = vec![value; (w * h * 3) as usize];
        Frame::new(data, w, h, 3, index)
    }

    #[test]
    fn test_write_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mp4");

        let mut writer = FfmpegWriter::new();
        writer.open(&path, Dimensions::new(160, 120), 30).unwrap();
        for i in 0..3 {
            writer.write(&solid_frame(i, 160, 120, 128)).unwrap();
        }
        writer.close().unwrap();

        assert!(path.exists());
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_written_video_has_correct_resolution_and_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mp4");

        let mut writer = FfmpegWriter::new();
        writer.open(&path, Dimensions::new(320, 180), 24).unwrap();
        for i in 0..4 {
            writer.write(&solid_frame(i, 320, 180, 90)).unwrap();
        }
        assert_eq!(writer.frame_count(), 4);
        writer.close().unwrap();

        assert_eq!(count_video_frames(&path), (4, 320, 180));
    }

    #[test]
    fn test_write_without_open_returns_error() {
        let mut writer = FfmpegWriter::new();
        let result = writer.write(&solid_frame(0, 160, 120, 128));
        assert!(result.is_err());
    }

    #[test]
    fn test_write_wrong_size_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mp4");

        let mut writer = FfmpegWriter::new();
        writer.open(&path, Dimensions::new(160, 120), 30).unwrap();
        assert!(writer.write(&solid_frame(0, 80, 60, 0)).is_err());
        writer.close().unwrap();
    }

    #[test]
    fn test_open_zero_frame_rate_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = FfmpegWriter::new();
        assert!(writer
            .open(&dir.path().join("out.mp4"), Dimensions::new(16, 16), 0)
            .is_err());
    }

    #[test]
    fn test_open_unwritable_path_returns_error() {
        let mut writer = FfmpegWriter::new();
        assert!(writer
            .open(Path::new("/nonexistent/dir/out.mp4"), Dimensions::new(16, 16), 30)
            .is_err());
    }

    #[test]
    fn test_close_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mp4");

        let mut writer = FfmpegWriter::new();
        writer.open(&path, Dimensions::new(160, 120), 30).unwrap();
        writer.write(&solid_frame(0, 160, 120, 128)).unwrap();
        writer.close().unwrap();
        // Second close should not panic
        let _ = writer.close();
    }

    #[test]
    fn test_roundtrip_preserves_brightness() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roundtrip.mp4");

        let mut writer = FfmpegWriter::new();
        writer.open(&path, Dimensions::new(160, 120), 30).unwrap();
        for i in 0..3 {
            writer.write(&solid_frame(i, 160, 120, 128)).unwrap();
        }
        writer.close().unwrap();

        let mut reader = FfmpegReader::new();
        assert_eq!(reader.open(&path).unwrap(), Dimensions::new(160, 120));

        let frames: Vec<_> = reader.frames().map(|f| f.unwrap()).collect();
        assert_eq!(frames.len(), 3);

        // Codec is lossy, but the overall brightness should be close
        let first = &frames[0];
        let avg: f64 =
            first.data().iter().map(|&b| b as f64).sum::<f64>() / first.data().len() as f64;
        assert!(
            (avg - 128.0).abs() < 40.0,
            "Average pixel value {avg} should be close to 128"
        );
    }

    #[test]
    fn test_intermediate_bit_rate_scales_with_size() {
        let small = intermediate_bit_rate(Dimensions::new(640, 480), 24);
        let large = intermediate_bit_rate(Dimensions::new(1920, 1080), 24);
        assert!(large > small);
        assert_eq!(small, (640.0 * 480.0 * 24.0 * INTERMEDIATE_BITS_PER_PIXEL) as usize);
    }
}
