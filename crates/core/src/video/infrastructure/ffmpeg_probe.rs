use std::path::Path;

use crate::shared::dimensions::Dimensions;
use crate::shared::video_metadata::{round_frame_rate, VideoMetadata};
use crate::video::domain::media_probe::{MediaProbe, ProbeError};

/// Microseconds per second, the unit of a container's overall duration.
const CONTAINER_TIME_BASE: f64 = 1_000_000.0;

/// Reads video properties from container and stream headers via ffmpeg-next.
///
/// No frames are decoded. When the container does not record a frame count
/// it is estimated from the stream (or container) duration.
#[derive(Clone, Copy, Debug, Default)]
pub struct FfmpegProbe;

impl FfmpegProbe {
    pub fn new() -> Self {
        Self
    }
}

impl MediaProbe for FfmpegProbe {
    fn probe(&self, path: &Path) -> Result<VideoMetadata, ProbeError> {
        ffmpeg_next::init()?;

        let input_ctx = ffmpeg_next::format::input(path).map_err(|source| ProbeError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let stream = input_ctx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| ProbeError::NoVideoStream {
                path: path.to_path_buf(),
            })?;

        let reported_fps = reported_frame_rate(stream.avg_frame_rate(), stream.rate());

        let codec_ctx =
            ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;
        let dimensions = Dimensions::new(decoder.width(), decoder.height());
        let codec = stream.parameters().id().name().to_string();

        let frame_count = match stream.frames() {
            n if n > 0 => n as usize,
            _ => {
                let seconds = stream_seconds(stream.duration(), stream.time_base())
                    .or_else(|| container_seconds(input_ctx.duration()))
                    .unwrap_or(0.0);
                estimate_frame_count(seconds, reported_fps)
            }
        };

        let metadata =
            VideoMetadata::from_reported(path, reported_fps, frame_count, dimensions, codec)?;

        log::debug!(
            "Probed {}: {} @ {} fps, {} frames ({:.2}s, {})",
            path.display(),
            metadata.dimensions,
            metadata.frame_rate,
            metadata.frame_count,
            metadata.duration(),
            metadata.codec
        );

        Ok(metadata)
    }
}

/// Average frame rate, or the stream's base rate when the average is unset.
fn reported_frame_rate(avg: ffmpeg_next::Rational, base: ffmpeg_next::Rational) -> f64 {
    [avg, base]
        .into_iter()
        .find(|r| r.numerator() > 0 && r.denominator() > 0)
        .map(f64::from)
        .unwrap_or(0.0)
}

fn stream_seconds(duration: i64, time_base: ffmpeg_next::Rational) -> Option<f64> {
    if duration <= 0 || time_base.denominator() == 0 {
        return None;
    }
    Some(duration as f64 * f64::from(time_base))
}

fn container_seconds(duration: i64) -> Option<f64> {
    (duration > 0).then(|| duration as f64 / CONTAINER_TIME_BASE)
}

fn estimate_frame_count(seconds: f64, reported_fps: f64) -> usize {
    match round_frame_rate(reported_fps) {
        Some(fps) => (seconds * fps as f64).round() as usize,
        None => 0,
    }
}
