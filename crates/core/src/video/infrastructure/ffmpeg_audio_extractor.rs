use std::path::{Path, PathBuf};

use crate::shared::constants::{AUDIO_BITRATE, DEFAULT_AAC_FRAME_SIZE};
use crate::video::domain::audio_extractor::{AudioExtractor, ExtractionError};

const OUTPUT_CHANNELS: usize = 2;

/// Transcodes a source's best audio stream into a standalone AAC file.
///
/// Decoded audio is resampled to planar float stereo at the source sample
/// rate and encoded at [`AUDIO_BITRATE`]. The container is chosen from the
/// destination extension (`.m4a` for the pipeline's audio artifact). A
/// partially written destination is removed on failure.
#[derive(Clone, Copy, Debug, Default)]
pub struct FfmpegAudioExtractor;

impl FfmpegAudioExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl AudioExtractor for FfmpegAudioExtractor {
    fn extract_audio(
        &self,
        source: &Path,
        destination: &Path,
    ) -> Result<PathBuf, ExtractionError> {
        ffmpeg_next::init()?;

        match transcode(source, destination) {
            Ok(samples) => {
                log::debug!(
                    "Extracted {samples} audio samples from {} to {}",
                    source.display(),
                    destination.display()
                );
                Ok(destination.to_path_buf())
            }
            Err(e) => {
                if destination.exists() {
                    let _ = std::fs::remove_file(destination);
                }
                Err(e)
            }
        }
    }
}

/// Runs the decode → resample → encode loop. Returns samples encoded per channel.
fn transcode(source: &Path, destination: &Path) -> Result<usize, ExtractionError> {
    let mut ictx = ffmpeg_next::format::input(source).map_err(|source_err| {
        ExtractionError::Open {
            path: source.to_path_buf(),
            source: source_err,
        }
    })?;

    let audio_stream = ictx
        .streams()
        .best(ffmpeg_next::media::Type::Audio)
        .ok_or_else(|| ExtractionError::NoAudioStream {
            path: source.to_path_buf(),
        })?;
    let audio_stream_index = audio_stream.index();

    let codec_ctx =
        ffmpeg_next::codec::context::Context::from_parameters(audio_stream.parameters())?;
    let mut decoder = codec_ctx.decoder().audio()?;

    let rate = decoder.rate();
    let in_layout = match decoder.channel_layout() {
        layout if layout.is_empty() => ffmpeg_next::ChannelLayout::default(decoder.channels() as i32),
        layout => layout,
    };
    let out_format = ffmpeg_next::format::Sample::F32(ffmpeg_next::format::sample::Type::Planar);

    let mut resampler = ffmpeg_next::software::resampling::Context::get(
        decoder.format(),
        in_layout,
        rate,
        out_format,
        ffmpeg_next::ChannelLayout::STEREO,
        rate,
    )?;

    let write_err = |e: ffmpeg_next::Error| ExtractionError::Write {
        path: destination.to_path_buf(),
        source: e,
    };

    let mut octx = ffmpeg_next::format::output(destination).map_err(write_err)?;
    let global_header = octx
        .format()
        .flags()
        .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

    let aac = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::AAC)
        .ok_or(ExtractionError::EncoderNotFound("AAC"))?;
    let mut ost = octx.add_stream(Some(aac))?;
    let ost_index = ost.index();

    let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(aac)
        .encoder()
        .audio()?;
    encoder_ctx.set_rate(rate as i32);
    encoder_ctx.set_channel_layout(ffmpeg_next::ChannelLayout::STEREO);
    encoder_ctx.set_format(out_format);
    encoder_ctx.set_bit_rate(AUDIO_BITRATE);
    encoder_ctx.set_time_base(ffmpeg_next::Rational(1, rate as i32));
    if global_header {
        encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
    }

    let encoder = encoder_ctx.open_as(aac)?;
    ost.set_parameters(&encoder);

    octx.write_header().map_err(write_err)?;

    let ost_time_base = octx
        .stream(ost_index)
        .map(|s| s.time_base())
        .unwrap_or(ffmpeg_next::Rational(1, rate as i32));

    let mut sink = AacSink {
        frame_size: match encoder.frame_size() as usize {
            0 => DEFAULT_AAC_FRAME_SIZE,
            n => n,
        },
        encoder,
        fifo: [Vec::new(), Vec::new()],
        pts: 0,
        rate,
        stream_index: ost_index,
        ost_time_base,
    };

    let mut decoded = ffmpeg_next::util::frame::audio::Audio::empty();

    for (stream, packet) in ictx.packets() {
        if stream.index() != audio_stream_index {
            continue;
        }
        decoder.send_packet(&packet)?;
        while decoder.receive_frame(&mut decoded).is_ok() {
            let mut resampled = output_frame(&resampler, decoded.samples());
            resampler.run(&decoded, &mut resampled)?;
            sink.push(&resampled);
            sink.encode_full_frames(&mut octx)?;
        }
    }

    // Flush the decoder
    decoder.send_eof()?;
    while decoder.receive_frame(&mut decoded).is_ok() {
        let mut resampled = output_frame(&resampler, decoded.samples());
        resampler.run(&decoded, &mut resampled)?;
        sink.push(&resampled);
        sink.encode_full_frames(&mut octx)?;
    }

    // Drain whatever the resampler still holds
    loop {
        let mut tail = output_frame(&resampler, 0);
        resampler.flush(&mut tail)?;
        if tail.samples() == 0 {
            break;
        }
        sink.push(&tail);
    }

    sink.finish(&mut octx)?;
    octx.write_trailer().map_err(write_err)?;

    Ok(sink.pts as usize)
}

/// Allocates a resampler output frame large enough for `incoming` samples plus
/// everything the resampler has buffered. The resampler takes the frame's
/// sample count as its capacity, so each conversion gets a fresh frame.
fn output_frame(
    resampler: &ffmpeg_next::software::resampling::Context,
    incoming: usize,
) -> ffmpeg_next::util::frame::audio::Audio {
    let buffered = resampler
        .delay()
        .map_or(0, |delay| delay.output.max(0) as usize);
    ffmpeg_next::util::frame::audio::Audio::new(
        ffmpeg_next::format::Sample::F32(ffmpeg_next::format::sample::Type::Planar),
        incoming + buffered + DEFAULT_AAC_FRAME_SIZE,
        ffmpeg_next::ChannelLayout::STEREO,
    )
}

/// Buffers planar stereo samples and feeds the AAC encoder in fixed-size frames.
struct AacSink {
    encoder: ffmpeg_next::codec::encoder::audio::Encoder,
    frame_size: usize,
    fifo: [Vec<f32>; OUTPUT_CHANNELS],
    pts: i64,
    rate: u32,
    stream_index: usize,
    ost_time_base: ffmpeg_next::Rational,
}

impl AacSink {
    fn push(&mut self, frame: &ffmpeg_next::util::frame::audio::Audio) {
        let samples = frame.samples();
        if samples == 0 {
            return;
        }
        for (channel, buffer) in self.fifo.iter_mut().enumerate() {
            let data = frame.data(channel);
            let floats =
                unsafe { std::slice::from_raw_parts(data.as_ptr() as *const f32, samples) };
            buffer.extend_from_slice(floats);
        }
    }

    fn encode_full_frames(
        &mut self,
        octx: &mut ffmpeg_next::format::context::Output,
    ) -> Result<(), ExtractionError> {
        while self.fifo[0].len() >= self.frame_size {
            self.encode_chunk(self.frame_size, octx)?;
        }
        Ok(())
    }

    fn finish(&mut self, octx: &mut ffmpeg_next::format::context::Output) -> Result<(), ExtractionError> {
        self.encode_full_frames(octx)?;
        let remainder = self.fifo[0].len();
        if remainder > 0 {
            self.encode_chunk(remainder, octx)?;
        }
        self.encoder.send_eof()?;
        self.drain(octx)
    }

    fn encode_chunk(
        &mut self,
        len: usize,
        octx: &mut ffmpeg_next::format::context::Output,
    ) -> Result<(), ExtractionError> {
        let mut frame = ffmpeg_next::util::frame::audio::Audio::new(
            ffmpeg_next::format::Sample::F32(ffmpeg_next::format::sample::Type::Planar),
            len,
            ffmpeg_next::ChannelLayout::STEREO,
        );
        frame.set_rate(self.rate);
        frame.set_pts(Some(self.pts));

        for (channel, buffer) in self.fifo.iter_mut().enumerate() {
            let chunk: Vec<f32> = buffer.drain(..len).collect();
            let src_bytes = unsafe {
                std::slice::from_raw_parts(chunk.as_ptr() as *const u8, chunk.len() * 4)
            };
            frame.data_mut(channel)[..src_bytes.len()].copy_from_slice(src_bytes);
        }

        self.encoder.send_frame(&frame)?;
        self.pts += len as i64;
        self.drain(octx)
    }

    fn drain(&mut self, octx: &mut ffmpeg_next::format::context::Output) -> Result<(), ExtractionError> {
        let enc_time_base = ffmpeg_next::Rational(1, self.rate as i32);
        let mut encoded = ffmpeg_next::Packet::empty();
        while self.encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(self.stream_index);
            encoded.rescale_ts(enc_time_base, self.ost_time_base);
            encoded.write_interleaved(octx)?;
        }
        Ok(())
    }
}
