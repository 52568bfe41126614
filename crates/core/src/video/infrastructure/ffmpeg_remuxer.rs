use std::iter::Peekable;
use std::path::Path;

use crate::shared::constants::{DEFAULT_CRF, MAX_CRF};
use crate::video::domain::remuxer::{RemuxError, Remuxer};
use crate::video::domain::video_codec::VideoCodec;

/// Bits per pixel per frame when the output falls back to MPEG-4, which has
/// no constant-quality mode.
const MPEG4_BITS_PER_PIXEL: f64 = 0.2;

/// Combines the silent resampled video with the extracted audio track.
///
/// The video is decoded and re-encoded with the configured codec at exactly
/// the given frame rate, one output frame per decoded frame. When the
/// configured encoder is missing or refuses to open, MPEG-4 is used instead.
/// Audio packets are stream-copied, interleaved by timestamp, and dropped once
/// they start past the end of the video. On failure the output is removed only
/// if this call opened it; an existing file is left alone when the inputs fail
/// before that point.
#[derive(Clone, Copy, Debug)]
pub struct FfmpegRemuxer {
    codec: VideoCodec,
    crf: u32,
}

impl FfmpegRemuxer {
    pub fn new(codec: VideoCodec) -> Self {
        Self {
            codec,
            crf: DEFAULT_CRF,
        }
    }

    /// Constant rate factor for H.264 output, clamped to the encoder's range.
    pub fn with_crf(mut self, crf: u32) -> Self {
        self.crf = crf.min(MAX_CRF);
        self
    }

    pub fn codec(&self) -> VideoCodec {
        self.codec
    }

    pub fn crf(&self) -> u32 {
        self.crf
    }
}

impl Default for FfmpegRemuxer {
    fn default() -> Self {
        Self::new(VideoCodec::default())
    }
}

impl Remuxer for FfmpegRemuxer {
    fn remux(
        &self,
        silent_video: &Path,
        audio: &Path,
        frame_rate: u32,
        output: &Path,
    ) -> Result<(), RemuxError> {
        if frame_rate == 0 {
            return Err(RemuxError::ZeroFrameRate);
        }
        ffmpeg_next::init()?;

        let mut opened = false;
        match self.mux(silent_video, audio, frame_rate, output, &mut opened) {
            Ok(()) => Ok(()),
            Err(e) => {
                if opened && output.exists() {
                    let _ = std::fs::remove_file(output);
                }
                Err(e)
            }
        }
    }
}

impl FfmpegRemuxer {
    fn mux(
        &self,
        silent_video: &Path,
        audio: &Path,
        frame_rate: u32,
        output: &Path,
        opened: &mut bool,
    ) -> Result<(), RemuxError> {
        let mut video_ictx = open_input(silent_video)?;
        let mut audio_ictx = open_input(audio)?;

        let video_stream = video_ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| RemuxError::MissingStream {
                path: silent_video.to_path_buf(),
                kind: "video",
            })?;
        let video_index = video_stream.index();
        let mut decoder =
            ffmpeg_next::codec::context::Context::from_parameters(video_stream.parameters())?
                .decoder()
                .video()?;

        let audio_stream = audio_ictx
            .streams()
            .best(ffmpeg_next::media::Type::Audio)
            .ok_or_else(|| RemuxError::MissingStream {
                path: audio.to_path_buf(),
                kind: "audio",
            })?;
        let audio_index = audio_stream.index();
        let audio_in_time_base = audio_stream.time_base();
        let audio_parameters = audio_stream.parameters();

        let write_err = |e: ffmpeg_next::Error| RemuxError::Write {
            path: output.to_path_buf(),
            source: e,
        };

        let mut octx = ffmpeg_next::format::output(output).map_err(write_err)?;
        *opened = true;
        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let width = decoder.width();
        let height = decoder.height();
        let (codec, encoder, used) = self.open_encoder(width, height, frame_rate, global_header)?;

        let mut ost_video = octx.add_stream(Some(codec))?;
        ost_video.set_parameters(&encoder);
        ost_video.set_avg_frame_rate(ffmpeg_next::Rational(frame_rate as i32, 1));
        let video_ost_index = ost_video.index();

        let mut ost_audio =
            octx.add_stream(ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::None))?;
        ost_audio.set_parameters(audio_parameters);
        unsafe {
            (*ost_audio.parameters().as_mut_ptr()).codec_tag = 0;
        }
        let audio_ost_index = ost_audio.index();

        octx.write_header().map_err(write_err)?;

        let ost_time_base = |octx: &ffmpeg_next::format::context::Output, index: usize| {
            octx.stream(index)
                .map(|s| s.time_base())
                .ok_or(RemuxError::Ffmpeg(ffmpeg_next::Error::StreamNotFound))
        };

        let scaler = if decoder.format() != ffmpeg_next::format::Pixel::YUV420P {
            Some(ffmpeg_next::software::scaling::Context::get(
                decoder.format(),
                width,
                height,
                ffmpeg_next::format::Pixel::YUV420P,
                width,
                height,
                ffmpeg_next::software::scaling::Flags::BILINEAR,
            )?)
        } else {
            None
        };

        let mut video = VideoTrack {
            encoder,
            scaler,
            enc_time_base: ffmpeg_next::Rational(1, frame_rate as i32),
            ost_time_base: ost_time_base(&octx, video_ost_index)?,
            ost_index: video_ost_index,
            frames: 0,
        };

        let audio_packets = audio_ictx
            .packets()
            .filter(move |(stream, _)| stream.index() == audio_index)
            .map(|(_, packet)| packet);
        let mut audio = AudioTrack {
            packets: audio_packets.peekable(),
            in_time_base: audio_in_time_base,
            ost_time_base: ost_time_base(&octx, audio_ost_index)?,
            ost_index: audio_ost_index,
            written: 0,
        };

        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        for (stream, packet) in video_ictx.packets() {
            if stream.index() != video_index {
                continue;
            }
            decoder.send_packet(&packet)?;
            while decoder.receive_frame(&mut decoded).is_ok() {
                video.encode(&decoded, &mut audio, &mut octx)?;
            }
        }

        decoder.send_eof()?;
        while decoder.receive_frame(&mut decoded).is_ok() {
            video.encode(&decoded, &mut audio, &mut octx)?;
        }
        video.finish(&mut audio, &mut octx)?;

        let video_end = video.frames as f64 / frame_rate as f64;
        audio.write_before(video_end, &mut octx)?;
        let dropped = audio.packets.count();

        octx.write_trailer().map_err(write_err)?;

        log::debug!(
            "Remuxed {} frames ({used}) and {} audio packets into {}, dropped {dropped} trailing audio packets",
            video.frames,
            audio.written,
            output.display()
        );

        Ok(())
    }

    /// Opens the configured encoder, falling back to MPEG-4.
    fn open_encoder(
        &self,
        width: u32,
        height: u32,
        frame_rate: u32,
        global_header: bool,
    ) -> Result<
        (
            ffmpeg_next::Codec,
            ffmpeg_next::codec::encoder::video::Encoder,
            VideoCodec,
        ),
        RemuxError,
    > {
        let mut candidates = vec![self.codec];
        if self.codec != VideoCodec::Mpeg4 {
            candidates.push(VideoCodec::Mpeg4);
        }

        for candidate in &candidates {
            match self.try_open(*candidate, width, height, frame_rate, global_header) {
                Ok((codec, encoder)) => return Ok((codec, encoder, *candidate)),
                Err(e) => log::warn!("{candidate} encoder unavailable ({e}), trying next"),
            }
        }

        let tried: Vec<_> = candidates.iter().map(VideoCodec::name).collect();
        Err(RemuxError::EncoderNotFound(tried.join(", ")))
    }

    fn try_open(
        &self,
        candidate: VideoCodec,
        width: u32,
        height: u32,
        frame_rate: u32,
        global_header: bool,
    ) -> Result<
        (
            ffmpeg_next::Codec,
            ffmpeg_next::codec::encoder::video::Encoder,
        ),
        ffmpeg_next::Error,
    > {
        let codec = ffmpeg_next::encoder::find(candidate.id())
            .ok_or(ffmpeg_next::Error::EncoderNotFound)?;

        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()?;

        encoder_ctx.set_width(width);
        encoder_ctx.set_height(height);
        encoder_ctx.set_format(ffmpeg_next::format::Pixel::YUV420P);
        encoder_ctx.set_time_base(ffmpeg_next::Rational(1, frame_rate as i32));
        encoder_ctx.set_frame_rate(Some(ffmpeg_next::Rational(frame_rate as i32, 1)));

        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let mut options = ffmpeg_next::Dictionary::new();
        match candidate {
            VideoCodec::H264 => {
                options.set("crf", &self.crf.to_string());
                options.set("preset", "medium");
            }
            VideoCodec::Mpeg4 => {
                let pixels_per_second = width as f64 * height as f64 * frame_rate as f64;
                encoder_ctx.set_bit_rate((pixels_per_second * MPEG4_BITS_PER_PIXEL) as usize);
            }
        }

        let encoder = encoder_ctx.open_with(options)?;
        Ok((codec, encoder))
    }
}

fn open_input(path: &Path) -> Result<ffmpeg_next::format::context::Input, RemuxError> {
    ffmpeg_next::format::input(path).map_err(|source| RemuxError::Open {
        path: path.to_path_buf(),
        source,
    })
}

/// Re-encodes decoded frames with a constant frame rate.
struct VideoTrack {
    encoder: ffmpeg_next::codec::encoder::video::Encoder,
    scaler: Option<ffmpeg_next::software::scaling::Context>,
    enc_time_base: ffmpeg_next::Rational,
    ost_time_base: ffmpeg_next::Rational,
    ost_index: usize,
    frames: i64,
}

impl VideoTrack {
    fn encode<I: Iterator<Item = ffmpeg_next::Packet>>(
        &mut self,
        decoded: &ffmpeg_next::util::frame::video::Video,
        audio: &mut AudioTrack<I>,
        octx: &mut ffmpeg_next::format::context::Output,
    ) -> Result<(), RemuxError> {
        let mut frame = match self.scaler.as_mut() {
            Some(scaler) => {
                let mut converted = ffmpeg_next::util::frame::video::Video::empty();
                scaler.run(decoded, &mut converted)?;
                converted
            }
            None => decoded.clone(),
        };
        frame.set_pts(Some(self.frames));
        frame.set_kind(ffmpeg_next::picture::Type::None);

        self.encoder.send_frame(&frame)?;
        self.frames += 1;
        self.drain(audio, octx)
    }

    fn finish<I: Iterator<Item = ffmpeg_next::Packet>>(
        &mut self,
        audio: &mut AudioTrack<I>,
        octx: &mut ffmpeg_next::format::context::Output,
    ) -> Result<(), RemuxError> {
        self.encoder.send_eof()?;
        self.drain(audio, octx)
    }

    /// Writes pending video packets, each preceded by the audio that plays before it.
    fn drain<I: Iterator<Item = ffmpeg_next::Packet>>(
        &mut self,
        audio: &mut AudioTrack<I>,
        octx: &mut ffmpeg_next::format::context::Output,
    ) -> Result<(), RemuxError> {
        let mut encoded = ffmpeg_next::Packet::empty();
        while self.encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(self.ost_index);
            encoded.rescale_ts(self.enc_time_base, self.ost_time_base);

            let at = packet_seconds(&encoded, self.ost_time_base);
            audio.write_before(at, octx)?;

            encoded.write_interleaved(octx)?;
        }
        Ok(())
    }
}

/// Stream-copies audio packets in timestamp order.
struct AudioTrack<I: Iterator<Item = ffmpeg_next::Packet>> {
    packets: Peekable<I>,
    in_time_base: ffmpeg_next::Rational,
    ost_time_base: ffmpeg_next::Rational,
    ost_index: usize,
    written: usize,
}

impl<I: Iterator<Item = ffmpeg_next::Packet>> AudioTrack<I> {
    /// Writes every queued packet that starts before `seconds`.
    fn write_before(
        &mut self,
        seconds: f64,
        octx: &mut ffmpeg_next::format::context::Output,
    ) -> Result<(), RemuxError> {
        while let Some(mut packet) = self
            .packets
            .next_if(|p| packet_seconds(p, self.in_time_base) < seconds)
        {
            packet.rescale_ts(self.in_time_base, self.ost_time_base);
            packet.set_position(-1);
            packet.set_stream(self.ost_index);
            packet.write_interleaved(octx)?;
            self.written += 1;
        }
        Ok(())
    }
}

fn packet_seconds(packet: &ffmpeg_next::Packet, time_base: ffmpeg_next::Rational) -> f64 {
    let ts = packet.dts().or(packet.pts()).unwrap_or(0);
    ts as f64 * f64::from(time_base)
}
