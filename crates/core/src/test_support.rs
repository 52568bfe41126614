//! ffmpeg-backed fixtures for tests: synthesizes small MPEG-4 clips with an
//! optional AAC track so no binary media needs to live in the repository.
#![allow(dead_code)]

use std::path::Path;

/// Shape of a synthesized test clip.
#[derive(Clone, Debug)]
pub struct TestVideo {
    pub frames: usize,
    pub width: u32,
    pub height: u32,
    pub fps: i32,
    pub audio_rate: Option<i32>,
}

impl TestVideo {
    pub fn silent(frames: usize, width: u32, height: u32, fps: i32) -> Self {
        Self {
            frames,
            width,
            height,
            fps,
            audio_rate: None,
        }
    }

    pub fn with_audio(frames: usize, width: u32, height: u32, fps: i32) -> Self {
        Self {
            audio_rate: Some(44_100),
            ..Self::silent(frames, width, height, fps)
        }
    }
}

/// Writes `clip` to `path`. The container is picked from the extension.
pub fn write_test_video(path: &Path, clip: &TestVideo) {
    ffmpeg_next::init().unwrap();

    let mut octx = ffmpeg_next::format::output(path).unwrap();

    let global_header = octx
        .format()
        .flags()
        .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

    let codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4).unwrap();
    let mut ost = octx.add_stream(Some(codec)).unwrap();
    let video_index = ost.index();

    let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
        .encoder()
        .video()
        .unwrap();

    encoder_ctx.set_width(clip.width);
    encoder_ctx.set_height(clip.height);
    encoder_ctx.set_format(ffmpeg_next::format::Pixel::YUV420P);
    encoder_ctx.set_time_base(ffmpeg_next::Rational(1, clip.fps));
    encoder_ctx.set_frame_rate(Some(ffmpeg_next::Rational(clip.fps, 1)));

    if global_header {
        encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
    }

    let mut video_encoder = encoder_ctx
        .open_with(ffmpeg_next::Dictionary::new())
        .unwrap();
    ost.set_parameters(&video_encoder);

    let mut audio = clip.audio_rate.map(|rate| {
        let aac = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::AAC).unwrap();
        let mut ost_audio = octx.add_stream(Some(aac)).unwrap();
        let audio_index = ost_audio.index();

        let mut ctx = ffmpeg_next::codec::context::Context::new_with_codec(aac)
            .encoder()
            .audio()
            .unwrap();
        ctx.set_rate(rate);
        ctx.set_channel_layout(ffmpeg_next::ChannelLayout::MONO);
        ctx.set_format(ffmpeg_next::format::Sample::F32(
            ffmpeg_next::format::sample::Type::Planar,
        ));
        ctx.set_bit_rate(128_000);
        ctx.set_time_base(ffmpeg_next::Rational(1, rate));
        if global_header {
            ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let encoder = ctx.open_as(aac).unwrap();
        ost_audio.set_parameters(&encoder);
        (encoder, audio_index, rate)
    });

    octx.write_header().unwrap();

    let video_tb = octx.stream(video_index).unwrap().time_base();

    let mut scaler = ffmpeg_next::software::scaling::Context::get(
        ffmpeg_next::format::Pixel::RGB24,
        clip.width,
        clip.height,
        ffmpeg_next::format::Pixel::YUV420P,
        clip.width,
        clip.height,
        ffmpeg_next::software::scaling::Flags::BILINEAR,
    )
    .unwrap();

    for i in 0..clip.frames {
        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::new(
            ffmpeg_next::format::Pixel::RGB24,
            clip.width,
            clip.height,
        );
        let stride = rgb_frame.stride(0);
        let data = rgb_frame.data_mut(0);
        for row in 0..clip.height as usize {
            for col in 0..clip.width as usize {
                let offset = row * stride + col * 3;
                data[offset] = ((i * 40) % 256) as u8;
                data[offset + 1] = (col * 255 / clip.width as usize) as u8;
                data[offset + 2] = (row * 255 / clip.height as usize) as u8;
            }
        }

        let mut yuv_frame = ffmpeg_next::util::frame::video::Video::empty();
        scaler.run(&rgb_frame, &mut yuv_frame).unwrap();
        yuv_frame.set_pts(Some(i as i64));

        video_encoder.send_frame(&yuv_frame).unwrap();
        drain_video(&mut video_encoder, &mut octx, video_index, clip.fps, video_tb);
    }

    video_encoder.send_eof().unwrap();
    drain_video(&mut video_encoder, &mut octx, video_index, clip.fps, video_tb);

    if let Some((encoder, audio_index, rate)) = audio.as_mut() {
        write_tone(encoder, &mut octx, *audio_index, *rate, clip);
    }

    octx.write_trailer().unwrap();
}

fn drain_video(
    encoder: &mut ffmpeg_next::codec::encoder::video::Encoder,
    octx: &mut ffmpeg_next::format::context::Output,
    stream_index: usize,
    fps: i32,
    ost_time_base: ffmpeg_next::Rational,
) {
    let mut encoded = ffmpeg_next::Packet::empty();
    while encoder.receive_packet(&mut encoded).is_ok() {
        encoded.set_stream(stream_index);
        encoded.rescale_ts(ffmpeg_next::Rational(1, fps), ost_time_base);
        encoded.write_interleaved(octx).unwrap();
    }
}

/// Encodes a 440 Hz mono tone lasting exactly as long as the video.
fn write_tone(
    encoder: &mut ffmpeg_next::codec::encoder::audio::Encoder,
    octx: &mut ffmpeg_next::format::context::Output,
    stream_index: usize,
    rate: i32,
    clip: &TestVideo,
) {
    let ost_time_base = octx.stream(stream_index).unwrap().time_base();
    let total_samples = clip.frames * rate as usize / clip.fps as usize;
    let frame_size = match encoder.frame_size() as usize {
        0 => 1024,
        n => n,
    };

    let samples: Vec<f32> = (0..total_samples)
        .map(|n| (n as f32 * 440.0 * std::f32::consts::TAU / rate as f32).sin() * 0.3)
        .collect();

    let mut pts = 0i64;
    for chunk in samples.chunks(frame_size) {
        let mut frame = ffmpeg_next::util::frame::audio::Audio::new(
            ffmpeg_next::format::Sample::F32(ffmpeg_next::format::sample::Type::Planar),
            chunk.len(),
            ffmpeg_next::ChannelLayout::MONO,
        );
        frame.set_rate(rate as u32);
        frame.set_pts(Some(pts));
        let bytes: Vec<u8> = chunk.iter().flat_map(|s| s.to_ne_bytes()).collect();
        frame.data_mut(0)[..bytes.len()].copy_from_slice(&bytes);

        encoder.send_frame(&frame).unwrap();
        drain_audio(encoder, octx, stream_index, rate, ost_time_base);
        pts += chunk.len() as i64;
    }

    encoder.send_eof().unwrap();
    drain_audio(encoder, octx, stream_index, rate, ost_time_base);
}

fn drain_audio(
    encoder: &mut ffmpeg_next::codec::encoder::audio::Encoder,
    octx: &mut ffmpeg_next::format::context::Output,
    stream_index: usize,
    rate: i32,
    ost_time_base: ffmpeg_next::Rational,
) {
    let mut encoded = ffmpeg_next::Packet::empty();
    while encoder.receive_packet(&mut encoded).is_ok() {
        encoded.set_stream(stream_index);
        encoded.rescale_ts(ffmpeg_next::Rational(1, rate), ost_time_base);
        encoded.write_interleaved(octx).unwrap();
    }
}

/// Writes a mono PCM track to `path` (use `.mkv`), one packet per entry of
/// `chunk_sizes`, so decoding yields frames of exactly those sample counts.
pub fn write_test_audio(path: &Path, rate: i32, chunk_sizes: &[usize]) {
    ffmpeg_next::init().unwrap();

    let mut octx = ffmpeg_next::format::output(path).unwrap();
    let pcm = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::PCM_S16LE).unwrap();
    let mut ost = octx.add_stream(Some(pcm)).unwrap();
    let stream_index = ost.index();

    let mut ctx = ffmpeg_next::codec::context::Context::new_with_codec(pcm)
        .encoder()
        .audio()
        .unwrap();
    ctx.set_rate(rate);
    ctx.set_channel_layout(ffmpeg_next::ChannelLayout::MONO);
    ctx.set_format(ffmpeg_next::format::Sample::I16(
        ffmpeg_next::format::sample::Type::Packed,
    ));
    ctx.set_time_base(ffmpeg_next::Rational(1, rate));

    let mut encoder = ctx.open_as(pcm).unwrap();
    ost.set_parameters(&encoder);
    octx.write_header().unwrap();
    let ost_time_base = octx.stream(stream_index).unwrap().time_base();

    let mut pts = 0i64;
    for &len in chunk_sizes {
        let mut frame = ffmpeg_next::util::frame::audio::Audio::new(
            ffmpeg_next::format::Sample::I16(ffmpeg_next::format::sample::Type::Packed),
            len,
            ffmpeg_next::ChannelLayout::MONO,
        );
        frame.set_rate(rate as u32);
        frame.set_pts(Some(pts));
        let bytes: Vec<u8> = (0..len as i64)
            .map(|n| {
                let t = (pts + n) as f32 / rate as f32;
                ((t * 440.0 * std::f32::consts::TAU).sin() * 8_000.0) as i16
            })
            .flat_map(|s| s.to_ne_bytes())
            .collect();
        frame.data_mut(0)[..bytes.len()].copy_from_slice(&bytes);

        encoder.send_frame(&frame).unwrap();
        drain_audio(&mut encoder, &mut octx, stream_index, rate, ost_time_base);
        pts += len as i64;
    }

    encoder.send_eof().unwrap();
    drain_audio(&mut encoder, &mut octx, stream_index, rate, ost_time_base);
    octx.write_trailer().unwrap();
}

/// Decodes the best audio stream and returns the samples per channel.
pub fn count_audio_samples(path: &Path) -> usize {
    ffmpeg_next::init().unwrap();
    let mut ictx = ffmpeg_next::format::input(path).unwrap();
    let stream = ictx
        .streams()
        .best(ffmpeg_next::media::Type::Audio)
        .unwrap();
    let index = stream.index();
    let mut decoder = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
        .unwrap()
        .decoder()
        .audio()
        .unwrap();

    let mut samples = 0;
    let mut frame = ffmpeg_next::util::frame::audio::Audio::empty();
    for (stream, packet) in ictx.packets() {
        if stream.index() != index {
            continue;
        }
        decoder.send_packet(&packet).unwrap();
        while decoder.receive_frame(&mut frame).is_ok() {
            samples += frame.samples();
        }
    }
    decoder.send_eof().unwrap();
    while decoder.receive_frame(&mut frame).is_ok() {
        samples += frame.samples();
    }
    samples
}

/// Counts decodable frames and reports the coded size of the best video stream.
pub fn count_video_frames(path: &Path) -> (usize, u32, u32) {
    ffmpeg_next::init().unwrap();
    let mut ictx = ffmpeg_next::format::input(path).unwrap();
    let stream = ictx
        .streams()
        .best(ffmpeg_next::media::Type::Video)
        .unwrap();
    let index = stream.index();
    let mut decoder = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
        .unwrap()
        .decoder()
        .video()
        .unwrap();

    let mut count = 0;
    let mut frame = ffmpeg_next::util::frame::video::Video::empty();
    for (stream, packet) in ictx.packets() {
        if stream.index() != index {
            continue;
        }
        decoder.send_packet(&packet).unwrap();
        while decoder.receive_frame(&mut frame).is_ok() {
            count += 1;
        }
    }
    decoder.send_eof().unwrap();
    while decoder.receive_frame(&mut frame).is_ok() {
        count += 1;
    }
    (count, decoder.width(), decoder.height())
}

/// Whether the file carries an audio stream.
pub fn has_audio_stream(path: &Path) -> bool {
    ffmpeg_next::init().unwrap();
    let ictx = ffmpeg_next::format::input(path).unwrap();
    let has_audio = ictx
        .streams()
        .best(ffmpeg_next::media::Type::Audio)
        .is_some();
    has_audio
}
