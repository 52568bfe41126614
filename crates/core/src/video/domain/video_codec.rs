use std::fmt;
use std::str::FromStr;

/// Video codec used for the final output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VideoCodec {
    #[default]
    H264,
    Mpeg4,
}

impl VideoCodec {
    pub fn id(&self) -> ffmpeg_next::codec::Id {
        match self {
            VideoCodec::H264 => ffmpeg_next::codec::Id::H264,
            VideoCodec::Mpeg4 => ffmpeg_next::codec::Id::MPEG4,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            VideoCodec::H264 => "h264",
            VideoCodec::Mpeg4 => "mpeg4",
        }
    }
}

impl fmt::Display for VideoCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for VideoCodec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "h264" | "libx264" | "avc" => Ok(VideoCodec::H264),
            "mpeg4" | "mp4v" => Ok(VideoCodec::Mpeg4),
            other => Err(format!("Codec must be 'h264' or 'mpeg4', got '{other}'")),
        }
    }
}
