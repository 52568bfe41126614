/// Prepended to the source file name to form the final output name.
pub const OUTPUT_PREFIX: &str = "Upscaled ";

/// Prepended to the source file name to form the silent intermediate video name.
pub const TEMP_PREFIX: &str = "Temp ";

/// Resolution substrings rewritten to the target label, checked in order.
pub const RESOLUTION_SUBSTRINGS: &[&str] = &["480", "720"];

/// Container extension of the extracted audio artifact (AAC in MP4/iPod).
pub const AUDIO_EXTENSION: &str = "m4a";

/// Bitrate of the extracted audio artifact, in bits per second.
pub const AUDIO_BITRATE: usize = 320_000;

/// AAC frame size used when the encoder does not report one.
pub const DEFAULT_AAC_FRAME_SIZE: usize = 1024;

/// H.264 constant rate factor used for the final output when none is given.
pub const DEFAULT_CRF: u32 = 18;

/// Highest CRF libx264 accepts.
pub const MAX_CRF: u32 = 51;
