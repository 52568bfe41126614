use std::path::{Path, PathBuf};

use crate::shared::constants::{AUDIO_EXTENSION, OUTPUT_PREFIX, RESOLUTION_SUBSTRINGS, TEMP_PREFIX};
use crate::shared::size_token::SizeToken;

/// Every filesystem path a single upscale job touches.
///
/// All paths are siblings of the source. The output and the silent video
/// differ only by their file name prefix; the audio artifact shares the
/// silent video's stem. Neither intermediate artifact can equal the source
/// or the output because both carry the temp prefix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobPaths {
    pub source: PathBuf,
    pub audio_artifact: PathBuf,
    pub silent_video: PathBuf,
    pub output: PathBuf,
}

impl JobPaths {
    /// Derives the job's paths from the source path and target size.
    ///
    /// Only the file name component is rewritten; the parent directory is
    /// reused as-is. Paths without a file name are not rejected, they simply
    /// yield prefixed empty names.
    pub fn resolve(source: &Path, token: SizeToken) -> Self {
        let file_name = source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let names = DerivedNames::from_file_name(&file_name, token);
        let dir = source.parent().unwrap_or_else(|| Path::new(""));

        Self {
            source: source.to_path_buf(),
            audio_artifact: dir.join(names.audio_artifact),
            silent_video: dir.join(names.silent_video),
            output: dir.join(names.output),
        }
    }

    /// The intermediate artifacts the janitor owns.
    pub fn intermediates(&self) -> [&Path; 2] {
        [&self.audio_artifact, &self.silent_video]
    }
}

/// File names (no directory) derived from a source file name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DerivedNames {
    pub output: String,
    pub silent_video: String,
    pub audio_artifact: String,
}

impl DerivedNames {
    pub fn from_file_name(file_name: &str, token: SizeToken) -> Self {
        let renamed = replace_resolution(file_name, token);
        let silent_video = format!("{TEMP_PREFIX}{renamed}");
        let audio_artifact = match Path::new(&silent_video).extension() {
            // Swapping the extension would collide with the silent video itself.
            Some(ext) if ext.eq_ignore_ascii_case(AUDIO_EXTENSION) => {
                format!("{silent_video}.{AUDIO_EXTENSION}")
            }
            _ => Path::new(&silent_video)
                .with_extension(AUDIO_EXTENSION)
                .to_string_lossy()
                .into_owned(),
        };

        Self {
            output: format!("{OUTPUT_PREFIX}{renamed}"),
            silent_video,
            audio_artifact,
        }
    }
}

/// Replaces every occurrence of the first known resolution substring found in
/// `file_name` with the token label. Names with no known substring are
/// returned unchanged.
fn replace_resolution(file_name: &str, token: SizeToken) -> String {
    RESOLUTION_SUBSTRINGS
        .iter()
        .find(|needle| file_name.contains(*needle))
        .map(|needle| file_name.replace(needle, token.label()))
        .unwrap_or_else(|| file_name.to_string())
}
