use std::fmt;

use crate::shared::dimensions::Dimensions;

/// Target-resolution selector.
///
/// Each token maps to exactly one output resolution. Parsing never fails:
/// labels outside the known set fall back to [`SizeToken::P1080`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SizeToken {
    P480,
    P720,
    #[default]
    P1080,
    P1440,
    K4,
    K8,
}

impl SizeToken {
    pub const ALL: [SizeToken; 6] = [
        SizeToken::P480,
        SizeToken::P720,
        SizeToken::P1080,
        SizeToken::P1440,
        SizeToken::K4,
        SizeToken::K8,
    ];

    /// Parses a selector label such as `"720"` or `"4k"`.
    pub fn parse(label: &str) -> Self {
        let trimmed = label.trim();
        Self::ALL
            .into_iter()
            .find(|token| token.label().eq_ignore_ascii_case(trimmed))
            .unwrap_or_else(|| {
                log::warn!("Unknown size '{label}', defaulting to {}", SizeToken::P1080);
                SizeToken::P1080
            })
    }

    /// The selector text, also substituted into derived file names.
    pub fn label(&self) -> &'static str {
        match self {
            SizeToken::P480 => "480",
            SizeToken::P720 => "720",
            SizeToken::P1080 => "1080",
            SizeToken::P1440 => "1440",
            SizeToken::K4 => "4k",
            SizeToken::K8 => "8k",
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        match self {
            SizeToken::P480 => Dimensions::new(640, 480),
            SizeToken::P720 => Dimensions::new(1280, 720),
            SizeToken::P1080 => Dimensions::new(1920, 1080),
            SizeToken::P1440 => Dimensions::new(2560, 1440),
            SizeToken::K4 => Dimensions::new(3840, 2160),
            SizeToken::K8 => Dimensions::new(7680, 4320),
        }
    }
}

impl fmt::Display for SizeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<&str> for SizeToken {
    fn from(label: &str) -> Self {
        Self::parse(label)
    }
}
