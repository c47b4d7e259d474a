/*!
    The configuration surface consumed by the engine.

    These types mirror the application's declared encode profiles and output
    streams. Loading and validating the configuration file itself happens
    elsewhere; the engine only reads the already-deserialized values.
*/

use serde::Deserialize;

fn default_true() -> bool {
    true
}

/**
    A video sub-profile: one encode target's geometry and rate.
*/
#[derive(Clone, Debug, Deserialize)]
pub struct VideoEncodeProfile {
    #[serde(default = "default_true")]
    pub active: bool,
    /// Codec name, e.g. "H264" or "vp8" (case-insensitive).
    pub codec: String,
    /// Bitrate literal, e.g. "1500", "800K", "1.5M".
    pub bitrate: String,
    pub width: u32,
    pub height: u32,
    pub framerate: f64,
}

/**
    An audio sub-profile.
*/
#[derive(Clone, Debug, Deserialize)]
pub struct AudioEncodeProfile {
    #[serde(default = "default_true")]
    pub active: bool,
    /// Codec name, e.g. "AAC" or "opus" (case-insensitive).
    pub codec: String,
    /// Bitrate literal, e.g. "128K".
    pub bitrate: String,
    pub samplerate: u32,
}

/**
    A named encode profile: a video and/or audio target to produce.
*/
#[derive(Clone, Debug, Deserialize)]
pub struct EncodeProfile {
    pub name: String,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub video: Option<VideoEncodeProfile>,
    #[serde(default)]
    pub audio: Option<AudioEncodeProfile>,
}

/**
    A declared output stream: a name template plus the profiles it carries.

    The template may contain `${OriginStreamName}`, substituted with the
    input stream's name when the engine is built.
*/
#[derive(Clone, Debug, Deserialize)]
pub struct OutputStreamConfig {
    pub name: String,
    #[serde(default)]
    pub profiles: Vec<String>,
}

/**
    Everything the engine needs to know about its owning application.
*/
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ApplicationInfo {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub encodes: Vec<EncodeProfile>,
    #[serde(default)]
    pub streams: Vec<OutputStreamConfig>,
}

/**
    Parse a bitrate literal into bits per second.

    A decimal number with an optional case-insensitive `K` (×1024) or `M`
    (×1048576) suffix. Fractional values are allowed: `"1.5k"` is 1536.
    Returns `None` when the numeric part does not parse.
*/
pub fn parse_bitrate(literal: &str) -> Option<u64> {
    let trimmed = literal.trim();

    let (number, multiplier) = match trimmed.chars().last()? {
        'k' | 'K' => (&trimmed[..trimmed.len() - 1], 1024.0),
        'm' | 'M' => (&trimmed[..trimmed.len() - 1], 1024.0 * 1024.0),
        _ => (trimmed, 1.0),
    };

    let value: f64 = number.trim().parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }

    Some((value * multiplier) as u64)
}
