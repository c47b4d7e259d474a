/*!
    Media kind and codec identification.
*/

use std::str::FromStr;

use crate::error::ParseError;

/**
    The two media kinds the pipeline routes.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Video,
    Audio,
}

/**
    Codec identifiers.

    This is a closed set: the engine only routes codecs it can name.
    `None` marks a track whose codec could not be identified.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CodecId {
    H264,
    Vp8,
    Vp9,
    Aac,
    Mp3,
    Opus,
    Flv,
    #[default]
    None,
}

impl CodecId {
    /**
        Returns the media kind this codec carries, or `None` for the
        unidentified codec.
    */
    pub const fn kind(self) -> Option<MediaKind> {
        match self {
            Self::H264 | Self::Vp8 | Self::Vp9 => Some(MediaKind::Video),
            Self::Aac | Self::Mp3 | Self::Opus | Self::Flv => Some(MediaKind::Audio),
            Self::None => None,
        }
    }

    /**
        Returns the canonical configuration name.
    */
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::H264 => "H264",
            Self::Vp8 => "VP8",
            Self::Vp9 => "VP9",
            Self::Aac => "AAC",
            Self::Mp3 => "MP3",
            Self::Opus => "OPUS",
            Self::Flv => "FLV",
            Self::None => "NONE",
        }
    }
}

impl FromStr for CodecId {
    type Err = ParseError;

    /**
        Parse a configuration codec name, case-insensitively.
    */
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "H264" => Ok(Self::H264),
            "VP8" => Ok(Self::Vp8),
            "VP9" => Ok(Self::Vp9),
            "AAC" => Ok(Self::Aac),
            "MP3" => Ok(Self::Mp3),
            "OPUS" => Ok(Self::Opus),
            "FLV" => Ok(Self::Flv),
            _ => Err(ParseError {
                kind: "codec",
                value: s.to_string(),
            }),
        }
    }
}
