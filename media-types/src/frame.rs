/*!
    Decoded media frames.
*/

use crate::codec::MediaKind;
use crate::format::{ChannelLayout, PixelFormat, SampleFormat};

/**
    Raw picture content of a video frame.
*/
#[derive(Clone, Debug)]
pub struct VideoContent {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Pixel format of `data`.
    pub format: PixelFormat,
    /// Contiguous pixel data.
    pub data: Vec<u8>,
}

/**
    Raw sample content of an audio frame.
*/
#[derive(Clone, Debug)]
pub struct AudioContent {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Sample format of `data`.
    pub format: SampleFormat,
    /// Channel layout.
    pub channels: ChannelLayout,
    /// Number of samples per channel.
    pub samples: usize,
    /// Contiguous sample data.
    pub data: Vec<u8>,
}

/**
    Kind-specific frame content.
*/
#[derive(Clone, Debug)]
pub enum FrameContent {
    Video(VideoContent),
    Audio(AudioContent),
}

/**
    A decoded media unit.

    Frames flow between the decode, filter and encode stages. `Clone`
    performs a deep copy; fan-out across filters relies on this.
*/
#[derive(Clone, Debug)]
pub struct MediaFrame {
    /// Track the frame belongs to. Freshly decoded frames carry the input
    /// track id; filtered frames carry the output track id they target.
    pub track_id: u32,
    /// Presentation timestamp, in track time-base units.
    pub pts: i64,
    /// The picture or samples.
    pub content: FrameContent,
}

impl MediaFrame {
    /**
        Create a video frame.
    */
    pub fn video(
        track_id: u32,
        pts: i64,
        width: u32,
        height: u32,
        format: PixelFormat,
        data: Vec<u8>,
    ) -> Self {
        Self {
            track_id,
            pts,
            content: FrameContent::Video(VideoContent {
                width,
                height,
                format,
                data,
            }),
        }
    }

    /**
        Create an audio frame.
    */
    pub fn audio(
        track_id: u32,
        pts: i64,
        sample_rate: u32,
        channels: ChannelLayout,
        format: SampleFormat,
        samples: usize,
        data: Vec<u8>,
    ) -> Self {
        Self {
            track_id,
            pts,
            content: FrameContent::Audio(AudioContent {
                sample_rate,
                format,
                channels,
                samples,
                data,
            }),
        }
    }

    /**
        Returns the media kind of this frame.
    */
    pub fn kind(&self) -> MediaKind {
        match self.content {
            FrameContent::Video(_) => MediaKind::Video,
            FrameContent::Audio(_) => MediaKind::Audio,
        }
    }

    /**
        Returns the video content, if this is a video frame.
    */
    pub fn video_content(&self) -> Option<&VideoContent> {
        match &self.content {
            FrameContent::Video(content) => Some(content),
            FrameContent::Audio(_) => None,
        }
    }

    /**
        Returns the audio content, if this is an audio frame.
    */
    pub fn audio_content(&self) -> Option<&AudioContent> {
        match &self.content {
            FrameContent::Audio(content) => Some(content),
            FrameContent::Video(_) => None,
        }
    }
}
