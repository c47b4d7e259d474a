/*!
    Track and stream description types.
*/

use crate::codec::{CodecId, MediaKind};
use crate::format::{ChannelLayout, SampleFormat};
use crate::rational::Rational;

/**
    Video-specific track parameters.

    Tracks describe what a stream declares up front; the pixel format a
    decoder actually produces is carried on the decoded frames themselves.
*/
#[derive(Clone, Debug)]
pub struct VideoTrackParams {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frame rate in frames per second (may be approximate).
    pub frame_rate: f64,
}

/**
    Audio-specific track parameters.
*/
#[derive(Clone, Debug)]
pub struct AudioTrackParams {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Sample format.
    pub sample_format: SampleFormat,
    /// Channel layout.
    pub channels: ChannelLayout,
}

/**
    Kind-specific track parameters.
*/
#[derive(Clone, Debug)]
pub enum TrackParams {
    Video(VideoTrackParams),
    Audio(AudioTrackParams),
}

/**
    A single coded media channel inside a stream.
*/
#[derive(Clone, Debug)]
pub struct MediaTrack {
    /// Track id. Input streams carry source-assigned ids; output streams
    /// carry allocator-assigned ids.
    pub id: u32,
    /// Codec carried by the track.
    pub codec_id: CodecId,
    /// Bitrate in bits per second (0 when unknown).
    pub bitrate: u64,
    /// Time base for PTS/DTS on this track.
    pub time_base: Rational,
    /// Kind-specific parameters.
    pub params: TrackParams,
}

impl MediaTrack {
    /**
        Create a video track.
    */
    pub fn video(
        id: u32,
        codec_id: CodecId,
        bitrate: u64,
        time_base: Rational,
        width: u32,
        height: u32,
        frame_rate: f64,
    ) -> Self {
        Self {
            id,
            codec_id,
            bitrate,
            time_base,
            params: TrackParams::Video(VideoTrackParams {
                width,
                height,
                frame_rate,
            }),
        }
    }

    /**
        Create an audio track.
    */
    pub fn audio(
        id: u32,
        codec_id: CodecId,
        bitrate: u64,
        time_base: Rational,
        sample_rate: u32,
        sample_format: SampleFormat,
        channels: ChannelLayout,
    ) -> Self {
        Self {
            id,
            codec_id,
            bitrate,
            time_base,
            params: TrackParams::Audio(AudioTrackParams {
                sample_rate,
                sample_format,
                channels,
            }),
        }
    }

    /**
        Returns the media kind of this track.
    */
    pub fn kind(&self) -> MediaKind {
        match self.params {
            TrackParams::Video(_) => MediaKind::Video,
            TrackParams::Audio(_) => MediaKind::Audio,
        }
    }

    /**
        Returns the video parameters, if this is a video track.
    */
    pub fn video_params(&self) -> Option<&VideoTrackParams> {
        match &self.params {
            TrackParams::Video(params) => Some(params),
            TrackParams::Audio(_) => None,
        }
    }

    /**
        Returns the audio parameters, if this is an audio track.
    */
    pub fn audio_params(&self) -> Option<&AudioTrackParams> {
        match &self.params {
            TrackParams::Audio(params) => Some(params),
            TrackParams::Video(_) => None,
        }
    }
}

/**
    A named stream: an ordered list of tracks.
*/
#[derive(Clone, Debug, Default)]
pub struct StreamInfo {
    /// Stream name.
    pub name: String,
    /// Tracks, in declaration order.
    pub tracks: Vec<MediaTrack>,
}

impl StreamInfo {
    /**
        Create an empty stream with the given name.
    */
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tracks: Vec::new(),
        }
    }

    /**
        Append a track.
    */
    pub fn add_track(&mut self, track: MediaTrack) {
        self.tracks.push(track);
    }

    /**
        Look up a track by id.
    */
    pub fn track(&self, id: u32) -> Option<&MediaTrack> {
        self.tracks.iter().find(|track| track.id == id)
    }
}
