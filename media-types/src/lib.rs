/*!
    Shared types for the transcode pipeline ecosystem.

    This crate holds the types that cross crate boundaries: coded packets,
    raw frames, track and stream descriptions, and the formats they speak
    about. It has no dependency on any codec library, so consumers can use
    it without pulling in native bindings.
*/

mod codec;
mod error;
mod format;
mod frame;
mod packet;
mod rational;
mod track;

pub use codec::{CodecId, MediaKind};
pub use error::{Error, ParseError, Result};
pub use format::{ChannelLayout, PixelFormat, SampleFormat};
pub use frame::{AudioContent, FrameContent, MediaFrame, VideoContent};
pub use packet::{FragmentationHeader, MediaPacket};
pub use rational::Rational;
pub use track::{AudioTrackParams, MediaTrack, StreamInfo, TrackParams, VideoTrackParams};
