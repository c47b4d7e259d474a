/*!
    The codec worker contract.

    Decoders, filters and encoders all speak the same send/receive protocol:
    feed one input unit, then drain output units until the worker asks for
    more input. The concrete workers wrap an external codec library; the
    engine only depends on this trait.
*/

use media_types::{MediaFrame, MediaPacket, MediaTrack, Result};

use crate::context::TranscodeContext;

/**
    One step of a worker's output drain.
*/
#[derive(Debug)]
pub enum WorkerEvent<T> {
    /// An output unit is ready; drain again.
    Ready(T),
    /// The worker discovered a new output format. The carried unit is real
    /// data: handlers must reconfigure downstream and then treat the unit
    /// exactly like `Ready`. Decoders only.
    FormatChanged(T),
    /// The worker needs more input before it can produce output.
    NeedsInput,
    /// The worker has flushed everything it will ever produce.
    EndOfStream,
}

/**
    Uniform send/receive contract over a decoder, filter or encoder.

    `send_buffer` may buffer internally and never blocks indefinitely.
    `recv_buffer` is called in a loop until it yields `NeedsInput`,
    `EndOfStream` or an error; errors are terminal for the current unit
    only, not for the worker.
*/
pub trait CodecWorker: Send {
    type In;
    type Out;

    fn send_buffer(&mut self, input: Self::In) -> Result<()>;

    fn recv_buffer(&mut self) -> Result<WorkerEvent<Self::Out>>;
}

/// A packet-to-frame worker.
pub type BoxedDecoder = Box<dyn CodecWorker<In = MediaPacket, Out = MediaFrame>>;
/// A frame-to-frame format-adaptation worker (scale, resample, remix).
pub type BoxedFilter = Box<dyn CodecWorker<In = MediaFrame, Out = MediaFrame>>;
/// A frame-to-packet worker.
pub type BoxedEncoder = Box<dyn CodecWorker<In = MediaFrame, Out = MediaPacket>>;

/**
    Factory for codec workers, backed by the external codec library.

    A decoder is created for an input track and must match the track's codec.
    An encoder is created from an encoding context. A filter adapts frames
    decoded from `track`, whose actual format is described by `input`, into
    the format `output` expects.
*/
pub trait CodecFactory: Send + Sync {
    fn create_decoder(
        &self,
        track: &MediaTrack,
        context: &TranscodeContext,
    ) -> Result<BoxedDecoder>;

    fn create_encoder(&self, context: &TranscodeContext) -> Result<BoxedEncoder>;

    fn create_filter(
        &self,
        track: &MediaTrack,
        input: &TranscodeContext,
        output: &TranscodeContext,
    ) -> Result<BoxedFilter>;
}
