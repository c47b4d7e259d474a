/*!
    The parent application contract.

    The engine does not know where its output goes; it announces child
    streams and hands encoded packets to whatever implements this trait
    (in the server that is the media router feeding publishers).
*/

use media_types::{MediaPacket, StreamInfo};

/**
    Receiver of the engine's output.

    `create_stream` must be idempotent on the implementor's side; the engine
    announces each output stream once per run, but restarts re-announce.
    Packets passed to `send_frame` are owned by the implementor; the engine
    hands every subscribing stream its own deep clone.
*/
pub trait StreamSink: Send + Sync {
    /// Announce a new output stream.
    fn create_stream(&self, info: &StreamInfo);

    /// Announce teardown of an output stream.
    fn delete_stream(&self, info: &StreamInfo);

    /// Deliver an encoded packet for an output stream.
    fn send_frame(&self, info: &StreamInfo, packet: MediaPacket);
}
