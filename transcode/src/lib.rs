/*!
    The transcoding pipeline core of the streaming server.

    One [`TranscodeStream`] is instantiated per input stream. It decodes the
    source's coded packets, adapts the decoded frames to each configured
    encode target (scale, pixel-format, resample, remix), re-encodes them,
    and fans the results out to the declared output streams.

    The codec library itself is an external collaborator: the engine reaches
    it only through the [`CodecFactory`] / [`CodecWorker`] contracts, and
    hands its output to whatever implements [`StreamSink`].
*/

pub mod config;
pub mod context;
pub mod queue;
pub mod registry;
pub mod routing;
pub mod sink;
pub mod stream;
pub mod worker;

pub use config::{
    ApplicationInfo, AudioEncodeProfile, EncodeProfile, OutputStreamConfig, VideoEncodeProfile,
    parse_bitrate,
};
pub use context::{AudioContextParams, ContextParams, TranscodeContext, VideoContextParams};
pub use queue::MediaQueue;
pub use registry::StreamRegistry;
pub use routing::{RoutingPlan, TrackAllocator};
pub use sink::StreamSink;
pub use stream::TranscodeStream;
pub use worker::{BoxedDecoder, BoxedEncoder, BoxedFilter, CodecFactory, CodecWorker, WorkerEvent};
