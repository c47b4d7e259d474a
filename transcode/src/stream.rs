/*!
    The per-input-stream transcoding engine.

    One engine ingests coded packets from a single source stream, decodes
    them, adapts the decoded frames per output target, re-encodes them, and
    fans the encoded packets out to the configured output streams. Internally
    it is a three-stage pipeline:

    ```text
    push() ─► input ─► [decode] ─► decoded ─► [filter] ─► filtered ─► [encode] ─► sink
    ```

    Each stage runs on its own thread over a queue with drop-based
    back-pressure: when a downstream queue is over budget the unit is dropped
    with a throttled warning, never blocking a producer. Live media prefers
    loss to staleness.
*/

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use log::{debug, error, info, trace};

use media_types::{
    FrameContent, MediaFrame, MediaKind, MediaPacket, MediaTrack, StreamInfo, TrackParams,
};

use crate::config::ApplicationInfo;
use crate::context::{ContextParams, TranscodeContext};
use crate::queue::MediaQueue;
use crate::registry::StreamRegistry;
use crate::routing::RoutingPlan;
use crate::sink::StreamSink;
use crate::worker::{
    BoxedDecoder, BoxedEncoder, BoxedFilter, CodecFactory, CodecWorker, WorkerEvent,
};

/// Queue-overflow warnings are emitted on the first drop and then once per
/// this many drops.
const QUEUE_FULL_LOG_INTERVAL: u64 = 256;
/// Decode statistics are logged once per this many decoded frames.
const DECODE_STATS_INTERVAL: u64 = 300;

/// State shared between the engine handle and its worker threads.
struct Shared {
    application_id: u32,
    input_info: Arc<StreamInfo>,
    sink: Arc<dyn StreamSink>,
    registry: Arc<StreamRegistry>,
    factory: Arc<dyn CodecFactory>,

    /// Encode target per output track id. Read-only after construction.
    output_contexts: BTreeMap<u8, TranscodeContext>,
    /// Output track ids per concrete output stream name. Read-only.
    stream_tracks: BTreeMap<String, Vec<u8>>,
    /// The announced output streams. Read-only.
    stream_outputs: BTreeMap<String, Arc<StreamInfo>>,

    /// Format-adaptation workers per output track id. Installed by the
    /// decode worker on format notices, used by the filter worker. Each
    /// filter sits behind its own lock so the map lock is never held while
    /// codec work runs.
    filters: Mutex<HashMap<u8, Arc<Mutex<BoxedFilter>>>>,

    queue_input: MediaQueue<MediaPacket>,
    queue_decoded: MediaQueue<MediaFrame>,
    queue_filtered: MediaQueue<MediaFrame>,

    kill: AtomicBool,
    max_queue_size: usize,

    decoded_frames: AtomicU64,
    queue_full_events: AtomicU64,
    input_full_events: AtomicU64,
}

#[derive(Default)]
struct Workers {
    decode: Option<JoinHandle<()>>,
    filter: Option<JoinHandle<()>>,
    encode: Option<JoinHandle<()>>,
}

/**
    The transcoding engine for one input stream.

    Constructed from the application's profile/stream configuration and the
    input stream's track list. On return the pipeline is either running or
    inert (no usable decoder or encoder; `push` then returns false).

    `stop` (also run on drop) shuts the stages down in pipeline order so
    every worker observes a closed upstream before it is joined.
*/
pub struct TranscodeStream {
    shared: Arc<Shared>,
    encoder_count: usize,
    workers: Mutex<Workers>,
}

impl TranscodeStream {
    /**
        Build decoders, routing, encoders, and launch the worker threads.
    */
    pub fn new(
        application: &ApplicationInfo,
        input_info: StreamInfo,
        sink: Arc<dyn StreamSink>,
        registry: Arc<StreamRegistry>,
        factory: Arc<dyn CodecFactory>,
    ) -> Self {
        debug!("transcode stream created: '{}'", input_info.name);

        let input_info = Arc::new(input_info);

        let mut decoders: HashMap<u32, BoxedDecoder> = HashMap::new();
        for track in &input_info.tracks {
            let context = decode_context_for(track);
            match factory.create_decoder(track, &context) {
                Ok(decoder) => {
                    decoders.insert(track.id, decoder);
                }
                Err(e) => error!(
                    "failed to create decoder for input track {} ({}): {e}",
                    track.id,
                    track.codec_id.as_str()
                ),
            }
        }

        if decoders.is_empty() {
            debug!(
                "no decoders for stream '{}', engine is inert",
                input_info.name
            );
            return Self::inert(application, input_info, sink, registry, factory);
        }

        let plan = RoutingPlan::build(application, &input_info.name, &registry);

        // An encode target is only reachable when the input actually carries
        // its kind; targets without a source keep their routing slot but get
        // no encoder.
        let input_kinds: HashSet<MediaKind> =
            input_info.tracks.iter().map(MediaTrack::kind).collect();

        let mut stream_outputs: BTreeMap<String, StreamInfo> = plan
            .stream_tracks
            .keys()
            .map(|name| (name.clone(), StreamInfo::new(name.clone())))
            .collect();

        let mut encoders: HashMap<u32, BoxedEncoder> = HashMap::new();
        for (&output_id, context) in &plan.output_contexts {
            if !input_kinds.contains(&context.kind()) {
                continue;
            }

            let track = output_track_for(output_id, context);
            for (name, tracks) in &plan.stream_tracks {
                if tracks.contains(&output_id) {
                    if let Some(output) = stream_outputs.get_mut(name) {
                        output.add_track(track.clone());
                        info!("stream '{name}' carries output track {output_id:#04x}");
                    }
                }
            }

            match factory.create_encoder(context) {
                Ok(encoder) => {
                    encoders.insert(output_id as u32, encoder);
                }
                Err(e) => error!("failed to create encoder for output track {output_id:#04x}: {e}"),
            }
        }

        if encoders.is_empty() {
            debug!(
                "no encoders for stream '{}', engine is inert",
                input_info.name
            );
            registry.release(application.id, plan.stream_tracks.keys());
            return Self::inert(application, input_info, sink, registry, factory);
        }

        let max_queue_size = if encoders.len() > 0x0F {
            0xFF
        } else {
            encoders.len() * 256
        };

        info!(
            "transcoder ready: encoders({}) streams({})",
            encoders.len(),
            plan.stream_tracks.len()
        );

        let shared = Arc::new(Shared {
            application_id: application.id,
            input_info,
            sink,
            registry,
            factory,
            output_contexts: plan.output_contexts,
            stream_tracks: plan.stream_tracks,
            stream_outputs: stream_outputs
                .into_iter()
                .map(|(name, info)| (name, Arc::new(info)))
                .collect(),
            filters: Mutex::new(HashMap::new()),
            queue_input: MediaQueue::new(),
            queue_decoded: MediaQueue::new(),
            queue_filtered: MediaQueue::new(),
            kill: AtomicBool::new(false),
            max_queue_size,
            decoded_frames: AtomicU64::new(0),
            queue_full_events: AtomicU64::new(0),
            input_full_events: AtomicU64::new(0),
        });

        let encoder_count = encoders.len();

        match spawn_workers(&shared, decoders, encoders) {
            Ok(workers) => {
                debug!("transcode stream threads started");
                Self {
                    shared,
                    encoder_count,
                    workers: Mutex::new(workers),
                }
            }
            Err((workers, e)) => {
                error!("failed to start transcode stream threads: {e}");
                if workers.decode.is_none() {
                    // The decode worker owns stream teardown; it never ran,
                    // so the registered names are released here.
                    shared
                        .registry
                        .release(shared.application_id, shared.stream_outputs.keys());
                }
                let engine = Self {
                    shared,
                    encoder_count,
                    workers: Mutex::new(workers),
                };
                engine.stop();
                engine
            }
        }
    }

    /// An engine with nothing to do: no threads, `push` refuses everything.
    fn inert(
        application: &ApplicationInfo,
        input_info: Arc<StreamInfo>,
        sink: Arc<dyn StreamSink>,
        registry: Arc<StreamRegistry>,
        factory: Arc<dyn CodecFactory>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                application_id: application.id,
                input_info,
                sink,
                registry,
                factory,
                output_contexts: BTreeMap::new(),
                stream_tracks: BTreeMap::new(),
                stream_outputs: BTreeMap::new(),
                filters: Mutex::new(HashMap::new()),
                queue_input: MediaQueue::new(),
                queue_decoded: MediaQueue::new(),
                queue_filtered: MediaQueue::new(),
                kill: AtomicBool::new(true),
                max_queue_size: 0,
                decoded_frames: AtomicU64::new(0),
                queue_full_events: AtomicU64::new(0),
                input_full_events: AtomicU64::new(0),
            }),
            encoder_count: 0,
            workers: Mutex::new(Workers::default()),
        }
    }

    /**
        Enqueue a coded packet for transcoding.

        Never blocks. Returns false when the engine is inert or stopped, or
        when the input queue is over budget (the packet is dropped).
    */
    pub fn push(&self, packet: MediaPacket) -> bool {
        if self.encoder_count == 0 {
            return false;
        }

        if self.shared.kill.load(Ordering::Relaxed) {
            return false;
        }

        if self.shared.queue_input.len() > self.shared.max_queue_size {
            let drops = self.shared.input_full_events.fetch_add(1, Ordering::Relaxed) + 1;
            if drops % QUEUE_FULL_LOG_INTERVAL == 1 {
                info!(
                    "input queue is full, please check your system (queue: {} > limit: {})",
                    self.shared.queue_input.len(),
                    self.shared.max_queue_size
                );
            }
            return false;
        }

        self.shared.queue_input.push(packet);
        true
    }

    /**
        Shut the pipeline down and join all workers. Idempotent.

        Each queue is closed only after the stage feeding it has been
        joined, so every worker drains against a closed upstream.
    */
    pub fn stop(&self) {
        self.shared.kill.store(true, Ordering::Relaxed);

        debug!(
            "waiting for transcode workers of '{}' to terminate",
            self.shared.input_info.name
        );

        let mut workers = self.workers.lock().unwrap();

        self.shared.queue_input.close();
        if let Some(handle) = workers.decode.take() {
            let _ = handle.join();
        }

        self.shared.queue_decoded.close();
        if let Some(handle) = workers.filter.take() {
            let _ = handle.join();
        }

        self.shared.queue_filtered.close();
        if let Some(handle) = workers.encode.take() {
            let _ = handle.join();
        }
    }

    /**
        Whether the pipeline is accepting input.
    */
    pub fn is_running(&self) -> bool {
        self.encoder_count > 0 && !self.shared.kill.load(Ordering::Relaxed)
    }

    /**
        Names of the output streams this engine announces.
    */
    pub fn output_stream_names(&self) -> Vec<String> {
        self.shared.stream_outputs.keys().cloned().collect()
    }

    /**
        Number of frames decoded so far. Diagnostic; relaxed reads.
    */
    pub fn decoded_frame_count(&self) -> u64 {
        self.shared.decoded_frames.load(Ordering::Relaxed)
    }

    /**
        Number of units dropped on full downstream queues. Diagnostic.
    */
    pub fn queue_full_count(&self) -> u64 {
        self.shared.queue_full_events.load(Ordering::Relaxed)
            + self.shared.input_full_events.load(Ordering::Relaxed)
    }
}

impl Drop for TranscodeStream {
    fn drop(&mut self) {
        if !self.shared.kill.load(Ordering::Relaxed) {
            self.stop();
        }
    }
}

/// Launch the three stage threads. On failure the partially-launched set is
/// handed back so the caller can wind it down again.
fn spawn_workers(
    shared: &Arc<Shared>,
    decoders: HashMap<u32, BoxedDecoder>,
    encoders: HashMap<u32, BoxedEncoder>,
) -> Result<Workers, (Workers, std::io::Error)> {
    let mut workers = Workers::default();

    let decode = thread::Builder::new().name("transcode-decode".into()).spawn({
        let shared = Arc::clone(shared);
        move || decode_worker(shared, decoders)
    });
    match decode {
        Ok(handle) => workers.decode = Some(handle),
        Err(e) => return Err((workers, e)),
    }

    let filter = thread::Builder::new().name("transcode-filter".into()).spawn({
        let shared = Arc::clone(shared);
        move || filter_worker(shared)
    });
    match filter {
        Ok(handle) => workers.filter = Some(handle),
        Err(e) => return Err((workers, e)),
    }

    let encode = thread::Builder::new().name("transcode-encode".into()).spawn({
        let shared = Arc::clone(shared);
        move || encode_worker(shared, encoders)
    });
    match encode {
        Ok(handle) => workers.encode = Some(handle),
        Err(e) => return Err((workers, e)),
    }

    Ok(workers)
}

/// Decode-side context mirroring an input track's declared parameters.
fn decode_context_for(track: &MediaTrack) -> TranscodeContext {
    match &track.params {
        TrackParams::Video(params) => TranscodeContext::decode_video(
            track.codec_id,
            track.bitrate,
            params.width,
            params.height,
            params.frame_rate,
        )
        .with_time_base(track.time_base),
        TrackParams::Audio(params) => {
            TranscodeContext::decode_audio(track.codec_id, track.bitrate, params.sample_rate)
                .with_sample_format(params.sample_format)
                .with_channels(params.channels)
                .with_time_base(track.time_base)
        }
    }
}

/// The track an output stream advertises for one encode target.
fn output_track_for(output_id: u8, context: &TranscodeContext) -> MediaTrack {
    match &context.params {
        ContextParams::Video(params) => MediaTrack::video(
            output_id as u32,
            context.codec_id,
            context.bitrate,
            context.time_base,
            params.width,
            params.height,
            params.frame_rate,
        ),
        ContextParams::Audio(params) => MediaTrack::audio(
            output_id as u32,
            context.codec_id,
            context.bitrate,
            context.time_base,
            params.sample_rate,
            params.sample_format,
            params.channels,
        ),
    }
}

fn decode_worker(shared: Arc<Shared>, mut decoders: HashMap<u32, BoxedDecoder>) {
    // First-time announcement of every output stream.
    for info in shared.stream_outputs.values() {
        shared.sink.create_stream(info);
    }

    debug!("transcode decode worker started");

    while !shared.kill.load(Ordering::Relaxed) {
        let Some(packet) = shared.queue_input.pop() else {
            continue;
        };

        let track_id = packet.track_id;
        decode_packet(&shared, &mut decoders, track_id, packet);
    }

    for info in shared.stream_outputs.values() {
        shared.sink.delete_stream(info);
    }
    shared
        .registry
        .release(shared.application_id, shared.stream_outputs.keys());

    debug!("transcode decode worker terminated");
}

fn decode_packet(
    shared: &Shared,
    decoders: &mut HashMap<u32, BoxedDecoder>,
    track_id: u32,
    packet: MediaPacket,
) {
    // No decoder: expected during warm-up and after shutdown.
    let Some(decoder) = decoders.get_mut(&track_id) else {
        return;
    };

    trace!("[#{track_id}] decoding packet (pts: {})", packet.pts);
    if let Err(e) = decoder.send_buffer(packet) {
        error!("[#{track_id}] decoder rejected packet: {e}");
        return;
    }

    loop {
        let event = match decoder.recv_buffer() {
            Ok(event) => event,
            Err(e) => {
                error!("[#{track_id}] decoder error: {e}");
                return;
            }
        };

        let mut frame = match event {
            WorkerEvent::FormatChanged(mut frame) => {
                frame.track_id = track_id;
                change_output_format(shared, &frame);
                // The format notice carries real data; it continues below as
                // an ordinary decoded frame.
                frame
            }
            WorkerEvent::Ready(frame) => frame,
            WorkerEvent::NeedsInput | WorkerEvent::EndOfStream => return,
        };
        frame.track_id = track_id;

        trace!("[#{track_id}] decoded frame (pts: {})", frame.pts);

        let decoded = shared.decoded_frames.fetch_add(1, Ordering::Relaxed) + 1;
        if decoded % DECODE_STATS_INTERVAL == 0 {
            debug!(
                "decode stats: input({}) decoded({}) filtered({})",
                shared.queue_input.len(),
                shared.queue_decoded.len(),
                shared.queue_filtered.len()
            );
        }

        if shared.queue_decoded.len() > shared.max_queue_size {
            info!("decoded frame queue is full, please check your system");
            return;
        }

        shared.queue_decoded.push(frame);
    }
}

/**
    React to a decoder's format notice for one input track: (re)build the
    filter of every matching output track against the format the decoder
    actually produced. This is the only path that creates filters.
*/
fn change_output_format(shared: &Shared, frame: &MediaFrame) {
    let Some(track) = shared.input_info.track(frame.track_id) else {
        error!(
            "cannot find input track for format change, track_id({})",
            frame.track_id
        );
        return;
    };

    for (&output_id, output_context) in &shared.output_contexts {
        if output_context.kind() != frame.kind() {
            continue;
        }

        // The input side mirrors the decoded frame, not the track's
        // declared parameters.
        let input_context = match &frame.content {
            FrameContent::Video(content) => TranscodeContext::decode_video(
                track.codec_id,
                track.bitrate,
                content.width,
                content.height,
                track.video_params().map_or(0.0, |params| params.frame_rate),
            )
            .with_pixel_format(content.format)
            .with_time_base(track.time_base),
            FrameContent::Audio(content) => {
                TranscodeContext::decode_audio(track.codec_id, track.bitrate, content.sample_rate)
                    .with_sample_format(content.format)
                    .with_channels(content.channels)
                    .with_time_base(track.time_base)
            }
        };

        match shared
            .factory
            .create_filter(track, &input_context, output_context)
        {
            Ok(filter) => {
                shared
                    .filters
                    .lock()
                    .unwrap()
                    .insert(output_id, Arc::new(Mutex::new(filter)));
                debug!("filter rebuilt for output track {output_id:#04x}");
            }
            Err(e) => error!("failed to create filter for output track {output_id:#04x}: {e}"),
        }
    }
}

fn filter_worker(shared: Arc<Shared>) {
    debug!("transcode filter worker started");

    while !shared.kill.load(Ordering::Relaxed) {
        let Some(frame) = shared.queue_decoded.pop() else {
            continue;
        };

        run_filters(&shared, frame);
    }

    debug!("transcode filter worker terminated");
}

fn run_filters(shared: &Shared, frame: MediaFrame) {
    for (&output_id, context) in &shared.output_contexts {
        if context.kind() != frame.kind() {
            continue;
        }

        // Clone the entry out so the map lock is not held during filtering.
        let filter = shared.filters.lock().unwrap().get(&output_id).cloned();

        // No filter yet: frames can arrive before the first format notice
        // has built one.
        let Some(filter) = filter else {
            continue;
        };

        let mut filter = filter.lock().unwrap();
        filter_frame(shared, &mut **filter, output_id, frame.clone());
    }
}

fn filter_frame(
    shared: &Shared,
    filter: &mut dyn CodecWorker<In = MediaFrame, Out = MediaFrame>,
    output_id: u8,
    frame: MediaFrame,
) {
    trace!("[{output_id:#04x}] filtering frame (pts: {})", frame.pts);
    if let Err(e) = filter.send_buffer(frame) {
        error!("[{output_id:#04x}] filter rejected frame: {e}");
        return;
    }

    loop {
        match filter.recv_buffer() {
            Ok(WorkerEvent::Ready(mut filtered) | WorkerEvent::FormatChanged(mut filtered)) => {
                filtered.track_id = output_id as u32;

                if shared.queue_filtered.len() > shared.max_queue_size {
                    let drops = shared.queue_full_events.fetch_add(1, Ordering::Relaxed) + 1;
                    if drops % QUEUE_FULL_LOG_INTERVAL == 1 {
                        info!(
                            "filtered frame queue is full, please decrease encoding options \
                             (resolution, bitrate, framerate)"
                        );
                    }
                    return;
                }

                shared.queue_filtered.push(filtered);
            }
            Ok(WorkerEvent::NeedsInput | WorkerEvent::EndOfStream) => return,
            Err(e) => {
                error!("[{output_id:#04x}] filter error: {e}");
                return;
            }
        }
    }
}

fn encode_worker(shared: Arc<Shared>, mut encoders: HashMap<u32, BoxedEncoder>) {
    debug!("transcode encode worker started");

    while !shared.kill.load(Ordering::Relaxed) {
        let Some(frame) = shared.queue_filtered.pop() else {
            continue;
        };

        let track_id = frame.track_id;
        encode_frame(&shared, &mut encoders, track_id, frame);
    }

    debug!("transcode encode worker terminated");
}

fn encode_frame(
    shared: &Shared,
    encoders: &mut HashMap<u32, BoxedEncoder>,
    track_id: u32,
    frame: MediaFrame,
) {
    let Some(encoder) = encoders.get_mut(&track_id) else {
        return;
    };

    trace!("[#{track_id}] encoding frame (pts: {})", frame.pts);
    if let Err(e) = encoder.send_buffer(frame) {
        error!("[#{track_id}] encoder rejected frame: {e}");
        return;
    }

    loop {
        match encoder.recv_buffer() {
            Ok(WorkerEvent::Ready(mut packet) | WorkerEvent::FormatChanged(mut packet)) => {
                packet.track_id = track_id;
                trace!("[#{track_id}] encoded packet (pts: {})", packet.pts);
                send_frame(shared, packet);
            }
            Ok(WorkerEvent::NeedsInput | WorkerEvent::EndOfStream) => return,
            // Terminal for this frame's drain, not for the worker.
            Err(e) => {
                error!("[#{track_id}] encoder error: {e}");
                return;
            }
        }
    }
}

/**
    Fan an encoded packet out to every output stream whose routing list
    carries its track. Each stream receives its own deep clone; once a packet
    crosses the engine boundary it is a value, never shared.
*/
fn send_frame(shared: &Shared, packet: MediaPacket) {
    let track_id = packet.track_id as u8;

    for (name, info) in &shared.stream_outputs {
        let Some(tracks) = shared.stream_tracks.get(name) else {
            continue;
        };
        if !tracks.contains(&track_id) {
            continue;
        }

        shared.sink.send_frame(info, packet.clone());
    }
}
