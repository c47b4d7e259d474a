/*!
    Output track allocation and the stream routing table.

    Built once when an engine is constructed: encode profiles are turned into
    output contexts keyed by small track ids, and output stream templates are
    resolved into per-stream track lists. The result is read-only for the
    life of the engine.
*/

use std::collections::{BTreeMap, HashMap};

use log::warn;

use media_types::{CodecId, MediaKind};

use crate::config::{ApplicationInfo, parse_bitrate};
use crate::context::TranscodeContext;
use crate::registry::StreamRegistry;

/// Substituted with the input stream's name in output stream templates.
pub const ORIGIN_STREAM_NAME_MACRO: &str = "${OriginStreamName}";

/// First output track id handed to video encoders.
pub const FIRST_VIDEO_TRACK_ID: u8 = 0x60;
/// First output track id handed to audio encoders. Also the (exclusive)
/// upper bound of the video range.
pub const FIRST_AUDIO_TRACK_ID: u8 = 0x70;
/// Exclusive upper bound of the audio range.
pub const TRACK_ID_RANGE_END: u8 = 0x80;

/**
    Reserves output track ids from two disjoint 16-id ranges.

    The 0x60..0x7F window sits in the RTP dynamic payload-type space, which
    keeps output ids from ever colliding with source-assigned input ids.
*/
#[derive(Debug)]
pub struct TrackAllocator {
    next_video: u8,
    next_audio: u8,
}

impl TrackAllocator {
    pub fn new() -> Self {
        Self {
            next_video: FIRST_VIDEO_TRACK_ID,
            next_audio: FIRST_AUDIO_TRACK_ID,
        }
    }

    /**
        Reserve the next id of the given kind.

        Returns `None` once the kind's 16-id range is exhausted; callers
        skip the surplus target and keep going.
    */
    pub fn allocate(&mut self, kind: MediaKind) -> Option<u8> {
        match kind {
            MediaKind::Video => {
                if self.next_video >= FIRST_AUDIO_TRACK_ID {
                    return None;
                }
                let id = self.next_video;
                self.next_video += 1;
                Some(id)
            }
            MediaKind::Audio => {
                if self.next_audio >= TRACK_ID_RANGE_END {
                    return None;
                }
                let id = self.next_audio;
                self.next_audio += 1;
                Some(id)
            }
        }
    }
}

impl Default for TrackAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/**
    The resolved routing of an engine.

    `output_contexts` holds one encode target per allocated output track id;
    `stream_tracks` lists, per concrete output stream name, the output track
    ids it carries. Every id in any `stream_tracks` entry is a key of
    `output_contexts`, and every context is referenced by at least one
    stream.
*/
#[derive(Debug, Default)]
pub struct RoutingPlan {
    pub output_contexts: BTreeMap<u8, TranscodeContext>,
    pub stream_tracks: BTreeMap<String, Vec<u8>>,
}

impl RoutingPlan {
    /**
        Resolve the application's profile/stream matrix for one input stream.

        Stream names that collide with an already-live name under the same
        application are dropped; the names that survive are registered in
        `registry` and must be released again on engine teardown.
    */
    pub fn build(
        application: &ApplicationInfo,
        origin_stream_name: &str,
        registry: &StreamRegistry,
    ) -> Self {
        let mut allocator = TrackAllocator::new();
        let mut output_contexts = BTreeMap::new();
        let mut profile_tracks: HashMap<&str, Vec<u8>> = HashMap::new();

        for profile in &application.encodes {
            if !profile.active {
                continue;
            }

            // A profile contributes the tracks it can actually allocate:
            // video first, then audio.
            let mut tracks = Vec::new();

            if let Some(video) = &profile.video
                && video.active
            {
                let context = TranscodeContext::encode_video(
                    codec_for(&video.codec, &profile.name),
                    bitrate_for(&video.bitrate, &profile.name),
                    video.width,
                    video.height,
                    video.framerate,
                );
                match allocator.allocate(MediaKind::Video) {
                    Some(id) => {
                        output_contexts.insert(id, context);
                        tracks.push(id);
                    }
                    None => warn!(
                        "no video track ids left for profile '{}' (16 video encoders max)",
                        profile.name
                    ),
                }
            }

            if let Some(audio) = &profile.audio
                && audio.active
            {
                let context = TranscodeContext::encode_audio(
                    codec_for(&audio.codec, &profile.name),
                    bitrate_for(&audio.bitrate, &profile.name),
                    audio.samplerate,
                );
                match allocator.allocate(MediaKind::Audio) {
                    Some(id) => {
                        output_contexts.insert(id, context);
                        tracks.push(id);
                    }
                    None => warn!(
                        "no audio track ids left for profile '{}' (16 audio encoders max)",
                        profile.name
                    ),
                }
            }

            if !tracks.is_empty() {
                profile_tracks.insert(profile.name.as_str(), tracks);
            }
        }

        let mut stream_tracks = BTreeMap::new();

        for stream in &application.streams {
            if !stream.name.contains(ORIGIN_STREAM_NAME_MACRO) {
                warn!(
                    "stream template '{}' does not use the {} macro",
                    stream.name, ORIGIN_STREAM_NAME_MACRO
                );
            }
            let name = stream
                .name
                .replace(ORIGIN_STREAM_NAME_MACRO, origin_stream_name);

            if !registry.register(application.id, &name) {
                warn!("output stream with the same name ('{name}') already exists");
                continue;
            }

            let mut tracks = Vec::new();
            for profile_name in &stream.profiles {
                match profile_tracks.get(profile_name.as_str()) {
                    Some(ids) => tracks.extend_from_slice(ids),
                    None => warn!(
                        "stream '{name}' references profile '{profile_name}', which is not configured"
                    ),
                }
            }

            if tracks.is_empty() {
                warn!("output stream '{name}' resolved to no tracks, dropping it");
                registry.release(application.id, [&name]);
                continue;
            }

            stream_tracks.insert(name, tracks);
        }

        // The allocator is monotonic; contexts no stream references are
        // simply dead and get collected here.
        output_contexts.retain(|id, _| stream_tracks.values().any(|tracks| tracks.contains(id)));

        Self {
            output_contexts,
            stream_tracks,
        }
    }
}

fn codec_for(name: &str, profile: &str) -> CodecId {
    name.parse().unwrap_or_else(|_| {
        warn!("profile '{profile}' names unknown codec '{name}'");
        CodecId::None
    })
}

fn bitrate_for(literal: &str, profile: &str) -> u64 {
    parse_bitrate(literal).unwrap_or_else(|| {
        warn!("profile '{profile}' has unparseable bitrate '{literal}'");
        0
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AudioEncodeProfile, EncodeProfile, OutputStreamConfig, VideoEncodeProfile};

    fn video_profile(codec: &str, bitrate: &str) -> VideoEncodeProfile {
        VideoEncodeProfile {
            active: true,
            codec: codec.to_string(),
            bitrate: bitrate.to_string(),
            width: 1280,
            height: 720,
            framerate: 30.0,
        }
    }

    fn audio_profile(codec: &str, bitrate: &str) -> AudioEncodeProfile {
        AudioEncodeProfile {
            active: true,
            codec: codec.to_string(),
            bitrate: bitrate.to_string(),
            samplerate: 48000,
        }
    }

    fn profile(name: &str, video: bool, audio: bool) -> EncodeProfile {
        EncodeProfile {
            name: name.to_string(),
            active: true,
            video: video.then(|| video_profile("h264", "1000k")),
            audio: audio.then(|| audio_profile("aac", "128k")),
        }
    }

    fn stream(template: &str, profiles: &[&str]) -> OutputStreamConfig {
        OutputStreamConfig {
            name: template.to_string(),
            profiles: profiles.iter().map(|p| p.to_string()).collect(),
        }
    }

    fn application(
        encodes: Vec<EncodeProfile>,
        streams: Vec<OutputStreamConfig>,
    ) -> ApplicationInfo {
        ApplicationInfo {
            id: 1,
            name: "app".to_string(),
            encodes,
            streams,
        }
    }

    #[test]
    fn allocator_ranges_are_disjoint() {
        let mut allocator = TrackAllocator::new();
        assert_eq!(allocator.allocate(MediaKind::Video), Some(0x60));
        assert_eq!(allocator.allocate(MediaKind::Audio), Some(0x70));
        assert_eq!(allocator.allocate(MediaKind::Video), Some(0x61));
        assert_eq!(allocator.allocate(MediaKind::Audio), Some(0x71));
    }

    #[test]
    fn allocator_exhausts_after_sixteen_per_kind() {
        let mut allocator = TrackAllocator::new();
        for n in 0..15 {
            assert_eq!(allocator.allocate(MediaKind::Video), Some(0x60 + n));
        }
        // The sixteenth id is the last of the range.
        assert_eq!(allocator.allocate(MediaKind::Video), Some(0x6F));
        assert_eq!(allocator.allocate(MediaKind::Video), None);

        // Audio has its own budget.
        assert_eq!(allocator.allocate(MediaKind::Audio), Some(0x70));
    }

    #[test]
    fn plan_routes_profile_tracks_to_streams() {
        let registry = StreamRegistry::new();
        let app = application(
            vec![profile("P1", true, true)],
            vec![
                stream("sdA_${OriginStreamName}", &["P1"]),
                stream("sdB_${OriginStreamName}", &["P1"]),
            ],
        );

        let plan = RoutingPlan::build(&app, "cam", &registry);

        assert_eq!(plan.output_contexts.len(), 2);
        assert_eq!(plan.stream_tracks["sdA_cam"], vec![0x60, 0x70]);
        assert_eq!(plan.stream_tracks["sdB_cam"], vec![0x60, 0x70]);
        assert!(registry.contains(1, "sdA_cam"));
        assert!(registry.contains(1, "sdB_cam"));
    }

    #[test]
    fn unreferenced_profile_contexts_are_collected() {
        let registry = StreamRegistry::new();
        let app = application(
            vec![profile("P1", true, false), profile("P2", true, false)],
            vec![stream("live_${OriginStreamName}", &["P1"])],
        );

        let plan = RoutingPlan::build(&app, "cam", &registry);

        // P2's context (0x61) is allocated but unreferenced, so collected.
        assert_eq!(
            plan.output_contexts.keys().copied().collect::<Vec<_>>(),
            vec![0x60]
        );
    }

    #[test]
    fn unknown_profile_reference_is_skipped() {
        let registry = StreamRegistry::new();
        let app = application(
            vec![profile("P1", true, false)],
            vec![stream("live_${OriginStreamName}", &["P1", "Pmissing"])],
        );

        let plan = RoutingPlan::build(&app, "cam", &registry);

        assert_eq!(plan.stream_tracks["live_cam"], vec![0x60]);
    }

    #[test]
    fn video_only_profile_contributes_one_track() {
        let registry = StreamRegistry::new();
        let app = application(
            vec![profile("P1", true, false), profile("P2", false, true)],
            vec![stream("live_${OriginStreamName}", &["P1", "P2"])],
        );

        let plan = RoutingPlan::build(&app, "cam", &registry);

        assert_eq!(plan.stream_tracks["live_cam"], vec![0x60, 0x70]);
    }

    #[test]
    fn colliding_stream_name_is_dropped() {
        let registry = StreamRegistry::new();
        registry.register(1, "live_cam");

        let app = application(
            vec![profile("P1", true, true)],
            vec![stream("live_${OriginStreamName}", &["P1"])],
        );

        let plan = RoutingPlan::build(&app, "cam", &registry);

        assert!(plan.stream_tracks.is_empty());
        // The colliding stream was the only reference, so everything died.
        assert!(plan.output_contexts.is_empty());
    }

    #[test]
    fn stream_with_no_resolved_tracks_is_unregistered() {
        let registry = StreamRegistry::new();
        let app = application(
            vec![],
            vec![stream("live_${OriginStreamName}", &["Pmissing"])],
        );

        let plan = RoutingPlan::build(&app, "cam", &registry);

        assert!(plan.stream_tracks.is_empty());
        assert!(!registry.contains(1, "live_cam"));
    }

    #[test]
    fn inactive_profiles_allocate_nothing() {
        let registry = StreamRegistry::new();
        let mut inactive = profile("P1", true, true);
        inactive.active = false;

        let app = application(
            vec![inactive],
            vec![stream("live_${OriginStreamName}", &["P1"])],
        );

        let plan = RoutingPlan::build(&app, "cam", &registry);

        assert!(plan.output_contexts.is_empty());
        assert!(plan.stream_tracks.is_empty());
    }
}
