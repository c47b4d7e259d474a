/*!
    Decode and encode target descriptions.
*/

use media_types::{ChannelLayout, CodecId, MediaKind, PixelFormat, Rational, SampleFormat};

/**
    Video-specific context parameters.
*/
#[derive(Clone, Debug)]
pub struct VideoContextParams {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Frame rate in frames per second.
    pub frame_rate: f64,
    /// Pixel format.
    pub pixel_format: PixelFormat,
}

/**
    Audio-specific context parameters.
*/
#[derive(Clone, Debug)]
pub struct AudioContextParams {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Sample format.
    pub sample_format: SampleFormat,
    /// Channel layout.
    pub channels: ChannelLayout,
}

/**
    Kind-specific context parameters.
*/
#[derive(Clone, Debug)]
pub enum ContextParams {
    Video(VideoContextParams),
    Audio(AudioContextParams),
}

/**
    Immutable description of a decode source or encode target.

    Handed to the codec factory when creating a worker. Decoding contexts
    describe what arrives; encoding contexts describe what must be produced.
*/
#[derive(Clone, Debug)]
pub struct TranscodeContext {
    /// True for encode targets, false for decode sources.
    pub encoding: bool,
    /// Codec this context speaks.
    pub codec_id: CodecId,
    /// Bitrate in bits per second (target for encoders, hint for decoders).
    pub bitrate: u64,
    /// Time base for timestamps.
    pub time_base: Rational,
    /// Kind-specific parameters.
    pub params: ContextParams,
}

impl TranscodeContext {
    /**
        Describe a video decode source.

        The pixel format defaults to YUV 4:2:0 until the decoder reports the
        actual format.
    */
    pub fn decode_video(
        codec_id: CodecId,
        bitrate: u64,
        width: u32,
        height: u32,
        frame_rate: f64,
    ) -> Self {
        Self {
            encoding: false,
            codec_id,
            bitrate,
            time_base: Rational::new(1, 90000),
            params: ContextParams::Video(VideoContextParams {
                width,
                height,
                frame_rate,
                pixel_format: PixelFormat::Yuv420p,
            }),
        }
    }

    /**
        Describe a video encode target.
    */
    pub fn encode_video(
        codec_id: CodecId,
        bitrate: u64,
        width: u32,
        height: u32,
        frame_rate: f64,
    ) -> Self {
        Self {
            encoding: true,
            ..Self::decode_video(codec_id, bitrate, width, height, frame_rate)
        }
    }

    /**
        Describe an audio decode source.

        Sample format and channel layout default to S16 stereo until the
        decoder reports the actual format.
    */
    pub fn decode_audio(codec_id: CodecId, bitrate: u64, sample_rate: u32) -> Self {
        Self {
            encoding: false,
            codec_id,
            bitrate,
            time_base: Rational::new(1, sample_rate.max(1) as i32),
            params: ContextParams::Audio(AudioContextParams {
                sample_rate,
                sample_format: SampleFormat::S16,
                channels: ChannelLayout::Stereo,
            }),
        }
    }

    /**
        Describe an audio encode target.
    */
    pub fn encode_audio(codec_id: CodecId, bitrate: u64, sample_rate: u32) -> Self {
        Self {
            encoding: true,
            ..Self::decode_audio(codec_id, bitrate, sample_rate)
        }
    }

    /**
        Set the time base.
    */
    pub fn with_time_base(mut self, time_base: Rational) -> Self {
        self.time_base = time_base;
        self
    }

    /**
        Set the pixel format. No effect on audio contexts.
    */
    pub fn with_pixel_format(mut self, format: PixelFormat) -> Self {
        if let ContextParams::Video(params) = &mut self.params {
            params.pixel_format = format;
        }
        self
    }

    /**
        Set the sample format. No effect on video contexts.
    */
    pub fn with_sample_format(mut self, format: SampleFormat) -> Self {
        if let ContextParams::Audio(params) = &mut self.params {
            params.sample_format = format;
        }
        self
    }

    /**
        Set the channel layout. No effect on video contexts.
    */
    pub fn with_channels(mut self, channels: ChannelLayout) -> Self {
        if let ContextParams::Audio(params) = &mut self.params {
            params.channels = channels;
        }
        self
    }

    /**
        Returns the media kind this context describes.
    */
    pub fn kind(&self) -> MediaKind {
        match self.params {
            ContextParams::Video(_) => MediaKind::Video,
            ContextParams::Audio(_) => MediaKind::Audio,
        }
    }

    /**
        Returns the video parameters, if this is a video context.
    */
    pub fn video_params(&self) -> Option<&VideoContextParams> {
        match &self.params {
            ContextParams::Video(params) => Some(params),
            ContextParams::Audio(_) => None,
        }
    }

    /**
        Returns the audio parameters, if this is an audio context.
    */
    pub fn audio_params(&self) -> Option<&AudioContextParams> {
        match &self.params {
            ContextParams::Audio(params) => Some(params),
            ContextParams::Video(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_constructors_set_the_flag() {
        let decode = TranscodeContext::decode_video(CodecId::H264, 0, 1280, 720, 30.0);
        let encode = TranscodeContext::encode_video(CodecId::Vp8, 1_000_000, 640, 360, 30.0);

        assert!(!decode.encoding);
        assert!(encode.encoding);
        assert_eq!(encode.kind(), MediaKind::Video);
    }

    #[test]
    fn audio_time_base_defaults_to_sample_rate() {
        let context = TranscodeContext::encode_audio(CodecId::Aac, 128_000, 44100);
        assert_eq!(context.time_base, Rational::new(1, 44100));
        assert_eq!(context.audio_params().unwrap().sample_rate, 44100);
    }

    #[test]
    fn builders_only_touch_matching_kind() {
        let context = TranscodeContext::encode_video(CodecId::H264, 0, 640, 360, 25.0)
            .with_sample_format(SampleFormat::F32)
            .with_pixel_format(PixelFormat::Nv12);
        let params = context.video_params().unwrap();
        assert_eq!(params.pixel_format, PixelFormat::Nv12);

        let context = TranscodeContext::encode_audio(CodecId::Opus, 96_000, 48000)
            .with_sample_format(SampleFormat::F32)
            .with_channels(ChannelLayout::Mono)
            .with_pixel_format(PixelFormat::Nv12);
        let params = context.audio_params().unwrap();
        assert_eq!(params.sample_format, SampleFormat::F32);
        assert_eq!(params.channels, ChannelLayout::Mono);
    }
}
