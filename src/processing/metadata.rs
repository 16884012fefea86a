use log::debug;
use crate::amf::{Amf0Object, Amf0Value};
use crate::processing::audio::SoundFormat;
use crate::processing::format::{AudioFormat, VideoFormat};
use crate::processing::video::{AvcDecoderConfig, AVC_CODEC_ID};

/// Encoder-reported stream properties carried by `onMetaData`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamMetadata {
    // Video properties
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub video_data_rate: Option<f64>,
    pub framerate: Option<f64>,
    pub video_codec_id: Option<f64>,
    pub avc_profile: Option<f64>,
    pub avc_level: Option<f64>,

    // Audio properties
    pub audio_data_rate: Option<f64>,
    pub audio_sample_rate: Option<f64>,
    pub audio_sample_size: Option<f64>,
    pub stereo: Option<bool>,
    pub audio_codec_id: Option<f64>,

    pub duration: Option<f64>,
    pub encoder: Option<String>,
}

impl StreamMetadata {
    /// Video fields for an H.264 stream. Profile and level come from the
    /// format's avcC record when it parses.
    pub fn for_video(format: &VideoFormat, bitrate_kbps: f64, framerate: f64) -> Self {
        let config = match AvcDecoderConfig::parse(&format.decoder_config) {
            Ok(config) => Some(config),
            Err(e) => {
                debug!("No profile metadata: {}", e);
                None
            }
        };
        StreamMetadata {
            width: Some(format.width as f64),
            height: Some(format.height as f64),
            video_data_rate: Some(bitrate_kbps),
            framerate: Some(framerate),
            video_codec_id: Some(AVC_CODEC_ID as f64),
            avc_profile: config.as_ref().map(|config| config.profile as f64),
            avc_level: config.as_ref().map(|config| config.level as f64),
            ..Default::default()
        }
    }

    /// Audio fields for an AAC stream
    pub fn for_audio(format: &AudioFormat, bitrate_kbps: f64) -> Self {
        StreamMetadata {
            audio_data_rate: Some(bitrate_kbps),
            audio_sample_rate: Some(format.sample_rate as f64),
            audio_sample_size: Some(16.0),
            stereo: Some(format.channels > 1),
            audio_codec_id: Some(SoundFormat::AAC.bits() as f64),
            ..Default::default()
        }
    }

    /// Fill fields from `other`; values set in `other` win
    pub fn merge(&mut self, other: &StreamMetadata) {
        fn take<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
            if value.is_some() {
                slot.clone_from(value);
            }
        }
        take(&mut self.width, &other.width);
        take(&mut self.height, &other.height);
        take(&mut self.video_data_rate, &other.video_data_rate);
        take(&mut self.framerate, &other.framerate);
        take(&mut self.video_codec_id, &other.video_codec_id);
        take(&mut self.avc_profile, &other.avc_profile);
        take(&mut self.avc_level, &other.avc_level);
        take(&mut self.audio_data_rate, &other.audio_data_rate);
        take(&mut self.audio_sample_rate, &other.audio_sample_rate);
        take(&mut self.audio_sample_size, &other.audio_sample_size);
        take(&mut self.stereo, &other.stereo);
        take(&mut self.audio_codec_id, &other.audio_codec_id);
        take(&mut self.duration, &other.duration);
        take(&mut self.encoder, &other.encoder);
    }

    pub fn has_video(&self) -> bool {
        self.video_codec_id.is_some() || self.width.is_some()
    }

    pub fn has_audio(&self) -> bool {
        self.audio_codec_id.is_some() || self.audio_sample_rate.is_some()
    }

    /// Create AMF object for sending; unset fields are omitted
    pub fn to_amf(&self) -> Amf0Object {
        let mut obj = Amf0Object::new();
        let mut number = |key: &str, value: Option<f64>| {
            if let Some(value) = value {
                obj.insert(key.to_string(), Amf0Value::Number(value));
            }
        };

        number("duration", self.duration);
        number("width", self.width);
        number("height", self.height);
        number("videodatarate", self.video_data_rate);
        number("framerate", self.framerate);
        number("videocodecid", self.video_codec_id);
        number("avcprofile", self.avc_profile);
        number("avclevel", self.avc_level);
        number("audiodatarate", self.audio_data_rate);
        number("audiosamplerate", self.audio_sample_rate);
        number("audiosamplesize", self.audio_sample_size);

        if let Some(stereo) = self.stereo {
            obj.insert("stereo".to_string(), Amf0Value::Boolean(stereo));
        }
        if let Some(codec) = self.audio_codec_id {
            obj.insert("audiocodecid".to_string(), Amf0Value::Number(codec));
        }
        if let Some(ref encoder) = self.encoder {
            obj.insert("encoder".to_string(), Amf0Value::string(encoder.as_str()));
        }

        obj
    }
}
