use std::time::Duration;
use crate::processing::audio::AudioSpecificConfig;
use crate::processing::video::AvcDecoderConfig;
use crate::Result;

/// Video format description reported by an H.264 encoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFormat {
    /// Encoded avcC record
    pub decoder_config: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl VideoFormat {
    pub fn new(config: &AvcDecoderConfig, width: u32, height: u32) -> Result<Self> {
        Ok(VideoFormat {
            decoder_config: config.encode()?,
            width,
            height,
        })
    }
}

/// Audio format description reported by an AAC encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u8,
    /// MPEG-4 audio object type (2 for AAC-LC)
    pub object_type: u8,
}

impl AudioFormat {
    pub fn specific_config(&self) -> Result<AudioSpecificConfig> {
        AudioSpecificConfig::new(self.object_type, self.sample_rate, self.channels)
    }
}

/// One encoded H.264 access unit
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Length-prefixed NAL units
    pub data: Vec<u8>,
    pub pts: Duration,
    /// Present only when frames are reordered
    pub dts: Option<Duration>,
    pub keyframe: bool,
    /// Set on the first frame and whenever the encoder reconfigures
    pub format: Option<VideoFormat>,
}

/// One encoded AAC access unit
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw AAC frame without ADTS header
    pub data: Vec<u8>,
    pub pts: Duration,
    /// Set on the first frame and whenever the encoder reconfigures
    pub format: Option<AudioFormat>,
}
