use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundFormat {
    /// Linear PCM, platform endian
    PCM,
    /// ADPCM
    ADPCM,
    /// MP3
    MP3,
    /// Linear PCM, little endian
    PCMLittleEndian,
    /// Nellymoser 16kHz mono
    Nellymoser16kHz,
    /// Nellymoser 8kHz mono
    Nellymoser8kHz,
    /// Nellymoser
    Nellymoser,
    /// G.711 A-law
    G711ALaw,
    /// G.711 mu-law
    G711MuLaw,
    /// AAC
    AAC,
    /// Speex
    Speex,
    /// MP3 8kHz
    MP38kHz,
    /// Device specific
    DeviceSpecific,
}

impl SoundFormat {
    pub fn bits(&self) -> u8 {
        match self {
            SoundFormat::PCM => 0,
            SoundFormat::ADPCM => 1,
            SoundFormat::MP3 => 2,
            SoundFormat::PCMLittleEndian => 3,
            SoundFormat::Nellymoser16kHz => 4,
            SoundFormat::Nellymoser8kHz => 5,
            SoundFormat::Nellymoser => 6,
            SoundFormat::G711ALaw => 7,
            SoundFormat::G711MuLaw => 8,
            SoundFormat::AAC => 10,
            SoundFormat::Speex => 11,
            SoundFormat::MP38kHz => 14,
            SoundFormat::DeviceSpecific => 15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundRate {
    Rate5_5kHz,
    Rate11kHz,
    Rate22kHz,
    Rate44kHz,
}

impl SoundRate {
    pub fn bits(&self) -> u8 {
        match self {
            SoundRate::Rate5_5kHz => 0,
            SoundRate::Rate11kHz => 1,
            SoundRate::Rate22kHz => 2,
            SoundRate::Rate44kHz => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundSize {
    Bits8,
    Bits16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundType {
    Mono,
    Stereo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AacPacketType {
    SequenceHeader,
    Raw,
}

impl AacPacketType {
    pub fn as_u8(&self) -> u8 {
        match self {
            AacPacketType::SequenceHeader => 0,
            AacPacketType::Raw => 1,
        }
    }
}

/// First byte of an audio tag
pub fn audio_tag_byte(format: SoundFormat, rate: SoundRate, size: SoundSize, sound_type: SoundType) -> u8 {
    let size_bit = match size {
        SoundSize::Bits8 => 0,
        SoundSize::Bits16 => 1,
    };
    let type_bit = match sound_type {
        SoundType::Mono => 0,
        SoundType::Stereo => 1,
    };
    format.bits() << 4 | rate.bits() << 2 | size_bit << 1 | type_bit
}

/// AAC tags always declare 44 kHz, 16-bit stereo; the real parameters
/// travel in the AudioSpecificConfig.
pub fn aac_tag_header(packet_type: AacPacketType) -> [u8; 2] {
    [
        audio_tag_byte(SoundFormat::AAC, SoundRate::Rate44kHz, SoundSize::Bits16, SoundType::Stereo),
        packet_type.as_u8(),
    ]
}

/// Sampling frequencies addressable by a 4-bit index
pub const AAC_SAMPLE_RATES: [u32; 13] = [
    96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000, 7350,
];

/// AAC Low Complexity
pub const AAC_OBJECT_TYPE_LC: u8 = 2;

/// Two-byte AudioSpecificConfig (ISO 14496-3 1.6.2.1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioSpecificConfig {
    /// Audio object type
    pub object_type: u8,

    /// Sampling frequency index
    pub frequency_index: u8,

    /// Channel configuration
    pub channel_config: u8,
}

impl AudioSpecificConfig {
    pub fn new(object_type: u8, sample_rate: u32, channels: u8) -> Result<Self> {
        let frequency_index = AAC_SAMPLE_RATES
            .iter()
            .position(|&rate| rate == sample_rate)
            .ok_or_else(|| Error::media(format!("No AAC frequency index for {} Hz", sample_rate)))?;
        if object_type == 0 || object_type > 30 {
            return Err(Error::media(format!("Unsupported AAC object type {}", object_type)));
        }
        if channels == 0 || channels > 7 {
            return Err(Error::media(format!("Unsupported AAC channel count {}", channels)));
        }

        Ok(AudioSpecificConfig {
            object_type,
            frequency_index: frequency_index as u8,
            channel_config: channels,
        })
    }

    /// 5 bits object type, 4 bits frequency index, 4 bits channels, 3 zero bits
    pub fn to_bytes(&self) -> [u8; 2] {
        [
            (self.object_type << 3) | (self.frequency_index >> 1),
            ((self.frequency_index & 0x01) << 7) | ((self.channel_config & 0x0F) << 3),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aac_tag_header() {
        assert_eq!(aac_tag_header(AacPacketType::SequenceHeader), [0xAF, 0x00]);
        assert_eq!(aac_tag_header(AacPacketType::Raw), [0xAF, 0x01]);
    }

    #[test]
    fn test_specific_config_bytes() {
        // AAC-LC, 44.1 kHz, stereo
        let config = AudioSpecificConfig::new(AAC_OBJECT_TYPE_LC, 44100, 2).unwrap();
        assert_eq!(config.to_bytes(), [0x12, 0x10]);

        // AAC-LC, 48 kHz, mono
        let config = AudioSpecificConfig::new(AAC_OBJECT_TYPE_LC, 48000, 1).unwrap();
        assert_eq!(config.to_bytes(), [0x11, 0x88]);
        assert_eq!(config.frequency_index, 3);
    }

    #[test]
    fn test_specific_config_rejects_odd_rates() {
        let err = AudioSpecificConfig::new(AAC_OBJECT_TYPE_LC, 44000, 2).unwrap_err();
        assert!(matches!(err, Error::Media(_)));
        assert!(AudioSpecificConfig::new(AAC_OBJECT_TYPE_LC, 44100, 0).is_err());
    }

    #[test]
    fn test_audio_tag_byte() {
        assert_eq!(
            audio_tag_byte(SoundFormat::MP3, SoundRate::Rate22kHz, SoundSize::Bits16, SoundType::Mono),
            0x2A
        );
        assert_eq!(SoundFormat::Speex.bits(), 11);
    }
}
