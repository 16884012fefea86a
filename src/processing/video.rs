use crate::{ByteBuffer, Error, Result};

/// FLV codec id for H.264
pub const AVC_CODEC_ID: u8 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameType {
    /// Keyframe (I-frame)
    Keyframe,
    /// Inter-frame (P-frame)
    InterFrame,
}

impl FrameType {
    pub fn bits(&self) -> u8 {
        match self {
            FrameType::Keyframe => 1,
            FrameType::InterFrame => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvcPacketType {
    SequenceHeader,
    Nalu,
}

impl AvcPacketType {
    pub fn as_u8(&self) -> u8 {
        match self {
            AvcPacketType::SequenceHeader => 0,
            AvcPacketType::Nalu => 1,
        }
    }
}

/// Five-byte AVC video tag header: frame type and codec, packet type,
/// then a signed 24-bit composition time in milliseconds.
pub fn avc_tag_header(frame_type: FrameType, packet_type: AvcPacketType, composition_time: i32) -> [u8; 5] {
    let cts = composition_time.to_be_bytes();
    [
        frame_type.bits() << 4 | AVC_CODEC_ID,
        packet_type.as_u8(),
        cts[1],
        cts[2],
        cts[3],
    ]
}

/// AVCDecoderConfigurationRecord (ISO 14496-15 avcC)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvcDecoderConfig {
    /// Configuration version, always 1
    pub version: u8,

    /// AVC profile
    pub profile: u8,

    /// AVC profile compatibility
    pub profile_compat: u8,

    /// AVC level
    pub level: u8,

    /// Bytes in each NAL unit length prefix (1, 2 or 4)
    pub nal_length_size: u8,

    /// SPS (Sequence Parameter Sets)
    pub sps: Vec<Vec<u8>>,

    /// PPS (Picture Parameter Sets)
    pub pps: Vec<Vec<u8>>,
}

impl AvcDecoderConfig {
    /// Build a record from raw SPS and PPS NAL units, without start codes.
    /// Profile and level come from the first SPS.
    pub fn from_parameter_sets(sps: Vec<Vec<u8>>, pps: Vec<Vec<u8>>) -> Result<Self> {
        let first = sps
            .first()
            .ok_or_else(|| Error::media("AVC configuration needs at least one SPS"))?;
        if first.len() < 4 {
            return Err(Error::media(format!("SPS of {} bytes is too short", first.len())));
        }
        if pps.is_empty() {
            return Err(Error::media("AVC configuration needs at least one PPS"));
        }
        if sps.len() > 31 || pps.len() > 255 {
            return Err(Error::media("Too many parameter sets"));
        }

        Ok(AvcDecoderConfig {
            version: 1,
            profile: first[1],
            profile_compat: first[2],
            level: first[3],
            nal_length_size: 4,
            sps,
            pps,
        })
    }

    /// Parse AVC video configuration
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 7 {
            return Err(Error::media("AVC config too short"));
        }
        let mut buffer = ByteBuffer::new(data.to_vec());
        let truncated = |_| Error::media("AVC config truncated");

        let version = buffer.read_u8().map_err(truncated)?;
        if version != 1 {
            return Err(Error::media(format!("Unsupported avcC version {}", version)));
        }
        let profile = buffer.read_u8().map_err(truncated)?;
        let profile_compat = buffer.read_u8().map_err(truncated)?;
        let level = buffer.read_u8().map_err(truncated)?;
        let nal_length_size = (buffer.read_u8().map_err(truncated)? & 0x03) + 1;

        let num_sps = buffer.read_u8().map_err(truncated)? & 0x1F;
        let mut sps = Vec::with_capacity(num_sps as usize);
        for _ in 0..num_sps {
            let len = buffer.read_u16_be().map_err(truncated)? as usize;
            sps.push(buffer.read_bytes(len).map_err(truncated)?);
        }

        let num_pps = buffer.read_u8().map_err(truncated)?;
        let mut pps = Vec::with_capacity(num_pps as usize);
        for _ in 0..num_pps {
            let len = buffer.read_u16_be().map_err(truncated)? as usize;
            pps.push(buffer.read_bytes(len).map_err(truncated)?);
        }

        Ok(AvcDecoderConfig {
            version,
            profile,
            profile_compat,
            level,
            nal_length_size,
            sps,
            pps,
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buffer = ByteBuffer::with_capacity(
            11 + self.sps.iter().chain(&self.pps).map(Vec::len).sum::<usize>(),
        );
        buffer.write_u8(self.version)?;
        buffer.write_u8(self.profile)?;
        buffer.write_u8(self.profile_compat)?;
        buffer.write_u8(self.level)?;
        buffer.write_u8(0xFC | (self.nal_length_size.saturating_sub(1) & 0x03))?;

        buffer.write_u8(0xE0 | (self.sps.len() as u8 & 0x1F))?;
        for sps in &self.sps {
            buffer.write_u16_be(parameter_set_len(sps)?)?;
            buffer.write_bytes(sps)?;
        }

        buffer.write_u8(self.pps.len() as u8)?;
        for pps in &self.pps {
            buffer.write_u16_be(parameter_set_len(pps)?)?;
            buffer.write_bytes(pps)?;
        }
        Ok(buffer.into_vec())
    }
}

fn parameter_set_len(set: &[u8]) -> Result<u16> {
    u16::try_from(set.len())
        .map_err(|_| Error::media(format!("Parameter set of {} bytes is too long", set.len())))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPS: [u8; 8] = [0x67, 0x64, 0x00, 0x1F, 0xAC, 0xD9, 0x40, 0x50];
    const PPS: [u8; 4] = [0x68, 0xEB, 0xE3, 0xCB];

    #[test]
    fn test_tag_header() {
        assert_eq!(
            avc_tag_header(FrameType::Keyframe, AvcPacketType::SequenceHeader, 0),
            [0x17, 0x00, 0x00, 0x00, 0x00]
        );
        assert_eq!(
            avc_tag_header(FrameType::InterFrame, AvcPacketType::Nalu, 40),
            [0x27, 0x01, 0x00, 0x00, 0x28]
        );
        assert_eq!(
            avc_tag_header(FrameType::InterFrame, AvcPacketType::Nalu, -1)[2..],
            [0xFF, 0xFF, 0xFF]
        );
    }

    #[test]
    fn test_config_from_parameter_sets() {
        let config = AvcDecoderConfig::from_parameter_sets(vec![SPS.to_vec()], vec![PPS.to_vec()]).unwrap();
        assert_eq!(config.profile, 0x64);
        assert_eq!(config.level, 0x1F);

        let bytes = config.encode().unwrap();
        assert_eq!(&bytes[..8], &[0x01, 0x64, 0x00, 0x1F, 0xFF, 0xE1, 0x00, 0x08]);
        assert_eq!(bytes.len(), 6 + 2 + SPS.len() + 1 + 2 + PPS.len());

        assert_eq!(AvcDecoderConfig::parse(&bytes).unwrap(), config);
    }

    #[test]
    fn test_config_rejects_missing_sets() {
        assert!(AvcDecoderConfig::from_parameter_sets(vec![], vec![PPS.to_vec()]).is_err());
        assert!(AvcDecoderConfig::from_parameter_sets(vec![SPS.to_vec()], vec![]).is_err());
    }

    #[test]
    fn test_parse_truncated() {
        let config = AvcDecoderConfig::from_parameter_sets(vec![SPS.to_vec()], vec![PPS.to_vec()]).unwrap();
        let bytes = config.encode().unwrap();
        let err = AvcDecoderConfig::parse(&bytes[..bytes.len() - 2]).unwrap_err();
        assert!(matches!(err, Error::Media(_)));
    }
}
