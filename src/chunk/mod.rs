mod reader;
mod stream;
mod writer;

pub use reader::*;
pub use stream::*;
pub use writer::*;

use crate::protocol::constants::MAX_CHUNK_STREAM_ID;
use crate::{Error, Result};

/// Chunk header format (the 2-bit `fmt` field)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkType {
    /// Full 11-byte message header
    Type0,
    /// Delta timestamp, length and type; stream id reused
    Type1,
    /// Delta timestamp only
    Type2,
    /// No message header
    Type3,
}

impl ChunkType {
    pub fn from_fmt(fmt: u8) -> Self {
        match fmt & 0x03 {
            0 => ChunkType::Type0,
            1 => ChunkType::Type1,
            2 => ChunkType::Type2,
            _ => ChunkType::Type3,
        }
    }

    pub fn fmt(self) -> u8 {
        match self {
            ChunkType::Type0 => 0,
            ChunkType::Type1 => 1,
            ChunkType::Type2 => 2,
            ChunkType::Type3 => 3,
        }
    }

    /// Message header size in bytes, excluding any extended timestamp
    pub fn header_size(self) -> usize {
        match self {
            ChunkType::Type0 => 11,
            ChunkType::Type1 => 7,
            ChunkType::Type2 => 3,
            ChunkType::Type3 => 0,
        }
    }
}

/// Encode the 1-3 byte basic header.
///
/// Ids 2-63 take one byte, 64-319 two, 320-65599 three. Ids 0 and 1 are the
/// range markers and cannot be sent.
pub fn encode_basic_header(chunk_type: ChunkType, cs_id: u32) -> Result<Vec<u8>> {
    let fmt = chunk_type.fmt() << 6;
    match cs_id {
        2..=63 => Ok(vec![fmt | cs_id as u8]),
        64..=319 => Ok(vec![fmt, (cs_id - 64) as u8]),
        320..=MAX_CHUNK_STREAM_ID => {
            let id = (cs_id - 64) as u16;
            let [low, high] = id.to_le_bytes();
            Ok(vec![fmt | 1, low, high])
        }
        _ => Err(Error::chunk(format!("Chunk stream id {} out of range", cs_id))),
    }
}

/// Parse a basic header from the front of `bytes`, returning the chunk type,
/// chunk stream id and bytes consumed
pub fn parse_basic_header(bytes: &[u8]) -> Result<(ChunkType, u32, usize)> {
    let first = *bytes.first().ok_or_else(|| Error::chunk("Empty chunk header"))?;
    let chunk_type = ChunkType::from_fmt(first >> 6);

    match first & 0x3F {
        0 => {
            let second = *bytes.get(1).ok_or_else(|| Error::chunk("Truncated 2-byte basic header"))?;
            Ok((chunk_type, second as u32 + 64, 2))
        }
        1 => {
            if bytes.len() < 3 {
                return Err(Error::chunk("Truncated 3-byte basic header"));
            }
            let id = u16::from_le_bytes([bytes[1], bytes[2]]) as u32;
            Ok((chunk_type, id + 64, 3))
        }
        id => Ok((chunk_type, id as u32, 1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_header_forms() {
        let cases = [(2, 1), (63, 1), (64, 2), (319, 2), (320, 3), (65599, 3)];
        for (cs_id, size) in cases {
            for chunk_type in [ChunkType::Type0, ChunkType::Type1, ChunkType::Type3] {
                let bytes = encode_basic_header(chunk_type, cs_id).unwrap();
                assert_eq!(bytes.len(), size, "cs_id {}", cs_id);
                assert_eq!(parse_basic_header(&bytes).unwrap(), (chunk_type, cs_id, size));
            }
        }
    }

    #[test]
    fn test_basic_header_bytes() {
        assert_eq!(encode_basic_header(ChunkType::Type0, 3).unwrap(), vec![0x03]);
        assert_eq!(encode_basic_header(ChunkType::Type3, 6).unwrap(), vec![0xC6]);
        assert_eq!(encode_basic_header(ChunkType::Type1, 100).unwrap(), vec![0x40, 36]);
        assert_eq!(encode_basic_header(ChunkType::Type0, 400).unwrap(), vec![0x01, 0x50, 0x01]);
    }

    #[test]
    fn test_reserved_ids_rejected() {
        assert!(encode_basic_header(ChunkType::Type0, 0).is_err());
        assert!(encode_basic_header(ChunkType::Type0, 1).is_err());
        assert!(encode_basic_header(ChunkType::Type0, 65600).is_err());
        assert!(parse_basic_header(&[0x00]).is_err());
        assert!(parse_basic_header(&[0x01, 0x00]).is_err());
    }

    #[test]
    fn test_header_sizes() {
        let sizes: Vec<usize> = (0..4).map(|fmt| ChunkType::from_fmt(fmt).header_size()).collect();
        assert_eq!(sizes, vec![11, 7, 3, 0]);
    }
}
