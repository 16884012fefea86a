use std::collections::HashMap;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use crate::chunk::{encode_basic_header, ChunkType};
use crate::protocol::constants::*;
use crate::protocol::{RtmpHeader, RtmpPacket};
use crate::{ByteBuffer, Error, Result};

/// Outbound header history per chunk stream
#[derive(Debug, Clone, Copy)]
struct SentHeader {
    header: RtmpHeader,
    extended: bool,
}

/// Splits outgoing messages into chunks.
///
/// Only type 0 and type 1 headers are produced for the first chunk of a
/// message; continuation chunks are type 3. The first message on any chunk
/// stream must be type 0.
pub struct ChunkWriter {
    prev_headers: HashMap<u32, SentHeader>,

    /// Current chunk size for writing
    chunk_size_out: usize,
}

impl Default for ChunkWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkWriter {
    pub fn new() -> Self {
        ChunkWriter {
            prev_headers: HashMap::new(),
            chunk_size_out: DEFAULT_CHUNK_SIZE as usize,
        }
    }

    /// Set outgoing chunk size
    pub fn set_chunk_size(&mut self, size: usize) {
        self.chunk_size_out = size.max(1);
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size_out
    }

    /// Whether a type 0 chunk has been sent on `cs_id`
    pub fn has_history(&self, cs_id: u32) -> bool {
        self.prev_headers.contains_key(&cs_id)
    }

    /// Encode and write one message, then flush
    pub async fn write_packet<W: AsyncWrite + Unpin>(
        &mut self,
        packet: &RtmpPacket,
        cs_id: u32,
        chunk_type: ChunkType,
        writer: &mut W,
    ) -> Result<()> {
        let chunks = self.create_chunks(packet, cs_id, chunk_type)?;

        writer.write_all(&chunks).await
            .map_err(|e| Error::transport(format!("Failed to write chunks: {}", e)))?;
        writer.flush().await
            .map_err(|e| Error::transport(format!("Failed to flush: {}", e)))?;
        Ok(())
    }

    /// Split `packet` into wire chunks on `cs_id`.
    ///
    /// With `Type0` the header timestamp is absolute. With `Type1` it is sent
    /// as the delta from the previous message on this chunk stream.
    pub fn create_chunks(
        &mut self,
        packet: &RtmpPacket,
        cs_id: u32,
        chunk_type: ChunkType,
    ) -> Result<Vec<u8>> {
        let header = RtmpHeader {
            message_length: packet.payload.len() as u32,
            ..packet.header
        };
        if header.message_length > 0x00FF_FFFF {
            return Err(Error::chunk(format!(
                "Message of {} bytes does not fit a 24-bit length",
                header.message_length
            )));
        }

        let message_header = match chunk_type {
            ChunkType::Type0 => encode_type0_header(&header)?,
            ChunkType::Type1 => {
                let prev = self.prev_headers.get(&cs_id).ok_or_else(|| {
                    Error::protocol(format!("First message on chunk stream {} must use type 0", cs_id))
                })?;
                if prev.header.message_stream_id != header.message_stream_id {
                    return Err(Error::protocol(format!(
                        "Type 1 chunk cannot change message stream id on chunk stream {}",
                        cs_id
                    )));
                }
                encode_type1_header(&header)?
            }
            ChunkType::Type2 | ChunkType::Type3 => {
                return Err(Error::not_implemented(format!(
                    "Sending {:?} message headers",
                    chunk_type
                )));
            }
        };

        let extended = header.has_extended_timestamp();
        let num_chunks = header.message_length as usize / self.chunk_size_out + 1;
        let mut result = Vec::with_capacity(
            packet.payload.len() + message_header.len() + num_chunks * 8,
        );

        result.extend_from_slice(&encode_basic_header(chunk_type, cs_id)?);
        result.extend_from_slice(&message_header);

        let mut slices = packet.payload.chunks(self.chunk_size_out);
        if let Some(first) = slices.next() {
            result.extend_from_slice(first);
        }

        // Continuation chunks repeat the extended timestamp when the
        // message header carried one
        let continuation = encode_basic_header(ChunkType::Type3, cs_id)?;
        for slice in slices {
            result.extend_from_slice(&continuation);
            if extended {
                result.extend_from_slice(&header.timestamp.to_be_bytes());
            }
            result.extend_from_slice(slice);
        }

        self.prev_headers.insert(cs_id, SentHeader { header, extended });
        Ok(result)
    }

    /// Forget all header history, as after a reconnect
    pub fn reset(&mut self) {
        self.prev_headers.clear();
    }
}

/// Type 0: timestamp, length, type id, little-endian stream id
fn encode_type0_header(header: &RtmpHeader) -> Result<Vec<u8>> {
    let mut buffer = ByteBuffer::with_capacity(15);
    buffer.write_u24_be(header.wire_timestamp())?;
    buffer.write_u24_be(header.message_length)?;
    buffer.write_u8(header.message_type)?;
    buffer.write_u32_le(header.message_stream_id)?;
    if header.has_extended_timestamp() {
        buffer.write_u32_be(header.timestamp)?;
    }
    Ok(buffer.into_vec())
}

/// Type 1: timestamp delta, length, type id
fn encode_type1_header(header: &RtmpHeader) -> Result<Vec<u8>> {
    let mut buffer = ByteBuffer::with_capacity(11);
    buffer.write_u24_be(header.wire_timestamp())?;
    buffer.write_u24_be(header.message_length)?;
    buffer.write_u8(header.message_type)?;
    if header.has_extended_timestamp() {
        buffer.write_u32_be(header.timestamp)?;
    }
    Ok(buffer.into_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(timestamp: u32, len: usize) -> RtmpPacket {
        RtmpPacket::new(RtmpHeader::new(timestamp, 0, MSG_TYPE_VIDEO, 1), vec![0xAB; len])
    }

    #[test]
    fn test_type0_single_chunk_layout() {
        let mut writer = ChunkWriter::new();
        let bytes = writer.create_chunks(&video(0x010203, 4), 6, ChunkType::Type0).unwrap();
        assert_eq!(
            bytes,
            vec![
                0x06,
                0x01, 0x02, 0x03,
                0x00, 0x00, 0x04,
                0x09,
                0x01, 0x00, 0x00, 0x00,
                0xAB, 0xAB, 0xAB, 0xAB,
            ]
        );
    }

    #[test]
    fn test_continuation_chunks() {
        let mut writer = ChunkWriter::new();
        writer.set_chunk_size(4);
        let bytes = writer.create_chunks(&video(0, 10), 6, ChunkType::Type0).unwrap();

        // 1 + 11 + 4, then (1 + 4), then (1 + 2)
        assert_eq!(bytes.len(), 16 + 5 + 3);
        assert_eq!(bytes[16], 0xC6);
        assert_eq!(bytes[21], 0xC6);
    }

    #[test]
    fn test_type1_requires_history() {
        let mut writer = ChunkWriter::new();
        let err = writer.create_chunks(&video(0, 1), 5, ChunkType::Type1).unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));

        writer.create_chunks(&video(0, 1), 5, ChunkType::Type0).unwrap();
        let bytes = writer.create_chunks(&video(20, 1), 5, ChunkType::Type1).unwrap();
        assert_eq!(bytes[..8], [0x45, 0x00, 0x00, 0x14, 0x00, 0x00, 0x01, 0x09]);
        assert_eq!(bytes.len(), 1 + 7 + 1);
    }

    #[test]
    fn test_extended_timestamp_layout() {
        let mut writer = ChunkWriter::new();
        writer.set_chunk_size(2);
        let bytes = writer.create_chunks(&video(0x0100_0000, 3), 6, ChunkType::Type0).unwrap();

        assert_eq!(&bytes[1..4], &[0xFF, 0xFF, 0xFF]);
        assert_eq!(&bytes[12..16], &[0x01, 0x00, 0x00, 0x00]);
        // continuation: basic header, repeated extended timestamp, 1 byte
        assert_eq!(&bytes[18..], &[0xC6, 0x01, 0x00, 0x00, 0x00, 0xAB]);
    }

    #[test]
    fn test_sender_side_type2_type3_unsupported() {
        let mut writer = ChunkWriter::new();
        writer.create_chunks(&video(0, 1), 6, ChunkType::Type0).unwrap();
        assert!(writer.create_chunks(&video(0, 1), 6, ChunkType::Type2).is_err());
        assert!(writer.create_chunks(&video(0, 1), 6, ChunkType::Type3).is_err());
    }

    #[tokio::test]
    async fn test_write_packet_flushes_bytes() {
        let mut writer = ChunkWriter::new();
        let mut out = Vec::new();
        writer.write_packet(&video(0, 3), 6, ChunkType::Type0, &mut out).await.unwrap();
        assert_eq!(out.len(), 1 + 11 + 3);
        assert!(writer.has_history(6));
    }
}
