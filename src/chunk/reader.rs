use std::collections::{HashMap, HashSet};
use log::warn;
use tokio::io::{AsyncRead, AsyncReadExt};
use crate::chunk::stream::ChunkStreamContext;
use crate::chunk::ChunkType;
use crate::message::MessageType;
use crate::protocol::constants::*;
use crate::protocol::{RtmpHeader, RtmpPacket};
use crate::{Error, Result};

/// Reassembles inbound chunks into messages.
pub struct ChunkReader {
    /// Chunk streams by ID
    chunk_streams: HashMap<u32, ChunkStreamContext>,

    /// Current chunk size for reading
    chunk_size_in: usize,

    /// Every byte consumed from the channel
    bytes_read: u64,

    /// Chunk streams whose current message is read only to be dropped
    discarding: HashSet<u32>,
}

impl Default for ChunkReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkReader {
    pub fn new() -> Self {
        ChunkReader {
            chunk_streams: HashMap::new(),
            chunk_size_in: DEFAULT_CHUNK_SIZE as usize,
            bytes_read: 0,
            discarding: HashSet::new(),
        }
    }

    /// Set incoming chunk size
    pub fn set_chunk_size(&mut self, size: usize) {
        self.chunk_size_in = size.max(1);
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size_in
    }

    /// Total bytes consumed so far
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Drop the partial message on `cs_id`
    pub fn abort(&mut self, cs_id: u32) {
        if let Some(ctx) = self.chunk_streams.get_mut(&cs_id) {
            ctx.abort();
        }
    }

    /// Read chunks until one message completes
    pub async fn read_message<R: AsyncRead + Unpin>(&mut self, reader: &mut R) -> Result<RtmpPacket> {
        loop {
            if let Some(packet) = self.read_chunk(reader).await? {
                return Ok(packet);
            }
        }
    }

    /// Read one chunk, returning a packet if it completed a message.
    ///
    /// A completed message with an unknown type id is discarded and
    /// reported as a protocol error; the stream stays in sync. So is a
    /// message opened by a type 1 chunk on a new chunk stream. A new chunk
    /// stream opened by type 2 or 3 leaves the message length unknown and
    /// the channel out of sync, which is fatal.
    pub async fn read_chunk<R: AsyncRead + Unpin>(
        &mut self,
        reader: &mut R,
    ) -> Result<Option<RtmpPacket>> {
        let (chunk_type, cs_id) = self.read_basic_header(reader).await?;

        let known = self.chunk_streams.contains_key(&cs_id);
        let mut ctx = self.chunk_streams.remove(&cs_id).unwrap_or_default();
        match chunk_type {
            ChunkType::Type0 => {
                self.discarding.remove(&cs_id);
            }
            ChunkType::Type1 if !known => {
                warn!("First chunk on chunk stream {} uses type 1, discarding its message", cs_id);
                ctx.prev_header = Some(RtmpHeader::new(0, 0, 0, 0));
                self.discarding.insert(cs_id);
            }
            _ if !known => {
                return Err(Error::transport(format!(
                    "First chunk on chunk stream {} uses {:?}, message length unknown",
                    cs_id, chunk_type
                )));
            }
            _ => {}
        }

        let result = self.read_chunk_body(chunk_type, cs_id, &mut ctx, reader).await;
        self.chunk_streams.insert(cs_id, ctx);

        let packet = match result? {
            Some(packet) => packet,
            None => return Ok(None),
        };

        if self.discarding.remove(&cs_id) {
            self.chunk_streams.remove(&cs_id);
            return Err(Error::protocol(format!(
                "Dropped {} byte message on chunk stream {} that did not start with type 0",
                packet.payload.len(),
                cs_id
            )));
        }

        if MessageType::from_id(packet.message_type()).is_none() {
            return Err(Error::protocol(format!(
                "Unknown message type {} on chunk stream {}",
                packet.message_type(),
                cs_id
            )));
        }
        Ok(Some(packet))
    }

    async fn read_chunk_body<R: AsyncRead + Unpin>(
        &mut self,
        chunk_type: ChunkType,
        cs_id: u32,
        ctx: &mut ChunkStreamContext,
        reader: &mut R,
    ) -> Result<Option<RtmpPacket>> {
        if ctx.is_assembling() && chunk_type != ChunkType::Type3 {
            warn!(
                "New {:?} header on chunk stream {} with {} bytes outstanding, dropping partial message",
                chunk_type,
                cs_id,
                ctx.bytes_remaining()
            );
            ctx.abort();
        }

        if ctx.is_assembling() {
            // Continuation of the current message
            if ctx.extended_timestamp {
                self.read_u32(reader, "extended timestamp").await?;
            }
        } else {
            let (header, delta, extended) = self.read_message_header(chunk_type, ctx, reader).await?;
            ctx.start_message(header, delta, extended);
        }

        let chunk_data_size = ctx.bytes_remaining().min(self.chunk_size_in);
        let mut chunk_data = vec![0u8; chunk_data_size];
        self.read_exact(reader, &mut chunk_data, "chunk data").await?;

        Ok(ctx.add_chunk_data(&chunk_data))
    }

    /// Read the basic header and resolve the chunk stream id
    async fn read_basic_header<R: AsyncRead + Unpin>(
        &mut self,
        reader: &mut R,
    ) -> Result<(ChunkType, u32)> {
        let mut first = [0u8; 1];
        self.read_exact(reader, &mut first, "basic header").await?;

        let chunk_type = ChunkType::from_fmt(first[0] >> 6);
        let cs_id = match first[0] & 0x3F {
            0 => {
                let mut id = [0u8; 1];
                self.read_exact(reader, &mut id, "chunk stream id").await?;
                id[0] as u32 + 64
            }
            1 => {
                let mut id = [0u8; 2];
                self.read_exact(reader, &mut id, "chunk stream id").await?;
                u16::from_le_bytes(id) as u32 + 64
            }
            n => n as u32,
        };

        Ok((chunk_type, cs_id))
    }

    /// Read the message header for a chunk that starts a new message.
    ///
    /// Returns the resolved header, the delta to remember for later type 3
    /// chunks, and whether the extended timestamp field was present.
    async fn read_message_header<R: AsyncRead + Unpin>(
        &mut self,
        chunk_type: ChunkType,
        ctx: &ChunkStreamContext,
        reader: &mut R,
    ) -> Result<(RtmpHeader, u32, bool)> {
        let mut fields = [0u8; 11];
        let size = chunk_type.header_size();
        self.read_exact(reader, &mut fields[..size], "message header").await?;

        let field_timestamp = u32::from_be_bytes([0, fields[0], fields[1], fields[2]]);
        let extended = if size > 0 {
            field_timestamp == EXTENDED_TIMESTAMP_MARKER
        } else {
            ctx.extended_timestamp
        };
        let extended_value = if extended {
            Some(self.read_u32(reader, "extended timestamp").await?)
        } else {
            None
        };
        let timestamp_field = extended_value.unwrap_or(field_timestamp);

        let prev = ctx.prev_header;
        let require_prev = || {
            prev.ok_or_else(|| Error::protocol(format!("{:?} header without a previous header", chunk_type)))
        };

        match chunk_type {
            ChunkType::Type0 => {
                let header = RtmpHeader::new(
                    timestamp_field,
                    u32::from_be_bytes([0, fields[3], fields[4], fields[5]]),
                    fields[6],
                    u32::from_le_bytes([fields[7], fields[8], fields[9], fields[10]]),
                );
                Ok((header, 0, extended))
            }
            ChunkType::Type1 => {
                let prev = require_prev()?;
                let header = RtmpHeader::new(
                    prev.timestamp.wrapping_add(timestamp_field),
                    u32::from_be_bytes([0, fields[3], fields[4], fields[5]]),
                    fields[6],
                    prev.message_stream_id,
                );
                Ok((header, timestamp_field, extended))
            }
            ChunkType::Type2 => {
                let prev = require_prev()?;
                let header = RtmpHeader {
                    timestamp: prev.timestamp.wrapping_add(timestamp_field),
                    ..prev
                };
                Ok((header, timestamp_field, extended))
            }
            ChunkType::Type3 => {
                // New message with every field reused; the remembered delta
                // (or a repeated extended delta) advances the timestamp
                let prev = require_prev()?;
                let delta = extended_value.unwrap_or(ctx.last_delta);
                let header = RtmpHeader {
                    timestamp: prev.timestamp.wrapping_add(delta),
                    ..prev
                };
                Ok((header, delta, extended))
            }
        }
    }

    async fn read_u32<R: AsyncRead + Unpin>(&mut self, reader: &mut R, what: &str) -> Result<u32> {
        let mut bytes = [0u8; 4];
        self.read_exact(reader, &mut bytes, what).await?;
        Ok(u32::from_be_bytes(bytes))
    }

    async fn read_exact<R: AsyncRead + Unpin>(
        &mut self,
        reader: &mut R,
        buf: &mut [u8],
        what: &str,
    ) -> Result<()> {
        reader.read_exact(buf).await
            .map_err(|e| Error::transport(format!("Failed to read {}: {}", what, e)))?;
        self.bytes_read += buf.len() as u64;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkWriter;

    fn packet(timestamp: u32, message_type: u8, stream_id: u32, len: usize) -> RtmpPacket {
        let payload = (0..len).map(|i| (i % 251) as u8).collect();
        RtmpPacket::new(RtmpHeader::new(timestamp, 0, message_type, stream_id), payload)
    }

    #[tokio::test]
    async fn test_round_trip_lengths() {
        let chunk_size = 128;
        for len in [0, chunk_size - 1, chunk_size, chunk_size + 1, 3 * chunk_size + 7] {
            let original = packet(1234, MSG_TYPE_VIDEO, 1, len);

            let mut writer = ChunkWriter::new();
            writer.set_chunk_size(chunk_size);
            let bytes = writer.create_chunks(&original, 6, ChunkType::Type0).unwrap();

            let mut reader = ChunkReader::new();
            reader.set_chunk_size(chunk_size);
            let mut input = bytes.as_slice();
            let decoded = reader.read_message(&mut input).await.unwrap();

            assert_eq!(decoded, original, "length {}", len);
            assert!(input.is_empty());
            assert_eq!(reader.bytes_read(), bytes.len() as u64);
        }
    }

    #[tokio::test]
    async fn test_round_trip_chunk_stream_ids() {
        for cs_id in [2, 63, 64, 319, 320, 65599] {
            let original = packet(7, MSG_TYPE_AUDIO, 1, 300);
            let mut writer = ChunkWriter::new();
            let bytes = writer.create_chunks(&original, cs_id, ChunkType::Type0).unwrap();

            let mut reader = ChunkReader::new();
            let decoded = reader.read_message(&mut bytes.as_slice()).await.unwrap();
            assert_eq!(decoded, original, "cs_id {}", cs_id);
        }
    }

    #[tokio::test]
    async fn test_extended_timestamp_round_trip() {
        for timestamp in [0xFFFFFF, 0x0100_0000, u32::MAX] {
            let original = packet(timestamp, MSG_TYPE_VIDEO, 1, 300);
            let mut writer = ChunkWriter::new();
            let bytes = writer.create_chunks(&original, 6, ChunkType::Type0).unwrap();

            let mut reader = ChunkReader::new();
            let decoded = reader.read_message(&mut bytes.as_slice()).await.unwrap();
            assert_eq!(decoded.timestamp(), timestamp);
            assert_eq!(decoded.payload, original.payload);
        }
    }

    #[tokio::test]
    async fn test_type1_deltas_accumulate() {
        let mut writer = ChunkWriter::new();
        let mut bytes = writer.create_chunks(&packet(0, MSG_TYPE_AUDIO, 1, 4), 5, ChunkType::Type0).unwrap();
        bytes.extend(writer.create_chunks(&packet(20, MSG_TYPE_AUDIO, 1, 4), 5, ChunkType::Type1).unwrap());
        bytes.extend(writer.create_chunks(&packet(25, MSG_TYPE_AUDIO, 1, 6), 5, ChunkType::Type1).unwrap());

        let mut reader = ChunkReader::new();
        let mut input = bytes.as_slice();
        let mut timestamps = Vec::new();
        for _ in 0..3 {
            let decoded = reader.read_message(&mut input).await.unwrap();
            assert_eq!(decoded.message_stream_id(), 1);
            timestamps.push(decoded.timestamp());
        }
        assert_eq!(timestamps, vec![0, 20, 45]);
    }

    #[tokio::test]
    async fn test_type2_and_type3_new_messages() {
        // type 0 at 100, type 2 delta 10, type 3 reuses the delta
        let bytes = vec![
            0x04, 0x00, 0x00, 0x64, 0x00, 0x00, 0x01, 0x08, 0x01, 0x00, 0x00, 0x00, 0xAA,
            0x84, 0x00, 0x00, 0x0A, 0xBB,
            0xC4, 0xCC,
        ];
        let mut reader = ChunkReader::new();
        let mut input = bytes.as_slice();

        let first = reader.read_message(&mut input).await.unwrap();
        let second = reader.read_message(&mut input).await.unwrap();
        let third = reader.read_message(&mut input).await.unwrap();

        assert_eq!((first.timestamp(), first.payload[0]), (100, 0xAA));
        assert_eq!((second.timestamp(), second.payload[0]), (110, 0xBB));
        assert_eq!((third.timestamp(), third.payload[0]), (120, 0xCC));
        assert!(third.is_audio());
    }

    #[tokio::test]
    async fn test_interleaved_chunk_streams() {
        let mut writer = ChunkWriter::new();
        writer.set_chunk_size(4);
        let audio = writer.create_chunks(&packet(0, MSG_TYPE_AUDIO, 1, 6), 5, ChunkType::Type0).unwrap();
        let video = writer.create_chunks(&packet(0, MSG_TYPE_VIDEO, 1, 6), 6, ChunkType::Type0).unwrap();

        // audio first chunk, video first chunk, audio rest, video rest
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&audio[..16]);
        bytes.extend_from_slice(&video[..16]);
        bytes.extend_from_slice(&audio[16..]);
        bytes.extend_from_slice(&video[16..]);

        let mut reader = ChunkReader::new();
        reader.set_chunk_size(4);
        let mut input = bytes.as_slice();
        assert!(reader.read_message(&mut input).await.unwrap().is_audio());
        assert!(reader.read_message(&mut input).await.unwrap().is_video());
    }

    #[tokio::test]
    async fn test_type1_first_chunk_dropped_other_streams_unaffected() {
        // type 1 on chunk stream 7: 6 byte video message split over two chunks
        let mut bytes = vec![
            0x47, 0x00, 0x00, 0x0A, 0x00, 0x00, 0x06, 0x09, 0x17, 0x01, 0x00, 0x00,
            0xC7, 0xAB, 0xCD,
        ];
        let mut writer = ChunkWriter::new();
        writer.set_chunk_size(4);
        let control = RtmpPacket::new(
            RtmpHeader::new(0, 0, MSG_TYPE_WINDOW_ACK, 0),
            5000u32.to_be_bytes().to_vec(),
        );
        bytes.extend(writer.create_chunks(&control, 2, ChunkType::Type0).unwrap());

        let mut reader = ChunkReader::new();
        reader.set_chunk_size(4);
        let mut input = bytes.as_slice();
        assert!(matches!(reader.read_message(&mut input).await, Err(Error::Protocol(_))));

        let decoded = reader.read_message(&mut input).await.unwrap();
        assert_eq!(decoded, control);
        assert!(input.is_empty());
    }

    #[tokio::test]
    async fn test_type2_first_chunk_is_fatal() {
        let bytes = vec![0x87, 0x00, 0x00, 0x0A, 0x01];
        let mut reader = ChunkReader::new();
        let err = reader.read_chunk(&mut bytes.as_slice()).await.unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_extended_delta_on_type1() {
        let mut writer = ChunkWriter::new();
        writer.set_chunk_size(128);
        let first = packet(1000, MSG_TYPE_VIDEO, 1, 4);
        // type 1 headers carry the delta
        let second = packet(0x0100_0000, MSG_TYPE_VIDEO, 1, 300);
        let mut bytes = writer.create_chunks(&first, 6, ChunkType::Type0).unwrap();
        let type1 = writer.create_chunks(&second, 6, ChunkType::Type1).unwrap();
        // delta field saturated, 4-byte delta follows the 7-byte header
        assert_eq!(&type1[1..4], &[0xFF, 0xFF, 0xFF]);
        assert_eq!(&type1[8..12], &0x0100_0000u32.to_be_bytes());
        bytes.extend(type1);

        let mut reader = ChunkReader::new();
        let mut input = bytes.as_slice();
        assert_eq!(reader.read_message(&mut input).await.unwrap().timestamp(), 1000);
        let decoded = reader.read_message(&mut input).await.unwrap();
        assert_eq!(decoded.timestamp(), 1000 + 0x0100_0000);
        assert_eq!(decoded.payload, second.payload);
        assert!(input.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_type_discarded_stream_stays_in_sync() {
        let mut writer = ChunkWriter::new();
        let mut bytes = writer.create_chunks(&packet(0, 42, 0, 3), 3, ChunkType::Type0).unwrap();
        bytes.extend(writer.create_chunks(&packet(0, MSG_TYPE_COMMAND_AMF0, 0, 2), 3, ChunkType::Type0).unwrap());

        let mut reader = ChunkReader::new();
        let mut input = bytes.as_slice();
        assert!(matches!(reader.read_message(&mut input).await, Err(Error::Protocol(_))));
        assert!(reader.read_message(&mut input).await.unwrap().is_command());
    }

    #[tokio::test]
    async fn test_abort_drops_partial_message() {
        let mut writer = ChunkWriter::new();
        writer.set_chunk_size(4);
        let bytes = writer.create_chunks(&packet(0, MSG_TYPE_VIDEO, 1, 10), 6, ChunkType::Type0).unwrap();

        let mut reader = ChunkReader::new();
        reader.set_chunk_size(4);
        let mut input = &bytes[..16];
        assert!(reader.read_chunk(&mut input).await.unwrap().is_none());
        reader.abort(6);

        // The next type 0 message reassembles cleanly
        let fresh = writer.create_chunks(&packet(5, MSG_TYPE_VIDEO, 1, 2), 6, ChunkType::Type0).unwrap();
        let decoded = reader.read_message(&mut fresh.as_slice()).await.unwrap();
        assert_eq!(decoded.payload.len(), 2);
    }

    #[tokio::test]
    async fn test_truncated_input_is_transport_error() {
        let bytes = vec![0x03, 0x00, 0x00];
        let mut reader = ChunkReader::new();
        let err = reader.read_chunk(&mut bytes.as_slice()).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }
}
