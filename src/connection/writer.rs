use log::{debug, trace};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use crate::chunk::{ChunkType, ChunkWriter};
use crate::message::RtmpMessage;
use crate::protocol::constants::CHUNK_STREAM_PROTOCOL;
use crate::protocol::RtmpPacket;
use crate::{Error, Result};

/// Outbound half of a connection. Every message is written and flushed in
/// one call, so chunks of different messages never interleave.
pub struct MessageWriter<W> {
    writer: W,
    chunks: ChunkWriter,
}

impl<W: AsyncWrite + Unpin> MessageWriter<W> {
    pub fn new(writer: W) -> Self {
        MessageWriter {
            writer,
            chunks: ChunkWriter::new(),
        }
    }

    /// Outbound chunk size currently in effect
    pub fn chunk_size(&self) -> usize {
        self.chunks.chunk_size()
    }

    /// Whether a message has been sent on `cs_id`
    pub fn has_sent_on(&self, cs_id: u32) -> bool {
        self.chunks.has_history(cs_id)
    }

    /// Send `message` on `cs_id`.
    ///
    /// A SetChunkSize takes effect for every message after itself.
    pub async fn send(
        &mut self,
        message: &RtmpMessage,
        cs_id: u32,
        chunk_type: ChunkType,
        timestamp: u32,
        message_stream_id: u32,
    ) -> Result<()> {
        let packet = message.to_packet(timestamp, message_stream_id)?;
        trace!(
            "Sending {:?} ({} bytes) on chunk stream {} as {:?}",
            message.message_type(),
            packet.payload.len(),
            cs_id,
            chunk_type
        );
        self.send_packet(&packet, cs_id, chunk_type).await?;

        if let RtmpMessage::SetChunkSize(size) = message {
            debug!("Outbound chunk size set to {}", size);
            self.chunks.set_chunk_size(*size as usize);
        }
        Ok(())
    }

    /// Send a protocol control message on chunk stream 2, stream 0
    pub async fn send_control(&mut self, message: &RtmpMessage) -> Result<()> {
        if !message.message_type().is_control() {
            return Err(Error::protocol(format!(
                "{:?} is not a control message",
                message.message_type()
            )));
        }
        self.send(message, CHUNK_STREAM_PROTOCOL, ChunkType::Type0, 0, 0).await
    }

    /// Send an already-built packet
    pub async fn send_packet(
        &mut self,
        packet: &RtmpPacket,
        cs_id: u32,
        chunk_type: ChunkType,
    ) -> Result<()> {
        self.chunks.write_packet(packet, cs_id, chunk_type, &mut self.writer).await
    }

    /// Flush and close the outbound direction
    pub async fn shutdown(&mut self) -> Result<()> {
        self.writer.shutdown().await
            .map_err(|e| Error::transport(format!("Failed to close channel: {}", e)))
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkReader;
    use crate::protocol::constants::*;

    #[tokio::test]
    async fn test_chunk_size_applies_after_announcement() {
        let mut writer = MessageWriter::new(Vec::new());
        writer.send_control(&RtmpMessage::SetChunkSize(8192)).await.unwrap();
        assert_eq!(writer.chunk_size(), 8192);

        writer
            .send(&RtmpMessage::Video(vec![0x17; 1000]), CHUNK_STREAM_VIDEO, ChunkType::Type0, 0, 1)
            .await
            .unwrap();

        let bytes = writer.into_inner();
        // 16 bytes of SetChunkSize, then a single 1012-byte chunk
        assert_eq!(bytes.len(), 16 + 12 + 1000);

        let mut reader = ChunkReader::new();
        let mut input = bytes.as_slice();
        reader.read_message(&mut input).await.unwrap();
        reader.set_chunk_size(8192);
        assert_eq!(reader.read_message(&mut input).await.unwrap().payload.len(), 1000);
    }

    #[tokio::test]
    async fn test_send_control_rejects_media() {
        let mut writer = MessageWriter::new(Vec::new());
        assert!(writer.send_control(&RtmpMessage::Audio(vec![])).await.is_err());
        assert!(!writer.has_sent_on(CHUNK_STREAM_PROTOCOL));
    }
}
