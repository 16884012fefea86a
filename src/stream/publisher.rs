use log::{debug, info};
use tokio::io::AsyncWrite;
use crate::amf::Amf0Object;
use crate::chunk::ChunkType;
use crate::connection::MessageWriter;
use crate::message::RtmpMessage;
use crate::protocol::constants::*;
use crate::protocol::{RtmpCommand, RtmpData};
use crate::Result;

/// A message stream opened with `createStream` and used for publishing.
///
/// Media messages go out as type 0 on the first message of their chunk
/// stream and as type 1 afterwards, so their timestamps are deltas.
#[derive(Debug, Clone)]
pub struct PublishStream {
    stream_id: u32,
    name: String,
    publish_type: String,

    /// Media messages sent, for logging
    video_messages: u64,
    audio_messages: u64,
}

impl PublishStream {
    pub fn new(stream_id: u32, name: impl Into<String>, publish_type: impl Into<String>) -> Self {
        PublishStream {
            stream_id,
            name: name.into(),
            publish_type: publish_type.into(),
            video_messages: 0,
            audio_messages: 0,
        }
    }

    pub fn stream_id(&self) -> u32 {
        self.stream_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Send `publish`; the server's onStatus is not awaited
    pub async fn publish<W: AsyncWrite + Unpin>(&self, writer: &mut MessageWriter<W>) -> Result<()> {
        info!("Publishing '{}' ({}) on stream {}", self.name, self.publish_type, self.stream_id);
        let command = RtmpCommand::publish(&self.name, &self.publish_type);
        writer
            .send(
                &RtmpMessage::Command(command),
                CHUNK_STREAM_STREAM_COMMAND,
                ChunkType::Type0,
                0,
                self.stream_id,
            )
            .await
    }

    /// Send `@setDataFrame("onMetaData", ...)`
    pub async fn set_metadata<W: AsyncWrite + Unpin>(
        &self,
        writer: &mut MessageWriter<W>,
        metadata: Amf0Object,
    ) -> Result<()> {
        debug!("Sending metadata with {} properties", metadata.len());
        let data = RtmpData::set_metadata(metadata);
        writer
            .send(&RtmpMessage::Data(data), CHUNK_STREAM_DATA, ChunkType::Type0, 0, self.stream_id)
            .await
    }

    /// Send an FLV video tag body; `timestamp` is the delta from the
    /// previous video message
    pub async fn publish_video<W: AsyncWrite + Unpin>(
        &mut self,
        writer: &mut MessageWriter<W>,
        payload: Vec<u8>,
        timestamp: u32,
    ) -> Result<()> {
        let chunk_type = media_chunk_type(writer, CHUNK_STREAM_VIDEO);
        writer
            .send(&RtmpMessage::Video(payload), CHUNK_STREAM_VIDEO, chunk_type, timestamp, self.stream_id)
            .await?;
        self.video_messages += 1;
        Ok(())
    }

    /// Send an FLV audio tag body; `timestamp` is the delta from the
    /// previous audio message
    pub async fn publish_audio<W: AsyncWrite + Unpin>(
        &mut self,
        writer: &mut MessageWriter<W>,
        payload: Vec<u8>,
        timestamp: u32,
    ) -> Result<()> {
        let chunk_type = media_chunk_type(writer, CHUNK_STREAM_AUDIO);
        writer
            .send(&RtmpMessage::Audio(payload), CHUNK_STREAM_AUDIO, chunk_type, timestamp, self.stream_id)
            .await?;
        self.audio_messages += 1;
        Ok(())
    }

    pub async fn fc_unpublish<W: AsyncWrite + Unpin>(&self, writer: &mut MessageWriter<W>) -> Result<()> {
        self.send_command(writer, RtmpCommand::fc_unpublish(&self.name)).await
    }

    pub async fn delete_stream<W: AsyncWrite + Unpin>(&self, writer: &mut MessageWriter<W>) -> Result<()> {
        info!(
            "Deleting stream {} after {} video and {} audio messages",
            self.stream_id, self.video_messages, self.audio_messages
        );
        self.send_command(writer, RtmpCommand::delete_stream(self.stream_id)).await
    }

    /// Teardown commands share chunk stream 3 with `connect`, which sent
    /// the type 0 header already
    async fn send_command<W: AsyncWrite + Unpin>(
        &self,
        writer: &mut MessageWriter<W>,
        command: RtmpCommand,
    ) -> Result<()> {
        let chunk_type = if writer.has_sent_on(CHUNK_STREAM_COMMAND) {
            ChunkType::Type1
        } else {
            ChunkType::Type0
        };
        writer
            .send(&RtmpMessage::Command(command), CHUNK_STREAM_COMMAND, chunk_type, 0, 0)
            .await
    }
}

fn media_chunk_type<W: AsyncWrite + Unpin>(writer: &MessageWriter<W>, cs_id: u32) -> ChunkType {
    if writer.has_sent_on(cs_id) {
        ChunkType::Type1
    } else {
        ChunkType::Type0
    }
}
