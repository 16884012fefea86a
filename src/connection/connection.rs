use tokio::io::{split, AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use crate::chunk::ChunkType;
use crate::connection::reader::{MessageReader, ReceivedMessage};
use crate::connection::writer::MessageWriter;
use crate::message::RtmpMessage;
use crate::Result;

/// Both halves of an established RTMP connection.
///
/// While the halves are together, replies queued by inbound control
/// messages are sent before `recv` returns.
pub struct RtmpConnection<S> {
    reader: MessageReader<ReadHalf<S>>,
    writer: MessageWriter<WriteHalf<S>>,
}

impl<S: AsyncRead + AsyncWrite> RtmpConnection<S> {
    /// Wrap a channel that has completed the handshake
    pub fn new(stream: S) -> Self {
        let (read_half, write_half) = split(stream);
        RtmpConnection {
            reader: MessageReader::new(read_half),
            writer: MessageWriter::new(write_half),
        }
    }

    /// Receive the next message, answering pings and acknowledging
    pub async fn recv(&mut self) -> Result<ReceivedMessage> {
        let received = self.reader.read_message().await?;
        self.flush_replies().await?;
        Ok(received)
    }

    /// Send any replies the reader has queued
    pub async fn flush_replies(&mut self) -> Result<()> {
        for reply in self.reader.take_replies() {
            self.writer.send_control(&reply).await?;
        }
        Ok(())
    }

    pub async fn send(
        &mut self,
        message: &RtmpMessage,
        cs_id: u32,
        chunk_type: ChunkType,
        timestamp: u32,
        message_stream_id: u32,
    ) -> Result<()> {
        self.writer.send(message, cs_id, chunk_type, timestamp, message_stream_id).await
    }

    /// Send a protocol control message
    pub async fn send_control(&mut self, message: &RtmpMessage) -> Result<()> {
        if let RtmpMessage::WindowAckSize(window) = message {
            self.reader.set_announced_window(*window);
        }
        self.writer.send_control(message).await
    }

    pub fn reader(&self) -> &MessageReader<ReadHalf<S>> {
        &self.reader
    }

    pub fn writer_mut(&mut self) -> &mut MessageWriter<WriteHalf<S>> {
        &mut self.writer
    }

    /// Separate the halves so reading can continue on another task
    pub fn into_split(self) -> (MessageReader<ReadHalf<S>>, MessageWriter<WriteHalf<S>>) {
        (self.reader, self.writer)
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.writer.shutdown().await
    }
}
