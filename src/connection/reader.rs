use log::{debug, trace, warn};
use tokio::io::AsyncRead;
use crate::chunk::ChunkReader;
use crate::message::{PeerBandwidthLimit, RtmpMessage, UserControlEvent};
use crate::protocol::RtmpHeader;
use crate::Result;

/// A decoded inbound message with the header it arrived under
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedMessage {
    pub header: RtmpHeader,
    pub message: RtmpMessage,
}

/// Inbound half of a connection.
///
/// Applies protocol control messages as they arrive and queues the replies
/// they call for (acknowledgements, ping responses, window sizes). The owner
/// of the outbound half drains those with [`MessageReader::take_replies`].
pub struct MessageReader<R> {
    reader: R,
    chunks: ChunkReader,

    /// Window announced by the server; acknowledge every this many bytes
    ack_window: Option<u32>,

    /// `bytes_read` at the last acknowledgement
    acked_bytes: u64,

    /// Window we last announced with WindowAckSize
    announced_window: Option<u32>,

    /// Limit type of the last SetPeerBandwidth
    peer_limit: Option<PeerBandwidthLimit>,

    pending_replies: Vec<RtmpMessage>,
}

impl<R: AsyncRead + Unpin> MessageReader<R> {
    pub fn new(reader: R) -> Self {
        MessageReader {
            reader,
            chunks: ChunkReader::new(),
            ack_window: None,
            acked_bytes: 0,
            announced_window: None,
            peer_limit: None,
            pending_replies: Vec::new(),
        }
    }

    /// Record the window we announced so SetPeerBandwidth does not echo it
    pub fn set_announced_window(&mut self, window: u32) {
        self.announced_window = Some(window);
    }

    /// Inbound chunk size currently in effect
    pub fn chunk_size(&self) -> usize {
        self.chunks.chunk_size()
    }

    pub fn bytes_read(&self) -> u64 {
        self.chunks.bytes_read()
    }

    pub fn ack_window(&self) -> Option<u32> {
        self.ack_window
    }

    /// Replies queued by control messages since the last call
    pub fn take_replies(&mut self) -> Vec<RtmpMessage> {
        std::mem::take(&mut self.pending_replies)
    }

    /// Read the next message this client understands.
    ///
    /// Malformed or unknown messages are logged and skipped; only errors
    /// that end the session are returned.
    pub async fn read_message(&mut self) -> Result<ReceivedMessage> {
        loop {
            let packet = match self.chunks.read_message(&mut self.reader).await {
                Ok(packet) => packet,
                Err(e) if !e.is_fatal() => {
                    warn!("Dropping inbound message: {}", e);
                    continue;
                }
                Err(e) => return Err(e),
            };
            self.check_acknowledgement();

            let message = match RtmpMessage::decode(&packet) {
                Ok(Some(message)) => message,
                Ok(None) => {
                    debug!("Ignoring message type {}", packet.message_type());
                    continue;
                }
                Err(e) if !e.is_fatal() => {
                    warn!("Dropping undecodable message type {}: {}", packet.message_type(), e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            self.apply_control(&message);
            return Ok(ReceivedMessage {
                header: packet.header,
                message,
            });
        }
    }

    fn apply_control(&mut self, message: &RtmpMessage) {
        match message {
            RtmpMessage::SetChunkSize(size) => {
                debug!("Inbound chunk size set to {}", size);
                self.chunks.set_chunk_size(*size as usize);
            }
            RtmpMessage::Abort { chunk_stream_id } => {
                debug!("Abort on chunk stream {}", chunk_stream_id);
                self.chunks.abort(*chunk_stream_id);
            }
            RtmpMessage::WindowAckSize(window) => {
                debug!("Server window acknowledgement size {}", window);
                self.ack_window = Some(*window);
            }
            RtmpMessage::SetPeerBandwidth { window_size, limit } => {
                self.apply_peer_bandwidth(*window_size, *limit);
            }
            RtmpMessage::UserControl(UserControlEvent::PingRequest(timestamp)) => {
                trace!("Ping request {}", timestamp);
                self.pending_replies
                    .push(RtmpMessage::UserControl(UserControlEvent::PingResponse(*timestamp)));
            }
            RtmpMessage::Acknowledgement { sequence_number } => {
                trace!("Server acknowledged {} bytes", sequence_number);
            }
            _ => {}
        }
    }

    fn apply_peer_bandwidth(&mut self, window_size: u32, limit: PeerBandwidthLimit) {
        let effective = match limit {
            PeerBandwidthLimit::Hard => Some(window_size),
            PeerBandwidthLimit::Soft => {
                Some(self.announced_window.map_or(window_size, |w| w.min(window_size)))
            }
            // Dynamic counts as hard only after a hard limit
            PeerBandwidthLimit::Dynamic => {
                (self.peer_limit == Some(PeerBandwidthLimit::Hard)).then_some(window_size)
            }
        };
        self.peer_limit = Some(limit);

        if let Some(window) = effective {
            if self.announced_window != Some(window) {
                debug!("Answering peer bandwidth {:?} with window {}", limit, window);
                self.announced_window = Some(window);
                self.pending_replies.push(RtmpMessage::WindowAckSize(window));
            }
        }
    }

    fn check_acknowledgement(&mut self) {
        let Some(window) = self.ack_window else {
            return;
        };
        let total = self.chunks.bytes_read();
        if window > 0 && total - self.acked_bytes >= window as u64 {
            self.acked_bytes = total;
            self.pending_replies.push(RtmpMessage::Acknowledgement {
                sequence_number: total as u32,
            });
        }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{ChunkType, ChunkWriter};
    use crate::protocol::constants::*;
    use crate::protocol::RtmpCommand;
    use crate::Error;

    fn wire(messages: &[(RtmpMessage, u32)]) -> Vec<u8> {
        let mut writer = ChunkWriter::new();
        let mut bytes = Vec::new();
        for (message, cs_id) in messages {
            let packet = message.to_packet(0, 0).unwrap();
            bytes.extend(writer.create_chunks(&packet, *cs_id, ChunkType::Type0).unwrap());
            if let RtmpMessage::SetChunkSize(size) = message {
                writer.set_chunk_size(*size as usize);
            }
        }
        bytes
    }

    #[tokio::test]
    async fn test_set_chunk_size_applies_to_following_messages() {
        let big = RtmpMessage::Command(RtmpCommand::on_status("status", "NetStream.Publish.Start", &"x".repeat(500)));
        let bytes = wire(&[(RtmpMessage::SetChunkSize(4096), CHUNK_STREAM_PROTOCOL), (big.clone(), 5)]);

        let mut reader = MessageReader::new(bytes.as_slice());
        assert_eq!(reader.read_message().await.unwrap().message, RtmpMessage::SetChunkSize(4096));
        assert_eq!(reader.chunk_size(), 4096);
        assert_eq!(reader.read_message().await.unwrap().message, big);
    }

    #[tokio::test]
    async fn test_ping_queues_response() {
        let ping = RtmpMessage::UserControl(UserControlEvent::PingRequest(99));
        let bytes = wire(&[(ping, CHUNK_STREAM_PROTOCOL)]);

        let mut reader = MessageReader::new(bytes.as_slice());
        reader.read_message().await.unwrap();
        assert_eq!(
            reader.take_replies(),
            vec![RtmpMessage::UserControl(UserControlEvent::PingResponse(99))]
        );
        assert!(reader.take_replies().is_empty());
    }

    #[tokio::test]
    async fn test_acknowledgement_after_window() {
        let filler = RtmpMessage::Audio(vec![0u8; 100]);
        let bytes = wire(&[
            (RtmpMessage::WindowAckSize(150), CHUNK_STREAM_PROTOCOL),
            (filler.clone(), 5),
            (filler, 5),
        ]);

        let mut reader = MessageReader::new(bytes.as_slice());
        reader.read_message().await.unwrap();
        reader.read_message().await.unwrap();
        assert!(reader.take_replies().is_empty());

        reader.read_message().await.unwrap();
        let replies = reader.take_replies();
        assert_eq!(
            replies,
            vec![RtmpMessage::Acknowledgement { sequence_number: reader.bytes_read() as u32 }]
        );
    }

    #[tokio::test]
    async fn test_peer_bandwidth_answered_once() {
        let hard = RtmpMessage::SetPeerBandwidth {
            window_size: 5_000_000,
            limit: PeerBandwidthLimit::Hard,
        };
        let bytes = wire(&[(hard.clone(), CHUNK_STREAM_PROTOCOL), (hard, CHUNK_STREAM_PROTOCOL)]);

        let mut reader = MessageReader::new(bytes.as_slice());
        reader.set_announced_window(DEFAULT_WINDOW_SIZE);
        reader.read_message().await.unwrap();
        assert_eq!(reader.take_replies(), vec![RtmpMessage::WindowAckSize(5_000_000)]);
        reader.read_message().await.unwrap();
        assert!(reader.take_replies().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_messages_skipped() {
        let mut bytes = Vec::new();
        // Unknown type 42, then an undecodable command, then a real one
        let mut writer = ChunkWriter::new();
        let junk = crate::protocol::RtmpPacket::new(RtmpHeader::new(0, 0, 42, 0), vec![1]);
        bytes.extend(writer.create_chunks(&junk, 3, ChunkType::Type0).unwrap());
        let bad = crate::protocol::RtmpPacket::new(RtmpHeader::new(0, 0, MSG_TYPE_COMMAND_AMF0, 0), vec![0x11]);
        bytes.extend(writer.create_chunks(&bad, 3, ChunkType::Type0).unwrap());
        bytes.extend(wire(&[(RtmpMessage::WindowAckSize(10), CHUNK_STREAM_PROTOCOL)]));

        let mut reader = MessageReader::new(bytes.as_slice());
        assert_eq!(reader.read_message().await.unwrap().message, RtmpMessage::WindowAckSize(10));

        let err = reader.read_message().await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }

    #[tokio::test]
    async fn test_orphan_type1_chunk_skipped() {
        // type 1 first chunk on chunk stream 7, then a valid control message
        let mut bytes = vec![0x47, 0x00, 0x00, 0x0A, 0x00, 0x00, 0x03, 0x08, 0xAF, 0x01, 0x21];
        bytes.extend(wire(&[(RtmpMessage::WindowAckSize(5000), CHUNK_STREAM_PROTOCOL)]));

        let mut reader = MessageReader::new(bytes.as_slice());
        assert_eq!(reader.read_message().await.unwrap().message, RtmpMessage::WindowAckSize(5000));
        assert_eq!(reader.bytes_read(), bytes.len() as u64);
    }
}
