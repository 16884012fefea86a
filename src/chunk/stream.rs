use crate::protocol::{RtmpHeader, RtmpPacket};

/// Reassembly state for one inbound chunk stream.
///
/// Lives as long as the connection. Type 1/2/3 chunks fill their missing
/// header fields from `prev_header`.
#[derive(Debug, Clone, Default)]
pub struct ChunkStreamContext {
    /// Header of the most recent message started on this chunk stream
    pub prev_header: Option<RtmpHeader>,

    /// Timestamp delta carried by the last type 1/2 chunk, 0 after type 0
    pub last_delta: u32,

    /// Whether the last message header used the extended timestamp field
    pub extended_timestamp: bool,

    /// Header of the message being assembled
    current_header: Option<RtmpHeader>,

    /// Payload received so far for the current message
    message_buffer: Vec<u8>,
}

impl ChunkStreamContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a message is partially received
    pub fn is_assembling(&self) -> bool {
        self.current_header.is_some()
    }

    /// Bytes still missing from the current message
    pub fn bytes_remaining(&self) -> usize {
        match &self.current_header {
            Some(header) => (header.message_length as usize).saturating_sub(self.message_buffer.len()),
            None => 0,
        }
    }

    /// Begin a new message; any partial message is dropped
    pub fn start_message(&mut self, header: RtmpHeader, delta: u32, extended: bool) {
        self.prev_header = Some(header);
        self.last_delta = delta;
        self.extended_timestamp = extended;
        self.current_header = Some(header);
        self.message_buffer.clear();
        self.message_buffer.reserve(header.message_length as usize);
    }

    /// Append chunk payload, returning the message once it is complete
    pub fn add_chunk_data(&mut self, data: &[u8]) -> Option<RtmpPacket> {
        self.message_buffer.extend_from_slice(data);
        if self.bytes_remaining() > 0 {
            return None;
        }
        let header = self.current_header.take()?;
        Some(RtmpPacket {
            header,
            payload: std::mem::take(&mut self.message_buffer),
        })
    }

    /// Discard the partial message; header history is kept
    pub fn abort(&mut self) {
        self.current_header = None;
        self.message_buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assembles_across_chunks() {
        let mut ctx = ChunkStreamContext::new();
        ctx.start_message(RtmpHeader::new(10, 5, 9, 1), 0, false);

        assert!(ctx.add_chunk_data(&[1, 2, 3]).is_none());
        assert_eq!(ctx.bytes_remaining(), 2);

        let packet = ctx.add_chunk_data(&[4, 5]).unwrap();
        assert_eq!(packet.payload, vec![1, 2, 3, 4, 5]);
        assert!(!ctx.is_assembling());
        assert_eq!(ctx.prev_header.map(|h| h.timestamp), Some(10));
    }

    #[test]
    fn test_empty_message_completes_immediately() {
        let mut ctx = ChunkStreamContext::new();
        ctx.start_message(RtmpHeader::new(0, 0, 20, 0), 0, false);
        let packet = ctx.add_chunk_data(&[]).unwrap();
        assert!(packet.payload.is_empty());
    }

    #[test]
    fn test_abort_discards_partial() {
        let mut ctx = ChunkStreamContext::new();
        ctx.start_message(RtmpHeader::new(0, 10, 9, 1), 0, false);
        ctx.add_chunk_data(&[0; 4]);
        ctx.abort();

        assert!(!ctx.is_assembling());
        assert_eq!(ctx.bytes_remaining(), 0);
        assert!(ctx.prev_header.is_some());
    }
}
