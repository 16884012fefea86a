use crate::protocol::constants::*;

/// A complete RTMP message: header fields plus the reassembled payload.
#[derive(Debug, Clone, PartialEq)]
pub struct RtmpPacket {
    pub header: RtmpHeader,
    pub payload: Vec<u8>,
}

impl RtmpPacket {
    /// Create a packet; the header length is taken from the payload
    pub fn new(header: RtmpHeader, payload: Vec<u8>) -> Self {
        let header = RtmpHeader {
            message_length: payload.len() as u32,
            ..header
        };
        RtmpPacket { header, payload }
    }

    /// Get message type
    pub fn message_type(&self) -> u8 {
        self.header.message_type
    }

    /// Get message stream ID
    pub fn message_stream_id(&self) -> u32 {
        self.header.message_stream_id
    }

    /// Get timestamp
    pub fn timestamp(&self) -> u32 {
        self.header.timestamp
    }

    pub fn is_audio(&self) -> bool {
        self.header.message_type == MSG_TYPE_AUDIO
    }

    pub fn is_video(&self) -> bool {
        self.header.message_type == MSG_TYPE_VIDEO
    }

    pub fn is_command(&self) -> bool {
        self.header.message_type == MSG_TYPE_COMMAND_AMF0
    }
}

/// Message header fields shared by every chunk of one message.
///
/// `timestamp` is whatever the sender put on the wire: absolute for a
/// type 0 chunk, the accumulated value after applying deltas otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtmpHeader {
    pub timestamp: u32,
    pub message_length: u32,
    pub message_type: u8,
    pub message_stream_id: u32,
}

impl RtmpHeader {
    pub fn new(
        timestamp: u32,
        message_length: u32,
        message_type: u8,
        message_stream_id: u32,
    ) -> Self {
        RtmpHeader {
            timestamp,
            message_length,
            message_type,
            message_stream_id,
        }
    }

    /// Check if timestamp needs the extended field (>= 0xFFFFFF)
    pub fn has_extended_timestamp(&self) -> bool {
        self.timestamp >= EXTENDED_TIMESTAMP_MARKER
    }

    /// Value of the 3-byte timestamp field
    pub fn wire_timestamp(&self) -> u32 {
        self.timestamp.min(EXTENDED_TIMESTAMP_MARKER)
    }
}
