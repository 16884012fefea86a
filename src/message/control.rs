use crate::{ByteBuffer, Error, Result};

/// Limit type carried by SetPeerBandwidth
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerBandwidthLimit {
    Hard,
    Soft,
    Dynamic,
}

impl PeerBandwidthLimit {
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(PeerBandwidthLimit::Hard),
            1 => Ok(PeerBandwidthLimit::Soft),
            2 => Ok(PeerBandwidthLimit::Dynamic),
            other => Err(Error::protocol(format!("Invalid peer bandwidth limit type: {}", other))),
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            PeerBandwidthLimit::Hard => 0,
            PeerBandwidthLimit::Soft => 1,
            PeerBandwidthLimit::Dynamic => 2,
        }
    }
}

// User control event types
pub const EVENT_STREAM_BEGIN: u16 = 0;
pub const EVENT_STREAM_EOF: u16 = 1;
pub const EVENT_STREAM_DRY: u16 = 2;
pub const EVENT_SET_BUFFER_LENGTH: u16 = 3;
pub const EVENT_STREAM_IS_RECORDED: u16 = 4;
pub const EVENT_PING_REQUEST: u16 = 6;
pub const EVENT_PING_RESPONSE: u16 = 7;

/// User control message (type 4) events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserControlEvent {
    StreamBegin(u32),
    StreamEof(u32),
    StreamDry(u32),
    SetBufferLength { stream_id: u32, buffer_ms: u32 },
    StreamIsRecorded(u32),
    PingRequest(u32),
    PingResponse(u32),
    /// Event types this client does not interpret
    Other { event_type: u16, data: Vec<u8> },
}

impl UserControlEvent {
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut buffer = ByteBuffer::new(payload.to_vec());
        let short = |e: std::io::Error| Error::protocol(format!("Truncated user control event: {}", e));

        let event_type = buffer.read_u16_be().map_err(short)?;
        let event = match event_type {
            EVENT_STREAM_BEGIN => UserControlEvent::StreamBegin(buffer.read_u32_be().map_err(short)?),
            EVENT_STREAM_EOF => UserControlEvent::StreamEof(buffer.read_u32_be().map_err(short)?),
            EVENT_STREAM_DRY => UserControlEvent::StreamDry(buffer.read_u32_be().map_err(short)?),
            EVENT_SET_BUFFER_LENGTH => UserControlEvent::SetBufferLength {
                stream_id: buffer.read_u32_be().map_err(short)?,
                buffer_ms: buffer.read_u32_be().map_err(short)?,
            },
            EVENT_STREAM_IS_RECORDED => {
                UserControlEvent::StreamIsRecorded(buffer.read_u32_be().map_err(short)?)
            }
            EVENT_PING_REQUEST => UserControlEvent::PingRequest(buffer.read_u32_be().map_err(short)?),
            EVENT_PING_RESPONSE => UserControlEvent::PingResponse(buffer.read_u32_be().map_err(short)?),
            _ => UserControlEvent::Other {
                event_type,
                data: buffer.remaining_slice().to_vec(),
            },
        };
        Ok(event)
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buffer = ByteBuffer::with_capacity(10);
        match self {
            UserControlEvent::StreamBegin(id) => write_event(&mut buffer, EVENT_STREAM_BEGIN, &[*id])?,
            UserControlEvent::StreamEof(id) => write_event(&mut buffer, EVENT_STREAM_EOF, &[*id])?,
            UserControlEvent::StreamDry(id) => write_event(&mut buffer, EVENT_STREAM_DRY, &[*id])?,
            UserControlEvent::SetBufferLength { stream_id, buffer_ms } => {
                write_event(&mut buffer, EVENT_SET_BUFFER_LENGTH, &[*stream_id, *buffer_ms])?
            }
            UserControlEvent::StreamIsRecorded(id) => {
                write_event(&mut buffer, EVENT_STREAM_IS_RECORDED, &[*id])?
            }
            UserControlEvent::PingRequest(ts) => write_event(&mut buffer, EVENT_PING_REQUEST, &[*ts])?,
            UserControlEvent::PingResponse(ts) => write_event(&mut buffer, EVENT_PING_RESPONSE, &[*ts])?,
            UserControlEvent::Other { event_type, data } => {
                buffer.write_u16_be(*event_type)?;
                buffer.write_bytes(data)?;
            }
        }
        Ok(buffer.into_vec())
    }
}

fn write_event(buffer: &mut ByteBuffer, event_type: u16, fields: &[u32]) -> Result<()> {
    buffer.write_u16_be(event_type)?;
    for field in fields {
        buffer.write_u32_be(*field)?;
    }
    Ok(())
}
