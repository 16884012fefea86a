mod control;
mod types;

pub use control::*;
pub use types::*;

use crate::protocol::{RtmpCommand, RtmpData, RtmpHeader, RtmpPacket};
use crate::protocol::constants::MAX_CHUNK_SIZE;
use crate::{ByteBuffer, Error, Result};

/// A decoded RTMP message.
///
/// Each variant owns its payload layout; `encode` and `decode` are the only
/// places those layouts are spelled out.
#[derive(Debug, Clone, PartialEq)]
pub enum RtmpMessage {
    SetChunkSize(u32),
    Abort { chunk_stream_id: u32 },
    Acknowledgement { sequence_number: u32 },
    UserControl(UserControlEvent),
    WindowAckSize(u32),
    SetPeerBandwidth { window_size: u32, limit: PeerBandwidthLimit },
    Audio(Vec<u8>),
    Video(Vec<u8>),
    Command(RtmpCommand),
    Data(RtmpData),
}

impl RtmpMessage {
    pub fn message_type(&self) -> MessageType {
        match self {
            RtmpMessage::SetChunkSize(_) => MessageType::SetChunkSize,
            RtmpMessage::Abort { .. } => MessageType::Abort,
            RtmpMessage::Acknowledgement { .. } => MessageType::Acknowledgement,
            RtmpMessage::UserControl(_) => MessageType::UserControl,
            RtmpMessage::WindowAckSize(_) => MessageType::WindowAckSize,
            RtmpMessage::SetPeerBandwidth { .. } => MessageType::SetPeerBandwidth,
            RtmpMessage::Audio(_) => MessageType::Audio,
            RtmpMessage::Video(_) => MessageType::Video,
            RtmpMessage::Command(_) => MessageType::CommandAmf0,
            RtmpMessage::Data(_) => MessageType::DataAmf0,
        }
    }

    /// Decode a reassembled packet.
    ///
    /// Unknown type ids are a protocol error. Known types this client has no
    /// use for (AMF3, shared objects, aggregates) decode to `None`.
    pub fn decode(packet: &RtmpPacket) -> Result<Option<RtmpMessage>> {
        let message_type = MessageType::from_id(packet.message_type()).ok_or_else(|| {
            Error::protocol(format!("Unknown message type: {}", packet.message_type()))
        })?;

        let payload = packet.payload.as_slice();
        let message = match message_type {
            MessageType::SetChunkSize => {
                let size = read_u32(payload, "SetChunkSize")? & MAX_CHUNK_SIZE;
                if size == 0 {
                    return Err(Error::protocol("SetChunkSize of zero"));
                }
                RtmpMessage::SetChunkSize(size)
            }
            MessageType::Abort => RtmpMessage::Abort {
                chunk_stream_id: read_u32(payload, "Abort")?,
            },
            MessageType::Acknowledgement => RtmpMessage::Acknowledgement {
                sequence_number: read_u32(payload, "Acknowledgement")?,
            },
            MessageType::UserControl => RtmpMessage::UserControl(UserControlEvent::decode(payload)?),
            MessageType::WindowAckSize => {
                RtmpMessage::WindowAckSize(read_u32(payload, "WindowAckSize")?)
            }
            MessageType::SetPeerBandwidth => {
                if payload.len() < 5 {
                    return Err(Error::protocol("SetPeerBandwidth payload too short"));
                }
                RtmpMessage::SetPeerBandwidth {
                    window_size: read_u32(payload, "SetPeerBandwidth")?,
                    limit: PeerBandwidthLimit::from_u8(payload[4])?,
                }
            }
            MessageType::Audio => RtmpMessage::Audio(packet.payload.clone()),
            MessageType::Video => RtmpMessage::Video(packet.payload.clone()),
            MessageType::CommandAmf0 => RtmpMessage::Command(RtmpCommand::decode(payload)?),
            MessageType::DataAmf0 => RtmpMessage::Data(RtmpData::decode(payload)?),
            MessageType::DataAmf3
            | MessageType::SharedObjectAmf3
            | MessageType::CommandAmf3
            | MessageType::SharedObjectAmf0
            | MessageType::Aggregate => return Ok(None),
        };
        Ok(Some(message))
    }

    /// Serialize the payload
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buffer = ByteBuffer::with_capacity(5);
        match self {
            RtmpMessage::SetChunkSize(size) => buffer.write_u32_be(size & MAX_CHUNK_SIZE)?,
            RtmpMessage::Abort { chunk_stream_id } => buffer.write_u32_be(*chunk_stream_id)?,
            RtmpMessage::Acknowledgement { sequence_number } => {
                buffer.write_u32_be(*sequence_number)?
            }
            RtmpMessage::UserControl(event) => return event.encode(),
            RtmpMessage::WindowAckSize(size) => buffer.write_u32_be(*size)?,
            RtmpMessage::SetPeerBandwidth { window_size, limit } => {
                buffer.write_u32_be(*window_size)?;
                buffer.write_u8(limit.as_u8())?;
            }
            RtmpMessage::Audio(data) | RtmpMessage::Video(data) => return Ok(data.clone()),
            RtmpMessage::Command(command) => return command.encode(),
            RtmpMessage::Data(data) => return data.encode(),
        }
        Ok(buffer.into_vec())
    }

    /// Build the packet that carries this message
    pub fn to_packet(&self, timestamp: u32, message_stream_id: u32) -> Result<RtmpPacket> {
        let payload = self.encode()?;
        let header = RtmpHeader::new(
            timestamp,
            payload.len() as u32,
            self.message_type().id(),
            message_stream_id,
        );
        Ok(RtmpPacket::new(header, payload))
    }
}

fn read_u32(payload: &[u8], what: &str) -> Result<u32> {
    let bytes: [u8; 4] = payload
        .get(..4)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| Error::protocol(format!("{} payload too short: {} bytes", what, payload.len())))?;
    Ok(u32::from_be_bytes(bytes))
}
