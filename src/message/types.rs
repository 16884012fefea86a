use crate::protocol::constants::*;

/// RTMP message type ids this stack recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    SetChunkSize = MSG_TYPE_SET_CHUNK_SIZE,
    Abort = MSG_TYPE_ABORT,
    Acknowledgement = MSG_TYPE_ACK,
    UserControl = MSG_TYPE_USER_CONTROL,
    WindowAckSize = MSG_TYPE_WINDOW_ACK,
    SetPeerBandwidth = MSG_TYPE_SET_PEER_BW,
    Audio = MSG_TYPE_AUDIO,
    Video = MSG_TYPE_VIDEO,
    DataAmf3 = MSG_TYPE_DATA_AMF3,
    SharedObjectAmf3 = MSG_TYPE_SHARED_OBJECT_AMF3,
    CommandAmf3 = MSG_TYPE_COMMAND_AMF3,
    DataAmf0 = MSG_TYPE_DATA_AMF0,
    SharedObjectAmf0 = MSG_TYPE_SHARED_OBJECT_AMF0,
    CommandAmf0 = MSG_TYPE_COMMAND_AMF0,
    Aggregate = MSG_TYPE_AGGREGATE,
}

impl MessageType {
    /// Map a wire id to a known type
    pub fn from_id(id: u8) -> Option<Self> {
        let message_type = match id {
            MSG_TYPE_SET_CHUNK_SIZE => MessageType::SetChunkSize,
            MSG_TYPE_ABORT => MessageType::Abort,
            MSG_TYPE_ACK => MessageType::Acknowledgement,
            MSG_TYPE_USER_CONTROL => MessageType::UserControl,
            MSG_TYPE_WINDOW_ACK => MessageType::WindowAckSize,
            MSG_TYPE_SET_PEER_BW => MessageType::SetPeerBandwidth,
            MSG_TYPE_AUDIO => MessageType::Audio,
            MSG_TYPE_VIDEO => MessageType::Video,
            MSG_TYPE_DATA_AMF3 => MessageType::DataAmf3,
            MSG_TYPE_SHARED_OBJECT_AMF3 => MessageType::SharedObjectAmf3,
            MSG_TYPE_COMMAND_AMF3 => MessageType::CommandAmf3,
            MSG_TYPE_DATA_AMF0 => MessageType::DataAmf0,
            MSG_TYPE_SHARED_OBJECT_AMF0 => MessageType::SharedObjectAmf0,
            MSG_TYPE_COMMAND_AMF0 => MessageType::CommandAmf0,
            MSG_TYPE_AGGREGATE => MessageType::Aggregate,
            _ => return None,
        };
        Some(message_type)
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    /// Protocol control and user control messages
    pub fn is_control(self) -> bool {
        matches!(self,
            MessageType::SetChunkSize |
            MessageType::Abort |
            MessageType::Acknowledgement |
            MessageType::UserControl |
            MessageType::WindowAckSize |
            MessageType::SetPeerBandwidth)
    }

    pub fn is_media(self) -> bool {
        matches!(self, MessageType::Audio | MessageType::Video)
    }
}
