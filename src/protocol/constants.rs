// Message type ids
pub const MSG_TYPE_SET_CHUNK_SIZE: u8 = 1;
pub const MSG_TYPE_ABORT: u8 = 2;
pub const MSG_TYPE_ACK: u8 = 3;
pub const MSG_TYPE_USER_CONTROL: u8 = 4;
pub const MSG_TYPE_WINDOW_ACK: u8 = 5;
pub const MSG_TYPE_SET_PEER_BW: u8 = 6;
pub const MSG_TYPE_AUDIO: u8 = 8;
pub const MSG_TYPE_VIDEO: u8 = 9;
pub const MSG_TYPE_DATA_AMF3: u8 = 15;
pub const MSG_TYPE_SHARED_OBJECT_AMF3: u8 = 16;
pub const MSG_TYPE_COMMAND_AMF3: u8 = 17;
pub const MSG_TYPE_DATA_AMF0: u8 = 18;
pub const MSG_TYPE_SHARED_OBJECT_AMF0: u8 = 19;
pub const MSG_TYPE_COMMAND_AMF0: u8 = 20;
pub const MSG_TYPE_AGGREGATE: u8 = 22;

// Chunk stream ids used by the publisher
pub const CHUNK_STREAM_PROTOCOL: u32 = 2;
pub const CHUNK_STREAM_COMMAND: u32 = 3;
pub const CHUNK_STREAM_DATA: u32 = 4;
pub const CHUNK_STREAM_AUDIO: u32 = 5;
pub const CHUNK_STREAM_VIDEO: u32 = 6;
pub const CHUNK_STREAM_STREAM_COMMAND: u32 = 8;

// Highest id the 3-byte basic header can carry
pub const MAX_CHUNK_STREAM_ID: u32 = 65599;

// Transaction ids of the publish sequence
pub const TRANSACTION_CONNECT: f64 = 1.0;
pub const TRANSACTION_RELEASE_STREAM: f64 = 2.0;
pub const TRANSACTION_FC_PUBLISH: f64 = 3.0;
pub const TRANSACTION_CREATE_STREAM: f64 = 4.0;
pub const TRANSACTION_PUBLISH: f64 = 5.0;
pub const TRANSACTION_FC_UNPUBLISH: f64 = 6.0;
pub const TRANSACTION_DELETE_STREAM: f64 = 7.0;

// Default values
pub const DEFAULT_CHUNK_SIZE: u32 = 128;
pub const DEFAULT_WINDOW_SIZE: u32 = 2_500_000;
pub const DEFAULT_PUBLISH_CHUNK_SIZE: u32 = 8192;
pub const DEFAULT_PORT: u16 = 1935;
pub const DEFAULT_TLS_PORT: u16 = 443;

// Chunk size bounds accepted from peers (31 bits)
pub const MIN_CHUNK_SIZE: u32 = 1;
pub const MAX_CHUNK_SIZE: u32 = 0x7FFF_FFFF;

// Timestamp field saturates here and the extended field takes over
pub const EXTENDED_TIMESTAMP_MARKER: u32 = 0x00FF_FFFF;
