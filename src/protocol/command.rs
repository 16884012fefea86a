use crate::amf::{Amf0Decoder, Amf0Encoder, Amf0Object, Amf0Value};
use crate::protocol::constants::*;
use crate::{ByteBuffer, Error, Result};

/// Flash version string sent with `connect`
pub const DEFAULT_FLASH_VER: &str = "FMLE/3.0 (compatible; FMSc/1.0)";

pub const COMMAND_RESULT: &str = "_result";
pub const COMMAND_ERROR: &str = "_error";
pub const COMMAND_ON_STATUS: &str = "onStatus";

/// AMF0 command message: name, transaction id, command object and
/// positional arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct RtmpCommand {
    pub name: String,
    pub transaction_id: f64,
    pub command_object: Amf0Value,
    pub arguments: Vec<Amf0Value>,
}

/// Properties of the `connect` command object
#[derive(Debug, Clone)]
pub struct ConnectParams {
    pub app: String,
    pub tc_url: String,
    pub flash_ver: String,
}

impl ConnectParams {
    /// Command object in the property order encoders expect
    pub fn to_object(&self) -> Amf0Object {
        let mut obj = Amf0Object::new();
        obj.insert("app".into(), Amf0Value::string(self.app.as_str()));
        obj.insert("flashVer".into(), Amf0Value::string(self.flash_ver.as_str()));
        obj.insert("swfUrl".into(), Amf0Value::string(""));
        obj.insert("tcUrl".into(), Amf0Value::string(self.tc_url.as_str()));
        obj.insert("fpad".into(), Amf0Value::Boolean(false));
        obj.insert("capabilities".into(), Amf0Value::Number(239.0));
        obj.insert("audioCodecs".into(), Amf0Value::Number(3575.0));
        obj.insert("pageUrl".into(), Amf0Value::string(""));
        obj.insert("objectEncoding".into(), Amf0Value::Number(0.0));
        obj.insert("videoCodecs".into(), Amf0Value::Number(252.0));
        obj.insert("videoFunction".into(), Amf0Value::Number(1.0));
        obj
    }
}

impl RtmpCommand {
    /// Create a command with a Null command object and no arguments
    pub fn new(name: impl Into<String>, transaction_id: f64) -> Self {
        RtmpCommand {
            name: name.into(),
            transaction_id,
            command_object: Amf0Value::Null,
            arguments: Vec::new(),
        }
    }

    /// Append a positional argument
    pub fn with_argument(mut self, value: Amf0Value) -> Self {
        self.arguments.push(value);
        self
    }

    pub fn connect(params: &ConnectParams) -> Self {
        let mut cmd = RtmpCommand::new("connect", TRANSACTION_CONNECT);
        cmd.command_object = Amf0Value::Object(params.to_object());
        cmd
    }

    pub fn release_stream(stream_name: &str) -> Self {
        RtmpCommand::new("releaseStream", TRANSACTION_RELEASE_STREAM)
            .with_argument(Amf0Value::string(stream_name))
    }

    pub fn fc_publish(stream_name: &str) -> Self {
        RtmpCommand::new("FCPublish", TRANSACTION_FC_PUBLISH)
            .with_argument(Amf0Value::string(stream_name))
    }

    pub fn create_stream() -> Self {
        RtmpCommand::new("createStream", TRANSACTION_CREATE_STREAM)
    }

    pub fn publish(stream_name: &str, publish_type: &str) -> Self {
        RtmpCommand::new("publish", TRANSACTION_PUBLISH)
            .with_argument(Amf0Value::string(stream_name))
            .with_argument(Amf0Value::string(publish_type))
    }

    pub fn fc_unpublish(stream_name: &str) -> Self {
        RtmpCommand::new("FCUnpublish", TRANSACTION_FC_UNPUBLISH)
            .with_argument(Amf0Value::string(stream_name))
    }

    pub fn delete_stream(stream_id: u32) -> Self {
        RtmpCommand::new("deleteStream", TRANSACTION_DELETE_STREAM)
            .with_argument(Amf0Value::Number(stream_id as f64))
    }

    /// Create result response
    pub fn result(transaction_id: f64, command_object: Amf0Value, result: Amf0Value) -> Self {
        let mut cmd = RtmpCommand::new(COMMAND_RESULT, transaction_id);
        cmd.command_object = command_object;
        cmd.with_argument(result)
    }

    /// Create error response
    pub fn error(transaction_id: f64, info: Amf0Value) -> Self {
        RtmpCommand::new(COMMAND_ERROR, transaction_id).with_argument(info)
    }

    /// Create onStatus notification
    pub fn on_status(level: &str, code: &str, description: &str) -> Self {
        let mut info = Amf0Object::new();
        info.insert("level".into(), Amf0Value::string(level));
        info.insert("code".into(), Amf0Value::string(code));
        info.insert("description".into(), Amf0Value::string(description));
        RtmpCommand::new(COMMAND_ON_STATUS, 0.0).with_argument(Amf0Value::Object(info))
    }

    pub fn is_result(&self) -> bool {
        self.name == COMMAND_RESULT
    }

    pub fn is_error(&self) -> bool {
        self.name == COMMAND_ERROR
    }

    /// The info object of a reply or status: first Object argument
    pub fn info(&self) -> Option<&Amf0Value> {
        self.arguments.iter().find(|v| v.as_object().is_some())
    }

    /// `code` of the info object, if any
    pub fn status_code(&self) -> Option<&str> {
        self.info().and_then(|info| info.get_string("code"))
    }

    /// `level` of the info object, if any
    pub fn status_level(&self) -> Option<&str> {
        self.info().and_then(|info| info.get_string("level"))
    }

    /// Short human readable reason carried by an `_error` or status reply
    pub fn describe(&self) -> String {
        let info = self.info();
        let code = info.and_then(|i| i.get_string("code")).unwrap_or("no code");
        match info.and_then(|i| i.get_string("description")) {
            Some(description) => format!("{} ({}): {}", self.name, code, description),
            None => format!("{} ({})", self.name, code),
        }
    }

    /// Encode command to bytes
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut encoder = Amf0Encoder::new();
        encoder.encode(&Amf0Value::string(self.name.as_str()))?;
        encoder.encode(&Amf0Value::Number(self.transaction_id))?;
        encoder.encode(&self.command_object)?;
        encoder.encode_all(&self.arguments)?;
        Ok(encoder.into_bytes())
    }

    /// Decode command from bytes
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut buffer = ByteBuffer::new(data.to_vec());
        let mut decoder = Amf0Decoder::new(&mut buffer);

        let name = decoder.decode()?
            .as_string()
            .ok_or_else(|| Error::amf_decode("Command name must be string"))?
            .to_string();

        let transaction_id = decoder.decode()?
            .as_number()
            .ok_or_else(|| Error::amf_decode("Transaction ID must be number"))?;

        // Some servers omit the command object entirely
        let command_object = if decoder.has_remaining() {
            decoder.decode()?
        } else {
            Amf0Value::Null
        };

        let arguments = decoder.decode_all()?;

        Ok(RtmpCommand {
            name,
            transaction_id,
            command_object,
            arguments,
        })
    }
}
