use crate::amf::{Amf0Decoder, Amf0Encoder, Amf0Object, Amf0Value};
use crate::{ByteBuffer, Error, Result};

pub const SET_DATA_FRAME: &str = "@setDataFrame";
pub const ON_METADATA: &str = "onMetaData";

/// AMF0 data message: a type string followed by values.
#[derive(Debug, Clone, PartialEq)]
pub struct RtmpData {
    pub data_type: String,
    pub values: Vec<Amf0Value>,
}

impl RtmpData {
    pub fn new(data_type: impl Into<String>) -> Self {
        RtmpData {
            data_type: data_type.into(),
            values: Vec::new(),
        }
    }

    /// `@setDataFrame("onMetaData", ecma_array)` as sent by publishers
    pub fn set_metadata(metadata: Amf0Object) -> Self {
        let mut data = RtmpData::new(SET_DATA_FRAME);
        data.values.push(Amf0Value::string(ON_METADATA));
        data.values.push(Amf0Value::EcmaArray(metadata));
        data
    }

    /// Metadata properties carried by `@setDataFrame` or `onMetaData`
    pub fn metadata(&self) -> Option<&Amf0Object> {
        let value = match self.data_type.as_str() {
            SET_DATA_FRAME => self.values.get(1),
            ON_METADATA => self.values.first(),
            _ => None,
        };
        value.and_then(Amf0Value::as_object)
    }

    /// Encode data message to bytes
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut encoder = Amf0Encoder::new();
        encoder.encode(&Amf0Value::string(self.data_type.as_str()))?;
        encoder.encode_all(&self.values)?;
        Ok(encoder.into_bytes())
    }

    /// Decode data message from bytes
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut buffer = ByteBuffer::new(data.to_vec());
        let mut decoder = Amf0Decoder::new(&mut buffer);

        let data_type = decoder.decode()?
            .as_string()
            .ok_or_else(|| Error::amf_decode("Data type must be string"))?
            .to_string();
        let values = decoder.decode_all()?;

        Ok(RtmpData { data_type, values })
    }
}
