use crate::amf::amf0::{markers, Amf0Object, Amf0Value, MAX_SHORT_STRING, OBJECT_END_SEQUENCE};
use crate::{ByteBuffer, Error, Result};

/// Appends AMF0 values to an internal buffer.
pub struct Amf0Encoder {
    buffer: ByteBuffer,
}

impl Default for Amf0Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Amf0Encoder {
    pub fn new() -> Self {
        Amf0Encoder {
            buffer: ByteBuffer::with_capacity(256),
        }
    }

    pub fn encode(&mut self, value: &Amf0Value) -> Result<()> {
        match value {
            Amf0Value::Number(n) => self.encode_number(*n),
            Amf0Value::Boolean(b) => self.encode_boolean(*b),
            Amf0Value::String(s) => self.encode_string(s),
            Amf0Value::LongString(s) => self.encode_long_string(s),
            Amf0Value::Object(obj) => {
                self.buffer.write_u8(markers::OBJECT)?;
                self.encode_properties(obj)
            }
            Amf0Value::Null => Ok(self.buffer.write_u8(markers::NULL)?),
            Amf0Value::Undefined => Ok(self.buffer.write_u8(markers::UNDEFINED)?),
            Amf0Value::EcmaArray(obj) => {
                self.buffer.write_u8(markers::ECMA_ARRAY)?;
                self.buffer.write_u32_be(checked_count(obj.len())?)?;
                self.encode_properties(obj)
            }
            Amf0Value::StrictArray(arr) => self.encode_strict_array(arr),
            Amf0Value::Date { millis, timezone } => {
                self.buffer.write_u8(markers::DATE)?;
                self.buffer.write_f64_be(*millis)?;
                self.buffer.write_i16_be(*timezone)?;
                Ok(())
            }
        }
    }

    /// Encode several values back to back
    pub fn encode_all<'a>(&mut self, values: impl IntoIterator<Item = &'a Amf0Value>) -> Result<()> {
        for value in values {
            self.encode(value)?;
        }
        Ok(())
    }

    fn encode_number(&mut self, value: f64) -> Result<()> {
        self.buffer.write_u8(markers::NUMBER)?;
        self.buffer.write_f64_be(value)?;
        Ok(())
    }

    fn encode_boolean(&mut self, value: bool) -> Result<()> {
        self.buffer.write_u8(markers::BOOLEAN)?;
        self.buffer.write_u8(value as u8)?;
        Ok(())
    }

    /// Short form only; use `Amf0Value::string` to pick the variant by length
    fn encode_string(&mut self, value: &str) -> Result<()> {
        let bytes = value.as_bytes();
        if bytes.len() > MAX_SHORT_STRING {
            return Err(Error::amf_encode(format!(
                "String of {} bytes exceeds {}",
                bytes.len(),
                MAX_SHORT_STRING
            )));
        }
        self.buffer.write_u8(markers::STRING)?;
        self.buffer.write_u16_be(bytes.len() as u16)?;
        self.buffer.write_bytes(bytes)?;
        Ok(())
    }

    fn encode_long_string(&mut self, value: &str) -> Result<()> {
        let bytes = value.as_bytes();
        self.buffer.write_u8(markers::LONG_STRING)?;
        self.buffer.write_u32_be(checked_count(bytes.len())?)?;
        self.buffer.write_bytes(bytes)?;
        Ok(())
    }

    fn encode_properties(&mut self, obj: &Amf0Object) -> Result<()> {
        for (key, value) in obj {
            self.write_key(key)?;
            self.encode(value)?;
        }
        self.buffer.write_bytes(&OBJECT_END_SEQUENCE)?;
        Ok(())
    }

    fn encode_strict_array(&mut self, arr: &[Amf0Value]) -> Result<()> {
        self.buffer.write_u8(markers::STRICT_ARRAY)?;
        self.buffer.write_u32_be(checked_count(arr.len())?)?;
        self.encode_all(arr)
    }

    /// Property names carry no marker and must fit the short form
    fn write_key(&mut self, key: &str) -> Result<()> {
        let bytes = key.as_bytes();
        if bytes.is_empty() {
            return Err(Error::amf_encode("Empty property name collides with object end"));
        }
        if bytes.len() > MAX_SHORT_STRING {
            return Err(Error::amf_encode(format!(
                "Property name of {} bytes exceeds {}",
                bytes.len(),
                MAX_SHORT_STRING
            )));
        }
        self.buffer.write_u16_be(bytes.len() as u16)?;
        self.buffer.write_bytes(bytes)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Take the encoded bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer.into_vec()
    }
}

fn checked_count(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| Error::amf_encode(format!("Length {} exceeds u32", len)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(value: &Amf0Value) -> Vec<u8> {
        let mut encoder = Amf0Encoder::new();
        encoder.encode(value).unwrap();
        encoder.into_bytes()
    }

    #[test]
    fn test_number_layout() {
        let bytes = encode(&Amf0Value::Number(1.0));
        assert_eq!(bytes, vec![0x00, 0x3F, 0xF0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_string_layout() {
        let bytes = encode(&Amf0Value::String("connect".into()));
        assert_eq!(&bytes[..3], &[0x02, 0x00, 0x07]);
        assert_eq!(&bytes[3..], b"connect");
    }

    #[test]
    fn test_long_string_layout() {
        let bytes = encode(&Amf0Value::string("a".repeat(70_000)));
        assert_eq!(bytes[0], markers::LONG_STRING);
        assert_eq!(&bytes[1..5], &70_000u32.to_be_bytes());
        assert_eq!(bytes.len(), 5 + 70_000);

        // the variant decides the marker, not the length
        let bytes = encode(&Amf0Value::LongString("abc".into()));
        assert_eq!(&bytes[..5], &[markers::LONG_STRING, 0, 0, 0, 3]);
    }

    #[test]
    fn test_oversized_short_string_rejected() {
        let mut encoder = Amf0Encoder::new();
        assert!(matches!(
            encoder.encode(&Amf0Value::String("a".repeat(70_000))),
            Err(Error::AmfEncode(_))
        ));
    }

    #[test]
    fn test_object_keeps_insertion_order() {
        let mut obj = Amf0Object::new();
        obj.insert("b".into(), Amf0Value::Null);
        obj.insert("a".into(), Amf0Value::Boolean(true));
        let bytes = encode(&Amf0Value::Object(obj));

        assert_eq!(
            bytes,
            vec![0x03, 0x00, 0x01, b'b', 0x05, 0x00, 0x01, b'a', 0x01, 0x01, 0x00, 0x00, 0x09]
        );
    }

    #[test]
    fn test_ecma_array_count_prefix() {
        let mut obj = Amf0Object::new();
        obj.insert("width".into(), Amf0Value::Number(1280.0));
        let bytes = encode(&Amf0Value::EcmaArray(obj));
        assert_eq!(&bytes[..5], &[0x08, 0, 0, 0, 1]);
        assert_eq!(&bytes[bytes.len() - 3..], &OBJECT_END_SEQUENCE);
    }

    #[test]
    fn test_empty_key_rejected() {
        let mut obj = Amf0Object::new();
        obj.insert(String::new(), Amf0Value::Null);
        let mut encoder = Amf0Encoder::new();
        assert!(matches!(
            encoder.encode(&Amf0Value::Object(obj)),
            Err(Error::AmfEncode(_))
        ));
    }
}
