use std::io::Error as IoError;
use crate::amf::amf0::{markers, Amf0Object, Amf0Value, OBJECT_END_SEQUENCE};
use crate::{ByteBuffer, Error, Result};

/// Nesting limit for objects and arrays
const MAX_DEPTH: usize = 64;

/// Reads consecutive AMF0 values from a borrowed cursor.
///
/// A failed decode leaves the cursor wherever the failure happened; callers
/// that need to recover re-create the cursor from the message boundary.
pub struct Amf0Decoder<'a> {
    buffer: &'a mut ByteBuffer,
    depth: usize,
}

fn truncated(e: IoError) -> Error {
    Error::amf_decode(format!("Truncated value: {}", e))
}

impl<'a> Amf0Decoder<'a> {
    pub fn new(buffer: &'a mut ByteBuffer) -> Self {
        Amf0Decoder { buffer, depth: 0 }
    }

    /// Check if decoder has remaining data to decode
    pub fn has_remaining(&self) -> bool {
        self.buffer.remaining() > 0
    }

    /// Cursor position in the underlying buffer
    pub fn position(&self) -> usize {
        self.buffer.position()
    }

    pub fn decode(&mut self) -> Result<Amf0Value> {
        let marker = self.buffer.read_u8().map_err(truncated)?;
        match marker {
            markers::NUMBER => Ok(Amf0Value::Number(self.read_f64()?)),
            markers::BOOLEAN => Ok(Amf0Value::Boolean(self.read_u8()? != 0)),
            markers::STRING => {
                let len = self.buffer.read_u16_be().map_err(truncated)? as usize;
                Ok(Amf0Value::String(self.read_utf8(len)?))
            }
            markers::OBJECT => Ok(Amf0Value::Object(self.nested(Self::read_properties)?)),
            markers::NULL => Ok(Amf0Value::Null),
            markers::UNDEFINED => Ok(Amf0Value::Undefined),
            markers::ECMA_ARRAY => {
                // The count is advisory, the end marker terminates
                let _count = self.buffer.read_u32_be().map_err(truncated)?;
                Ok(Amf0Value::EcmaArray(self.nested(Self::read_properties)?))
            }
            markers::STRICT_ARRAY => Ok(Amf0Value::StrictArray(self.nested(Self::read_elements)?)),
            markers::DATE => {
                let millis = self.read_f64()?;
                let timezone = self.buffer.read_i16_be().map_err(truncated)?;
                Ok(Amf0Value::Date { millis, timezone })
            }
            markers::LONG_STRING => {
                let len = self.buffer.read_u32_be().map_err(truncated)? as usize;
                Ok(Amf0Value::LongString(self.read_utf8(len)?))
            }
            _ => Err(Error::amf_decode(format!("Unknown AMF0 marker: 0x{:02x}", marker))),
        }
    }

    /// Decode values until the buffer is exhausted
    pub fn decode_all(&mut self) -> Result<Vec<Amf0Value>> {
        let mut values = Vec::new();
        while self.has_remaining() {
            values.push(self.decode()?);
        }
        Ok(values)
    }

    fn nested<T>(&mut self, read: fn(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_DEPTH {
            return Err(Error::amf_decode("AMF0 nesting too deep"));
        }
        self.depth += 1;
        let result = read(self);
        self.depth -= 1;
        result
    }

    fn read_properties(&mut self) -> Result<Amf0Object> {
        let mut object = Amf0Object::new();
        loop {
            match self.buffer.peek_bytes(OBJECT_END_SEQUENCE.len()) {
                Some(next) if next == OBJECT_END_SEQUENCE => {
                    self.buffer.read_bytes(OBJECT_END_SEQUENCE.len()).map_err(truncated)?;
                    return Ok(object);
                }
                Some(_) => {}
                None => return Err(Error::amf_decode("Object ended without end marker")),
            }
            let key_len = self.buffer.read_u16_be().map_err(truncated)? as usize;
            let key = self.read_utf8(key_len)?;
            let value = self.decode()?;
            object.insert(key, value);
        }
    }

    fn read_elements(&mut self) -> Result<Vec<Amf0Value>> {
        let count = self.buffer.read_u32_be().map_err(truncated)? as usize;
        // Every element takes at least one byte
        let mut elements = Vec::with_capacity(count.min(self.buffer.remaining()));
        for _ in 0..count {
            elements.push(self.decode()?);
        }
        Ok(elements)
    }

    fn read_u8(&mut self) -> Result<u8> {
        self.buffer.read_u8().map_err(truncated)
    }

    fn read_f64(&mut self) -> Result<f64> {
        self.buffer.read_f64_be().map_err(truncated)
    }

    fn read_utf8(&mut self, len: usize) -> Result<String> {
        let bytes = self.buffer.read_bytes(len).map_err(truncated)?;
        String::from_utf8(bytes).map_err(|e| Error::amf_decode(format!("Invalid UTF-8: {}", e)))
    }
}
