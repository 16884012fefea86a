use std::io::{Error as IoError, ErrorKind, Result as IoResult};
use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};

/// Sequential big-endian cursor over an owned byte vector.
///
/// Reads advance the cursor and fail with `UnexpectedEof` when too few bytes
/// remain; writes always append.
#[derive(Debug, Clone, Default)]
pub struct ByteBuffer {
    buffer: Vec<u8>,
    cursor: usize,
}

impl ByteBuffer {
    /// Create a new ByteBuffer from bytes
    pub fn new(data: Vec<u8>) -> Self {
        ByteBuffer {
            buffer: data,
            cursor: 0,
        }
    }

    /// Create an empty ByteBuffer with capacity
    pub fn with_capacity(capacity: usize) -> Self {
        ByteBuffer {
            buffer: Vec::with_capacity(capacity),
            cursor: 0,
        }
    }

    /// Get current cursor position
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Set cursor position
    pub fn set_position(&mut self, pos: usize) -> IoResult<()> {
        if pos > self.buffer.len() {
            return Err(IoError::new(ErrorKind::InvalidInput, "Position out of bounds"));
        }
        self.cursor = pos;
        Ok(())
    }

    /// Get remaining bytes from current position
    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.cursor)
    }

    /// Check if buffer has at least n bytes remaining
    pub fn has_remaining(&self, n: usize) -> bool {
        self.remaining() >= n
    }

    /// Borrow the next `len` bytes and advance past them
    fn take(&mut self, len: usize) -> IoResult<&[u8]> {
        if !self.has_remaining(len) {
            return Err(IoError::new(
                ErrorKind::UnexpectedEof,
                format!("Need {} bytes, {} remaining", len, self.remaining()),
            ));
        }
        let start = self.cursor;
        self.cursor += len;
        Ok(&self.buffer[start..start + len])
    }

    /// Look at the next `len` bytes without consuming them
    pub fn peek_bytes(&self, len: usize) -> Option<&[u8]> {
        if self.has_remaining(len) {
            Some(&self.buffer[self.cursor..self.cursor + len])
        } else {
            None
        }
    }

    /// Read bytes into a new vector
    pub fn read_bytes(&mut self, len: usize) -> IoResult<Vec<u8>> {
        Ok(self.take(len)?.to_vec())
    }

    /// Write bytes to buffer
    pub fn write_bytes(&mut self, data: &[u8]) -> IoResult<()> {
        self.buffer.extend_from_slice(data);
        Ok(())
    }

    pub fn read_u8(&mut self) -> IoResult<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn write_u8(&mut self, value: u8) -> IoResult<()> {
        self.buffer.write_u8(value)
    }

    /// Read u16 (big endian)
    pub fn read_u16_be(&mut self) -> IoResult<u16> {
        self.take(2)?.read_u16::<BigEndian>()
    }

    /// Write u16 (big endian)
    pub fn write_u16_be(&mut self, value: u16) -> IoResult<()> {
        self.buffer.write_u16::<BigEndian>(value)
    }

    /// Read i16 (big endian), used by the AMF0 date timezone
    pub fn read_i16_be(&mut self) -> IoResult<i16> {
        self.take(2)?.read_i16::<BigEndian>()
    }

    /// Write i16 (big endian)
    pub fn write_i16_be(&mut self, value: i16) -> IoResult<()> {
        self.buffer.write_i16::<BigEndian>(value)
    }

    /// Read u24 (big endian), the width of RTMP timestamps and lengths
    pub fn read_u24_be(&mut self) -> IoResult<u32> {
        self.take(3)?.read_u24::<BigEndian>()
    }

    /// Write the low 24 bits of `value` (big endian)
    pub fn write_u24_be(&mut self, value: u32) -> IoResult<()> {
        self.buffer.write_u24::<BigEndian>(value & 0x00FF_FFFF)
    }

    /// Read signed i24 (big endian), used by composition time offsets
    pub fn read_i24_be(&mut self) -> IoResult<i32> {
        self.take(3)?.read_i24::<BigEndian>()
    }

    /// Write signed i24 (big endian)
    pub fn write_i24_be(&mut self, value: i32) -> IoResult<()> {
        self.buffer.write_i24::<BigEndian>(value)
    }

    /// Read u32 (big endian)
    pub fn read_u32_be(&mut self) -> IoResult<u32> {
        self.take(4)?.read_u32::<BigEndian>()
    }

    /// Write u32 (big endian)
    pub fn write_u32_be(&mut self, value: u32) -> IoResult<()> {
        self.buffer.write_u32::<BigEndian>(value)
    }

    /// Read u32 (little endian), the message stream id on the wire
    pub fn read_u32_le(&mut self) -> IoResult<u32> {
        self.take(4)?.read_u32::<LittleEndian>()
    }

    /// Write u32 (little endian)
    pub fn write_u32_le(&mut self, value: u32) -> IoResult<()> {
        self.buffer.write_u32::<LittleEndian>(value)
    }

    /// Read f64 (big endian)
    pub fn read_f64_be(&mut self) -> IoResult<f64> {
        self.take(8)?.read_f64::<BigEndian>()
    }

    /// Write f64 (big endian)
    pub fn write_f64_be(&mut self, value: f64) -> IoResult<()> {
        self.buffer.write_f64::<BigEndian>(value)
    }

    /// Slice of the bytes not yet read
    pub fn remaining_slice(&self) -> &[u8] {
        &self.buffer[self.cursor.min(self.buffer.len())..]
    }

    /// Get slice of underlying buffer
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Consume the buffer, returning every byte written
    pub fn into_vec(self) -> Vec<u8> {
        self.buffer
    }

    /// Clear buffer and reset cursor
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
    }

    /// Get length of buffer
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
