use crate::utils::{current_timestamp, generate_random_bytes};
use crate::{ByteBuffer, Error, Result};

/// RTMP version
pub const RTMP_VERSION: u8 = 3;

/// Handshake packet size (C1/S1/C2/S2)
pub const HANDSHAKE_SIZE: usize = 1536;

/// Client opening (C0 + C1)
#[derive(Debug, Clone, PartialEq)]
pub struct C0C1 {
    /// RTMP version (C0)
    pub version: u8,

    /// Timestamp (C1)
    pub timestamp: u32,

    /// Must be zero in the simple handshake
    pub zero: u32,

    /// 1528 random bytes (C1)
    pub random_data: Vec<u8>,
}

impl C0C1 {
    /// Fresh C0+C1 with the current time and random filler
    pub fn create_client() -> Self {
        C0C1 {
            version: RTMP_VERSION,
            timestamp: current_timestamp(),
            zero: 0,
            random_data: generate_random_bytes(HANDSHAKE_SIZE - 8),
        }
    }

    /// Encode to the 1537 bytes sent as one write
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buffer = ByteBuffer::with_capacity(1 + HANDSHAKE_SIZE);
        buffer.write_u8(self.version)?;
        buffer.write_u32_be(self.timestamp)?;
        buffer.write_u32_be(self.zero)?;
        buffer.write_bytes(&self.random_data)?;

        if buffer.len() != 1 + HANDSHAKE_SIZE {
            return Err(Error::handshake(format!(
                "C1 random section is {} bytes, expected {}",
                self.random_data.len(),
                HANDSHAKE_SIZE - 8
            )));
        }
        Ok(buffer.into_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_c0c1_layout() {
        let c0c1 = C0C1::create_client();
        let bytes = c0c1.encode().unwrap();

        assert_eq!(bytes.len(), 1537);
        assert_eq!(bytes[0], 3);
        assert_eq!(&bytes[1..5], &c0c1.timestamp.to_be_bytes());
        assert_eq!(&bytes[5..9], &[0, 0, 0, 0]);
        assert_eq!(&bytes[9..], c0c1.random_data.as_slice());
    }

    #[test]
    fn test_wrong_random_length() {
        let c0c1 = C0C1 {
            version: RTMP_VERSION,
            timestamp: 0,
            zero: 0,
            random_data: vec![0; 10],
        };
        assert!(matches!(c0c1.encode(), Err(Error::Handshake(_))));
    }
}
