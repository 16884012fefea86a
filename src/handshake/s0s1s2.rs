use crate::handshake::c0c1::HANDSHAKE_SIZE;
use crate::{Error, Result};

/// Size of S0 + S1 + S2
pub const S0S1S2_SIZE: usize = 1 + 2 * HANDSHAKE_SIZE;

/// Server reply (S0 + S1 + S2), kept as received
#[derive(Debug, Clone)]
pub struct S0S1S2 {
    bytes: Vec<u8>,
}

impl S0S1S2 {
    /// Take exactly 3073 bytes
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() != S0S1S2_SIZE {
            return Err(Error::handshake(format!(
                "S0+S1+S2 is {} bytes, expected {}",
                data.len(),
                S0S1S2_SIZE
            )));
        }
        Ok(S0S1S2 { bytes: data.to_vec() })
    }

    /// Version byte (S0)
    pub fn version(&self) -> u8 {
        self.bytes[0]
    }

    /// S1 as sent by the server
    pub fn s1(&self) -> &[u8] {
        &self.bytes[1..1 + HANDSHAKE_SIZE]
    }

    /// S2 as sent by the server
    pub fn s2(&self) -> &[u8] {
        &self.bytes[1 + HANDSHAKE_SIZE..]
    }

    /// Server time from the first four bytes of S1
    pub fn server_timestamp(&self) -> u32 {
        let s1 = self.s1();
        u32::from_be_bytes([s1[0], s1[1], s1[2], s1[3]])
    }
}

/// Client acknowledgement: an exact echo of S1
#[derive(Debug, Clone, PartialEq)]
pub struct C2 {
    pub data: Vec<u8>,
}

impl C2 {
    pub fn create_from_s1(s0s1s2: &S0S1S2) -> Self {
        C2 {
            data: s0s1s2.s1().to_vec(),
        }
    }

    pub fn encode(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_c2_echoes_s1() {
        let reply: Vec<u8> = (0..S0S1S2_SIZE).map(|i| (i * 7 % 256) as u8).collect();
        let s0s1s2 = S0S1S2::parse(&reply).unwrap();
        let c2 = C2::create_from_s1(&s0s1s2);

        assert_eq!(c2.encode(), &reply[1..1537]);
        assert_eq!(c2.encode().len(), 1536);
        assert_eq!(s0s1s2.s2().len(), 1536);
    }

    #[test]
    fn test_size_checked() {
        assert!(S0S1S2::parse(&[3; 3072]).is_err());
        assert!(S0S1S2::parse(&[3; 3074]).is_err());
    }
}
