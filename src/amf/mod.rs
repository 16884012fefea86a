mod amf0;
mod decoder;
mod encoder;

pub use amf0::*;
pub use decoder::*;
pub use encoder::*;

use crate::{ByteBuffer, Result};

/// Encode a single value
pub fn encode_amf0(value: &Amf0Value) -> Result<Vec<u8>> {
    let mut encoder = Amf0Encoder::new();
    encoder.encode(value)?;
    Ok(encoder.into_bytes())
}

/// Decode the first value in `bytes`, returning it with the number of bytes
/// it occupied
pub fn decode_amf0(bytes: &[u8]) -> Result<(Amf0Value, usize)> {
    let mut buffer = ByteBuffer::new(bytes.to_vec());
    let mut decoder = Amf0Decoder::new(&mut buffer);
    let value = decoder.decode()?;
    Ok((value, decoder.position()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consumed_matches_encoded_length() {
        let mut props = Amf0Object::new();
        props.insert("app".into(), "live".into());
        let first = Amf0Value::Object(props);

        let mut bytes = encode_amf0(&first).unwrap();
        let first_len = bytes.len();
        bytes.extend(encode_amf0(&Amf0Value::Number(3.0)).unwrap());

        let (value, consumed) = decode_amf0(&bytes).unwrap();
        assert_eq!(value, first);
        assert_eq!(consumed, first_len);

        let (next, _) = decode_amf0(&bytes[consumed..]).unwrap();
        assert_eq!(next, Amf0Value::Number(3.0));
    }
}
