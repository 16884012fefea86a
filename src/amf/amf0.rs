use chrono::{DateTime, Utc};
use indexmap::IndexMap;

/// Ordered AMF0 property map. Encoding walks keys in insertion order,
/// decoding a duplicate key keeps the last value.
pub type Amf0Object = IndexMap<String, Amf0Value>;

/// AMF0 data types
#[derive(Debug, Clone, PartialEq)]
pub enum Amf0Value {
    Number(f64),                                    // 0x00
    Boolean(bool),                                  // 0x01
    String(String),                                 // 0x02
    Object(Amf0Object),                             // 0x03
    Null,                                           // 0x05
    Undefined,                                      // 0x06
    EcmaArray(Amf0Object),                          // 0x08
    StrictArray(Vec<Amf0Value>),                    // 0x0A
    Date { millis: f64, timezone: i16 },            // 0x0B
    LongString(String),                             // 0x0C
}

// AMF0 type markers
pub mod markers {
    pub const NUMBER: u8 = 0x00;
    pub const BOOLEAN: u8 = 0x01;
    pub const STRING: u8 = 0x02;
    pub const OBJECT: u8 = 0x03;
    pub const NULL: u8 = 0x05;
    pub const UNDEFINED: u8 = 0x06;
    pub const ECMA_ARRAY: u8 = 0x08;
    pub const OBJECT_END: u8 = 0x09;
    pub const STRICT_ARRAY: u8 = 0x0A;
    pub const DATE: u8 = 0x0B;
    pub const LONG_STRING: u8 = 0x0C;
}

/// Empty key followed by the object-end marker
pub const OBJECT_END_SEQUENCE: [u8; 3] = [0x00, 0x00, markers::OBJECT_END];

/// Longest string that fits the short String form
pub const MAX_SHORT_STRING: usize = u16::MAX as usize;

impl Amf0Value {
    /// Build a string value, choosing LongString when the UTF-8 form
    /// exceeds 65535 bytes
    pub fn string(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.len() > MAX_SHORT_STRING {
            Amf0Value::LongString(value)
        } else {
            Amf0Value::String(value)
        }
    }

    /// Build a Date from a UTC instant
    pub fn date(at: DateTime<Utc>) -> Self {
        Amf0Value::Date {
            millis: at.timestamp_millis() as f64,
            timezone: 0,
        }
    }

    /// Type marker written in front of this value
    pub fn marker(&self) -> u8 {
        match self {
            Amf0Value::Number(_) => markers::NUMBER,
            Amf0Value::Boolean(_) => markers::BOOLEAN,
            Amf0Value::String(_) => markers::STRING,
            Amf0Value::Object(_) => markers::OBJECT,
            Amf0Value::Null => markers::NULL,
            Amf0Value::Undefined => markers::UNDEFINED,
            Amf0Value::EcmaArray(_) => markers::ECMA_ARRAY,
            Amf0Value::StrictArray(_) => markers::STRICT_ARRAY,
            Amf0Value::Date { .. } => markers::DATE,
            Amf0Value::LongString(_) => markers::LONG_STRING,
        }
    }

    /// Extract number value
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Amf0Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Extract string reference
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Amf0Value::String(s) | Amf0Value::LongString(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Extract boolean value
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Amf0Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract properties of an Object or ECMA array
    pub fn as_object(&self) -> Option<&Amf0Object> {
        match self {
            Amf0Value::Object(obj) | Amf0Value::EcmaArray(obj) => Some(obj),
            _ => None,
        }
    }

    /// Extract strict array elements
    pub fn as_array(&self) -> Option<&[Amf0Value]> {
        match self {
            Amf0Value::StrictArray(arr) => Some(arr),
            _ => None,
        }
    }

    /// Interpret a Date value as a UTC instant
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Amf0Value::Date { millis, .. } => DateTime::from_timestamp_millis(*millis as i64),
            _ => None,
        }
    }

    /// Get property from object
    pub fn get_property(&self, key: &str) -> Option<&Amf0Value> {
        self.as_object().and_then(|obj| obj.get(key))
    }

    /// Get a string property from object
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.get_property(key).and_then(Amf0Value::as_string)
    }

    /// Check if null or undefined
    pub fn is_null(&self) -> bool {
        matches!(self, Amf0Value::Null | Amf0Value::Undefined)
    }
}

impl From<f64> for Amf0Value {
    fn from(value: f64) -> Self {
        Amf0Value::Number(value)
    }
}

impl From<bool> for Amf0Value {
    fn from(value: bool) -> Self {
        Amf0Value::Boolean(value)
    }
}

impl From<&str> for Amf0Value {
    fn from(value: &str) -> Self {
        Amf0Value::string(value)
    }
}

impl From<String> for Amf0Value {
    fn from(value: String) -> Self {
        Amf0Value::string(value)
    }
}

impl From<Amf0Object> for Amf0Value {
    fn from(value: Amf0Object) -> Self {
        Amf0Value::Object(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_string_picks_long_form() {
        assert!(matches!(Amf0Value::string("live"), Amf0Value::String(_)));
        let long = "x".repeat(MAX_SHORT_STRING + 1);
        assert!(matches!(Amf0Value::string(long), Amf0Value::LongString(_)));
    }

    #[test]
    fn test_property_lookup() {
        let mut obj = Amf0Object::new();
        obj.insert("level".into(), "error".into());
        obj.insert("code".into(), "NetConnection.Connect.Rejected".into());
        let value = Amf0Value::Object(obj);

        assert_eq!(value.get_string("level"), Some("error"));
        assert!(value.get_property("description").is_none());
        assert_eq!(Amf0Value::Null.get_property("level"), None);
    }

    #[test]
    fn test_date_conversion() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let value = Amf0Value::date(at);
        assert_eq!(value.marker(), markers::DATE);
        assert_eq!(value.as_datetime(), Some(at));
    }
}
