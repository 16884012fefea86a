use std::fmt;
use percent_encoding::percent_decode_str;
use url::Url;
use crate::protocol::constants::{DEFAULT_PORT, DEFAULT_TLS_PORT};
use crate::{Error, Result};

/// A parsed `rtmp://host[:port]/app/stream` publish URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtmpUrl {
    pub host: String,
    pub port: u16,
    pub app: String,
    /// Stream name, including any `?query` the server expects
    pub stream: String,
    pub tls: bool,
}

impl RtmpUrl {
    pub fn parse(input: &str) -> Result<Self> {
        let url = Url::parse(input)
            .map_err(|e| Error::config(format!("Invalid URL '{}': {}", input, e)))?;

        let (tls, default_port) = match url.scheme() {
            "rtmp" => (false, DEFAULT_PORT),
            "rtmps" => (true, DEFAULT_TLS_PORT),
            scheme => return Err(Error::config(format!("Unsupported scheme: {}", scheme))),
        };

        let host = url
            .host_str()
            .ok_or_else(|| Error::config("Missing host in URL"))?
            .to_string();
        let port = url.port().unwrap_or(default_port);

        let segments: Vec<&str> = url
            .path_segments()
            .map(|segments| segments.filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();
        let (app, stream) = match segments.as_slice() {
            [] | [_] => {
                return Err(Error::config(format!("URL '{}' needs both app and stream name", input)));
            }
            [app, .., stream] => (decode_segment(app)?, decode_segment(stream)?),
        };
        let stream = match url.query() {
            Some(query) => format!("{}?{}", stream, query),
            None => stream,
        };

        Ok(RtmpUrl {
            host,
            port,
            app,
            stream,
            tls,
        })
    }

    /// `tcUrl` property of the connect command
    pub fn tc_url(&self) -> String {
        let scheme = if self.tls { "rtmps" } else { "rtmp" };
        format!("{}://{}:{}/{}", scheme, self.host, self.port, self.app)
    }

    /// `host:port` for the transport
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Path segments arrive percent-encoded; the server wants the plain names
fn decode_segment(segment: &str) -> Result<String> {
    percent_decode_str(segment)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|e| Error::config(format!("Path segment '{}' is not UTF-8: {}", segment, e)))
}

impl fmt::Display for RtmpUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.tc_url(), self.stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_port() {
        let url = RtmpUrl::parse("rtmp://example.com/live/cam1").unwrap();
        assert_eq!(url.host, "example.com");
        assert_eq!(url.port, 1935);
        assert_eq!(url.app, "live");
        assert_eq!(url.stream, "cam1");
        assert!(!url.tls);
        assert_eq!(url.tc_url(), "rtmp://example.com:1935/live");
    }

    #[test]
    fn test_parse_explicit_port_and_query() {
        let url = RtmpUrl::parse("rtmp://10.0.0.2:1936/app/inner/key?token=abc").unwrap();
        assert_eq!(url.port, 1936);
        assert_eq!(url.app, "app");
        assert_eq!(url.stream, "key?token=abc");
        assert_eq!(url.address(), "10.0.0.2:1936");
    }

    #[test]
    fn test_segments_percent_decoded() {
        let url = RtmpUrl::parse("rtmp://example.com/my%20app/my%20key?sig=a%2Bb").unwrap();
        assert_eq!(url.app, "my app");
        assert_eq!(url.stream, "my key?sig=a%2Bb");
        assert!(RtmpUrl::parse("rtmp://example.com/live/%FF").is_err());
    }

    #[test]
    fn test_rtmps_default_port() {
        let url = RtmpUrl::parse("rtmps://ingest.example.com/live/abc").unwrap();
        assert!(url.tls);
        assert_eq!(url.port, 443);
        assert_eq!(url.to_string(), "rtmps://ingest.example.com:443/live/abc");
    }

    #[test]
    fn test_rejects_bad_urls() {
        assert!(RtmpUrl::parse("http://example.com/live/x").is_err());
        assert!(RtmpUrl::parse("rtmp://example.com/live").is_err());
        assert!(matches!(RtmpUrl::parse("not a url"), Err(Error::Configuration(_))));
    }
}
