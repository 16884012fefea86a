use async_trait::async_trait;
use log::debug;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::time::timeout;
use crate::client::config::ClientConfig;
use crate::client::endpoint::RtmpUrl;
use crate::{Error, Result};

/// A connected byte channel a session can own
pub trait Channel: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send + 'static> Channel for T {}

pub type BoxedChannel = Box<dyn Channel>;

/// Opens byte channels to RTMP servers
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &RtmpUrl, config: &ClientConfig) -> Result<BoxedChannel>;
}

/// TCP, with TLS for `rtmps://`
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpConnector;

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self, url: &RtmpUrl, config: &ClientConfig) -> Result<BoxedChannel> {
        let addr = url.address();
        let stream = match timeout(config.connect_timeout, TcpStream::connect(&addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(Error::transport(format!("Failed to connect to {}: {}", addr, e))),
            Err(_) => return Err(Error::timeout(format!("Connecting to {}", addr))),
        };
        stream.set_nodelay(config.tcp_nodelay)?;
        debug!("TCP connected to {}", addr);

        if !url.tls {
            return Ok(Box::new(stream));
        }

        let connector = native_tls::TlsConnector::new()
            .map_err(|e| Error::transport(format!("TLS setup failed: {}", e)))?;
        let connector = tokio_native_tls::TlsConnector::from(connector);
        let tls = match timeout(config.connect_timeout, connector.connect(&url.host, stream)).await {
            Ok(Ok(tls)) => tls,
            Ok(Err(e)) => return Err(Error::transport(format!("TLS handshake with {} failed: {}", url.host, e))),
            Err(_) => return Err(Error::timeout(format!("TLS handshake with {}", url.host))),
        };
        debug!("TLS established with {}", url.host);
        Ok(Box::new(tls))
    }
}
