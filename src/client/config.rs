use std::time::Duration;
use crate::handshake::HandshakeMode;
use crate::protocol::constants::{DEFAULT_PUBLISH_CHUNK_SIZE, DEFAULT_WINDOW_SIZE};
use crate::protocol::DEFAULT_FLASH_VER;
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// TCP (and TLS) connection timeout
    pub connect_timeout: Duration,

    /// Handshake and command reply timeout
    pub response_timeout: Duration,

    /// Upper bound on `stop`
    pub stop_timeout: Duration,

    /// Outbound chunk size announced after connect
    pub chunk_size: u32,

    /// Window acknowledgement size announced to the server
    pub window_ack_size: u32,

    pub handshake: HandshakeMode,

    /// `flashVer` sent with connect
    pub flash_ver: String,

    /// Publish type: "live", "record" or "append"
    pub publish_type: String,

    /// Media samples buffered between callers and the session worker
    pub sample_queue_capacity: usize,

    pub tcp_nodelay: bool,

    /// Keep reading server messages while publishing
    pub drain_server_messages: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            connect_timeout: Duration::from_secs(10),
            response_timeout: Duration::from_secs(10),
            stop_timeout: Duration::from_secs(3),
            chunk_size: DEFAULT_PUBLISH_CHUNK_SIZE,
            window_ack_size: DEFAULT_WINDOW_SIZE,
            handshake: HandshakeMode::Simple,
            flash_ver: DEFAULT_FLASH_VER.to_string(),
            publish_type: "live".to_string(),
            sample_queue_capacity: 256,
            tcp_nodelay: true,
            drain_server_messages: true,
        }
    }
}

impl ClientConfig {
    /// Create config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size < 128 {
            return Err(Error::config("Chunk size must be at least 128"));
        }

        if self.chunk_size > 65536 {
            return Err(Error::config("Chunk size must not exceed 65536"));
        }

        if self.window_ack_size == 0 {
            return Err(Error::config("Window acknowledgement size must be positive"));
        }

        if !matches!(self.publish_type.as_str(), "live" | "record" | "append") {
            return Err(Error::config(format!("Unknown publish type '{}'", self.publish_type)));
        }

        if self.sample_queue_capacity == 0 {
            return Err(Error::config("Sample queue capacity must be positive"));
        }

        if self.response_timeout.is_zero() || self.connect_timeout.is_zero() {
            return Err(Error::config("Timeouts must be positive"));
        }

        Ok(())
    }
}

/// Builder for ClientConfig
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Create new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set connect timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn response_timeout(mut self, timeout: Duration) -> Self {
        self.config.response_timeout = timeout;
        self
    }

    pub fn stop_timeout(mut self, timeout: Duration) -> Self {
        self.config.stop_timeout = timeout;
        self
    }

    /// Set chunk size
    pub fn chunk_size(mut self, size: u32) -> Self {
        self.config.chunk_size = size;
        self
    }

    pub fn window_ack_size(mut self, size: u32) -> Self {
        self.config.window_ack_size = size;
        self
    }

    pub fn handshake(mut self, mode: HandshakeMode) -> Self {
        self.config.handshake = mode;
        self
    }

    pub fn flash_ver(mut self, flash_ver: impl Into<String>) -> Self {
        self.config.flash_ver = flash_ver.into();
        self
    }

    pub fn publish_type(mut self, publish_type: impl Into<String>) -> Self {
        self.config.publish_type = publish_type.into();
        self
    }

    pub fn sample_queue_capacity(mut self, capacity: usize) -> Self {
        self.config.sample_queue_capacity = capacity;
        self
    }

    pub fn tcp_nodelay(mut self, enabled: bool) -> Self {
        self.config.tcp_nodelay = enabled;
        self
    }

    pub fn drain_server_messages(mut self, enabled: bool) -> Self {
        self.config.drain_server_messages = enabled;
        self
    }

    /// Build configuration
    pub fn build(self) -> Result<ClientConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
