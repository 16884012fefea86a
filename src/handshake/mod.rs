mod c0c1;
mod s0s1s2;
mod state;

pub use c0c1::*;
pub use s0s1s2::*;
pub use state::*;

use log::{debug, warn};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use crate::{Error, Result};

/// Drives the client side of the handshake over a byte channel.
pub struct ClientHandshake {
    mode: HandshakeMode,
    state: HandshakeState,
}

impl ClientHandshake {
    pub fn new(mode: HandshakeMode) -> Self {
        ClientHandshake {
            mode,
            state: HandshakeState::new(),
        }
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Send C0+C1, read S0+S1+S2 in one exact read, answer with C2.
    ///
    /// Returns the server's reply. Any S0 version is accepted.
    pub async fn perform<S>(&mut self, stream: &mut S) -> Result<S0S1S2>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        if self.mode == HandshakeMode::Complex {
            self.state = HandshakeState::Failed;
            return Err(Error::not_implemented("Complex handshake"));
        }

        match self.exchange(stream).await {
            Ok(reply) => Ok(reply),
            Err(e) => {
                self.state = HandshakeState::Failed;
                Err(e)
            }
        }
    }

    async fn exchange<S>(&mut self, stream: &mut S) -> Result<S0S1S2>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let c0c1 = C0C1::create_client();
        stream.write_all(&c0c1.encode()?).await
            .map_err(|e| Error::transport(format!("Failed to send C0+C1: {}", e)))?;
        stream.flush().await
            .map_err(|e| Error::transport(format!("Failed to flush C0+C1: {}", e)))?;
        self.state.transition(HandshakeEvent::SentC0C1)?;

        let mut reply = vec![0u8; S0S1S2_SIZE];
        stream.read_exact(&mut reply).await
            .map_err(|e| Error::transport(format!("Failed to read S0+S1+S2: {}", e)))?;
        let s0s1s2 = S0S1S2::parse(&reply)?;
        self.state.transition(HandshakeEvent::ReceivedS0S1S2)?;

        if s0s1s2.version() != RTMP_VERSION {
            warn!("Server answered with RTMP version {}, continuing", s0s1s2.version());
        }
        debug!("Server handshake timestamp {}", s0s1s2.server_timestamp());

        let c2 = C2::create_from_s1(&s0s1s2);
        stream.write_all(c2.encode()).await
            .map_err(|e| Error::transport(format!("Failed to send C2: {}", e)))?;
        stream.flush().await
            .map_err(|e| Error::transport(format!("Failed to flush C2: {}", e)))?;
        self.state.transition(HandshakeEvent::SentC2)?;
        self.state.transition(HandshakeEvent::Completed)?;

        Ok(s0s1s2)
    }
}
