use std::time::Duration;
use log::{debug, info, trace};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::timeout;
use crate::chunk::ChunkType;
use crate::connection::RtmpConnection;
use crate::message::RtmpMessage;
use crate::protocol::constants::*;
use crate::protocol::{ConnectParams, RtmpCommand};
use crate::{Error, Result};

/// Runs the command exchange that precedes publishing:
/// `connect`, then `releaseStream`/`FCPublish`/`createStream`.
pub struct CommandSequencer {
    response_timeout: Duration,

    /// Log line prefix
    tag: String,
}

impl CommandSequencer {
    pub fn new(response_timeout: Duration, tag: impl Into<String>) -> Self {
        CommandSequencer {
            response_timeout,
            tag: tag.into(),
        }
    }

    /// Send `connect`, announce `chunk_size` and `window_ack_size`, and
    /// wait for the server to accept.
    pub async fn connect<S: AsyncRead + AsyncWrite>(
        &self,
        conn: &mut RtmpConnection<S>,
        params: &ConnectParams,
        chunk_size: u32,
        window_ack_size: u32,
    ) -> Result<()> {
        info!("[{}] Connecting to app '{}' ({})", self.tag, params.app, params.tc_url);
        conn.send(
            &RtmpMessage::Command(RtmpCommand::connect(params)),
            CHUNK_STREAM_COMMAND,
            ChunkType::Type0,
            0,
            0,
        )
        .await?;
        conn.send_control(&RtmpMessage::SetChunkSize(chunk_size)).await?;

        let reply = self.expect_command_message(conn, TRANSACTION_CONNECT).await?;
        if reply.is_error() {
            return Err(Error::command_rejected(format!("connect: {}", reply.describe())));
        }
        info!("[{}] Connected: {}", self.tag, reply.describe());

        conn.send_control(&RtmpMessage::WindowAckSize(window_ack_size)).await
    }

    /// Release any stale publisher of `stream_name` and create a stream,
    /// returning its message stream id.
    pub async fn create_stream<S: AsyncRead + AsyncWrite>(
        &self,
        conn: &mut RtmpConnection<S>,
        stream_name: &str,
    ) -> Result<u32> {
        for command in [
            RtmpCommand::release_stream(stream_name),
            RtmpCommand::fc_publish(stream_name),
            RtmpCommand::create_stream(),
        ] {
            conn.send(&RtmpMessage::Command(command), CHUNK_STREAM_COMMAND, ChunkType::Type1, 0, 0)
                .await?;
        }

        let reply = self.expect_command_message(conn, TRANSACTION_CREATE_STREAM).await?;
        if reply.is_error() {
            return Err(Error::command_rejected(format!("createStream: {}", reply.describe())));
        }

        let stream_id = reply
            .arguments
            .first()
            .and_then(|value| value.as_number())
            .filter(|id| id.fract() == 0.0 && *id >= 0.0 && *id <= u32::MAX as f64)
            .ok_or_else(|| Error::protocol("createStream result carries no stream id"))?;
        info!("[{}] Created stream {}", self.tag, stream_id);
        Ok(stream_id as u32)
    }

    /// Read until a `_result` or `_error` for `transaction_id` arrives.
    ///
    /// Other replies and non-command messages are discarded; control
    /// messages still take effect on the connection.
    pub async fn expect_command_message<S: AsyncRead + AsyncWrite>(
        &self,
        conn: &mut RtmpConnection<S>,
        transaction_id: f64,
    ) -> Result<RtmpCommand> {
        let wait = async {
            loop {
                let received = conn.recv().await?;
                match received.message {
                    RtmpMessage::Command(command)
                        if (command.is_result() || command.is_error())
                            && command.transaction_id == transaction_id =>
                    {
                        return Ok::<_, Error>(command);
                    }
                    RtmpMessage::Command(command) => {
                        debug!(
                            "[{}] Discarding {} while waiting for transaction {}",
                            self.tag,
                            command.describe(),
                            transaction_id
                        );
                    }
                    other => {
                        trace!("[{}] Skipping {:?} while waiting for a reply", self.tag, other.message_type());
                    }
                }
            }
        };

        timeout(self.response_timeout, wait).await.map_err(|_| {
            Error::timeout(format!("No reply to transaction {} within {:?}", transaction_id, self.response_timeout))
        })?
    }
}
