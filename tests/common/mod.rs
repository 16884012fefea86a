// Common test utilities: an in-memory transport and a scripted RTMP server
#![allow(dead_code)]

use std::sync::Mutex;
use std::time::Duration;
use async_trait::async_trait;
use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt, DuplexStream};
use rtmp::{
    Amf0Value, BoxedChannel, ChunkType, ClientConfig, Connector, Error, ReceivedMessage, Result,
    RtmpCommand, RtmpConnection, RtmpMessage, RtmpUrl, CHUNK_STREAM_COMMAND, HANDSHAKE_SIZE,
};

/// How long any single step of a test may take
pub const STEP_TIMEOUT: Duration = Duration::from_secs(5);

/// Hands out one end of an in-memory pipe instead of dialing TCP
pub struct MockConnector {
    channel: Mutex<Option<DuplexStream>>,
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, _url: &RtmpUrl, _config: &ClientConfig) -> Result<BoxedChannel> {
        let channel = self
            .channel
            .lock()
            .map_err(|_| Error::transport("connector poisoned"))?
            .take()
            .ok_or_else(|| Error::transport("mock channel already used"))?;
        Ok(Box::new(channel))
    }
}

/// A connector and the server end of its channel
pub fn mock_transport() -> (MockConnector, DuplexStream) {
    let (client, server) = duplex(1 << 20);
    let connector = MockConnector {
        channel: Mutex::new(Some(client)),
    };
    (connector, server)
}

/// Test config with short timeouts
pub fn test_config() -> ClientConfig {
    ClientConfig::builder()
        .response_timeout(Duration::from_secs(2))
        .stop_timeout(Duration::from_secs(2))
        .build()
        .unwrap()
}

/// Server side of an RTMP connection that records everything it reads
pub struct MockServer {
    pub conn: RtmpConnection<DuplexStream>,
    pub received: Vec<ReceivedMessage>,
}

impl MockServer {
    /// Answer the simple handshake, echoing C1 as S2
    pub async fn accept(mut stream: DuplexStream) -> Self {
        let mut c0c1 = vec![0u8; 1 + HANDSHAKE_SIZE];
        stream.read_exact(&mut c0c1).await.unwrap();
        assert_eq!(c0c1[0], 3, "client must request RTMP version 3");

        let mut reply = vec![3u8];
        reply.extend(std::iter::repeat(0x5A).take(HANDSHAKE_SIZE));
        reply.extend_from_slice(&c0c1[1..]);
        stream.write_all(&reply).await.unwrap();

        let mut c2 = vec![0u8; HANDSHAKE_SIZE];
        stream.read_exact(&mut c2).await.unwrap();
        assert!(c2.iter().all(|&b| b == 0x5A), "C2 must echo S1");

        MockServer {
            conn: RtmpConnection::new(stream),
            received: Vec::new(),
        }
    }

    pub async fn recv(&mut self) -> ReceivedMessage {
        let received = tokio::time::timeout(STEP_TIMEOUT, self.conn.recv())
            .await
            .expect("timed out waiting for client")
            .unwrap();
        self.received.push(received.clone());
        received
    }

    /// Read until a command named `name`, returning it
    pub async fn expect_command(&mut self, name: &str) -> RtmpCommand {
        loop {
            if let RtmpMessage::Command(command) = self.recv().await.message {
                if command.name == name {
                    return command;
                }
            }
        }
    }

    /// Read until a message matching `predicate`
    pub async fn expect<F>(&mut self, predicate: F) -> ReceivedMessage
    where
        F: Fn(&RtmpMessage) -> bool,
    {
        loop {
            let received = self.recv().await;
            if predicate(&received.message) {
                return received;
            }
        }
    }

    pub async fn reply(&mut self, command: RtmpCommand) {
        self.conn
            .send(&RtmpMessage::Command(command), CHUNK_STREAM_COMMAND, ChunkType::Type0, 0, 0)
            .await
            .unwrap();
    }

    /// Accept connect and createStream, handing out `stream_id`, and read
    /// up to the metadata that follows `publish`
    pub async fn accept_publish(&mut self, stream_id: u32) {
        self.expect_command("connect").await;
        self.reply(RtmpCommand::result(
            1.0,
            Amf0Value::Null,
            Amf0Value::string("NetConnection.Connect.Success"),
        ))
        .await;

        self.expect_command("createStream").await;
        self.reply(RtmpCommand::result(4.0, Amf0Value::Null, Amf0Value::Number(stream_id as f64)))
            .await;

        self.expect_command("publish").await;
        self.expect(|message| matches!(message, RtmpMessage::Data(_))).await;
    }

    /// Names of the commands and data messages read so far, with control
    /// messages shown by type
    pub fn transcript(&self) -> Vec<String> {
        self.received
            .iter()
            .map(|received| match &received.message {
                RtmpMessage::Command(command) => command.name.clone(),
                RtmpMessage::Data(data) => data.data_type.clone(),
                other => format!("{:?}", other.message_type()),
            })
            .collect()
    }
}
