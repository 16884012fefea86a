use std::sync::Arc;
use log::{debug, error, info, warn};
use tokio::io::{ReadHalf, WriteHalf};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use uuid::Uuid;
use crate::client::config::ClientConfig;
use crate::client::sequencer::CommandSequencer;
use crate::client::state::PublishState;
use crate::client::transport::{BoxedChannel, Connector, TcpConnector};
use crate::client::endpoint::RtmpUrl;
use crate::connection::{MessageReader, MessageWriter, RtmpConnection};
use crate::handshake::ClientHandshake;
use crate::message::RtmpMessage;
use crate::processing::{AudioFrame, FlvMuxer, StreamMetadata, VideoFrame};
use crate::protocol::{ConnectParams, COMMAND_ON_STATUS};
use crate::stream::PublishStream;
use crate::{Error, Result};

/// Work handed from callers to the session worker
#[derive(Debug)]
enum SessionCommand {
    Video { payload: Vec<u8>, timestamp: u32 },
    Audio { payload: Vec<u8>, timestamp: u32 },
    VideoFrame(VideoFrame),
    AudioFrame(AudioFrame),
    Metadata(StreamMetadata),
}

/// Publishes one stream to an RTMP server.
///
/// `connect` starts a worker task that owns the channel: it runs the
/// handshake and command exchange, sends `publish` and the metadata, then
/// writes media handed over through a bounded queue. All writes go through
/// that task.
pub struct PublishSession {
    id: Uuid,
    config: Arc<ClientConfig>,
    connector: Arc<dyn Connector>,

    /// Merged metadata, sent when publishing starts
    metadata: StreamMetadata,

    state_tx: Arc<watch::Sender<PublishState>>,
    state_rx: watch::Receiver<PublishState>,

    commands: Option<mpsc::Sender<SessionCommand>>,
    shutdown: Option<watch::Sender<bool>>,
    worker: Option<JoinHandle<Result<()>>>,
}

impl PublishSession {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_connector(config, Arc::new(TcpConnector))
    }

    /// Use a custom transport, such as an in-memory channel
    pub fn with_connector(config: ClientConfig, connector: Arc<dyn Connector>) -> Self {
        let (state_tx, state_rx) = watch::channel(PublishState::Idle);
        PublishSession {
            id: Uuid::new_v4(),
            config: Arc::new(config),
            connector,
            metadata: StreamMetadata::default(),
            state_tx: Arc::new(state_tx),
            state_rx,
            commands: None,
            shutdown: None,
            worker: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> PublishState {
        *self.state_rx.borrow()
    }

    /// Watch state transitions
    pub fn subscribe(&self) -> watch::Receiver<PublishState> {
        self.state_rx.clone()
    }

    /// Start connecting to `url` in the background.
    ///
    /// Returns once the worker is running; use [`wait_ready`] to learn when
    /// media can flow.
    ///
    /// [`wait_ready`]: PublishSession::wait_ready
    pub async fn connect(&mut self, url: &str) -> Result<()> {
        if self.state().is_active() {
            return Err(Error::invalid_state(format!("Session is already {:?}", self.state())));
        }
        self.config.validate()?;
        let url = RtmpUrl::parse(url)?;
        info!("[{}] Publishing to {}", self.id, url);

        let (command_tx, command_rx) = mpsc::channel(self.config.sample_queue_capacity);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        self.state_tx.send_replace(PublishState::Connecting);

        let worker = Worker {
            tag: self.id.to_string(),
            url,
            config: self.config.clone(),
            connector: self.connector.clone(),
            metadata: self.metadata.clone(),
            state: self.state_tx.clone(),
            commands: command_rx,
            shutdown: shutdown_rx,
        };
        self.worker = Some(tokio::spawn(worker.run()));
        self.commands = Some(command_tx);
        self.shutdown = Some(shutdown_tx);
        Ok(())
    }

    /// Wait until the session is publishing.
    ///
    /// Fails with the worker's error if setup failed.
    pub async fn wait_ready(&mut self) -> Result<()> {
        let mut state_rx = self.state_rx.clone();
        let state = *state_rx
            .wait_for(|state| state.can_publish() || state.is_terminal() || *state == PublishState::Idle)
            .await
            .map_err(|_| Error::invalid_state("Session state channel closed"))?;

        match state {
            PublishState::Publishing => Ok(()),
            PublishState::Failed => match self.worker.take() {
                Some(handle) => match handle.await {
                    Ok(Err(e)) => Err(e),
                    Ok(Ok(())) => Err(Error::invalid_state("Session failed")),
                    Err(e) => Err(Error::invalid_state(format!("Session worker panicked: {}", e))),
                },
                None => Err(Error::invalid_state("Session failed")),
            },
            other => Err(Error::invalid_state(format!("Session is {:?}", other))),
        }
    }

    /// Merge `metadata` into what is sent as `onMetaData`. Once publishing,
    /// the merged set is sent again.
    pub async fn set_metadata(&mut self, metadata: StreamMetadata) -> Result<()> {
        self.metadata.merge(&metadata);
        if self.commands.is_some() {
            self.submit(SessionCommand::Metadata(self.metadata.clone())).await?;
        }
        Ok(())
    }

    /// Queue an FLV video tag body; `timestamp` is the delta in
    /// milliseconds from the previous video message
    pub async fn publish_video(&self, payload: Vec<u8>, timestamp: u32) -> Result<()> {
        self.submit(SessionCommand::Video { payload, timestamp }).await
    }

    /// Queue an FLV audio tag body; `timestamp` is the delta in
    /// milliseconds from the previous audio message
    pub async fn publish_audio(&self, payload: Vec<u8>, timestamp: u32) -> Result<()> {
        self.submit(SessionCommand::Audio { payload, timestamp }).await
    }

    /// Queue an H.264 access unit for muxing
    pub async fn send_video_frame(&self, frame: VideoFrame) -> Result<()> {
        self.submit(SessionCommand::VideoFrame(frame)).await
    }

    /// Queue an AAC access unit for muxing
    pub async fn send_audio_frame(&self, frame: AudioFrame) -> Result<()> {
        self.submit(SessionCommand::AudioFrame(frame)).await
    }

    async fn submit(&self, command: SessionCommand) -> Result<()> {
        let sender = self
            .commands
            .as_ref()
            .ok_or_else(|| Error::invalid_state("Session is not connected"))?;
        sender
            .send(command)
            .await
            .map_err(|_| Error::invalid_state(format!("Session is {:?}", self.state())))
    }

    /// Unpublish and close. Safe in any state; gives up on a clean
    /// teardown after the configured stop timeout.
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(true);
        }
        self.commands = None;

        let Some(mut handle) = self.worker.take() else {
            if !self.state().is_terminal() {
                self.state_tx.send_replace(PublishState::Stopped);
            }
            return Ok(());
        };

        match timeout(self.config.stop_timeout, &mut handle).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(e))) => debug!("[{}] Worker ended with: {}", self.id, e),
            Ok(Err(e)) => warn!("[{}] Worker did not finish cleanly: {}", self.id, e),
            Err(_) => {
                warn!("[{}] Teardown took longer than {:?}, aborting", self.id, self.config.stop_timeout);
                handle.abort();
            }
        }

        if self.state() != PublishState::Failed {
            self.state_tx.send_replace(PublishState::Stopped);
        }
        info!("[{}] Stopped", self.id);
        Ok(())
    }
}

impl Drop for PublishSession {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(true);
        }
    }
}

type ChannelReader = MessageReader<ReadHalf<BoxedChannel>>;
type ChannelWriter = MessageWriter<WriteHalf<BoxedChannel>>;

/// Owns the channel for the lifetime of one `connect`
struct Worker {
    tag: String,
    url: RtmpUrl,
    config: Arc<ClientConfig>,
    connector: Arc<dyn Connector>,
    metadata: StreamMetadata,
    state: Arc<watch::Sender<PublishState>>,
    commands: mpsc::Receiver<SessionCommand>,
    shutdown: watch::Receiver<bool>,
}

impl Worker {
    async fn run(mut self) -> Result<()> {
        let result = self.publish().await;
        match &result {
            Ok(()) => {
                self.set_state(PublishState::Stopped);
            }
            Err(e) => {
                error!("[{}] Session failed: {}", self.tag, e);
                self.set_state(PublishState::Failed);
            }
        }
        result
    }

    fn set_state(&self, state: PublishState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            info!("[{}] {:?} -> {:?}", self.tag, previous, state);
        }
    }

    async fn publish(&mut self) -> Result<()> {
        let mut shutdown = self.shutdown.clone();
        let setup = tokio::select! {
            result = self.setup() => result?,
            _ = stop_requested(&mut shutdown) => {
                info!("[{}] Stopped before publishing started", self.tag);
                return Ok(());
            }
        };
        let (reader, mut writer, mut stream) = setup;

        self.set_state(PublishState::AwaitingStreamReady);
        stream.publish(&mut writer).await?;
        stream.set_metadata(&mut writer, self.metadata.to_amf()).await?;
        self.set_state(PublishState::Publishing);

        let (reply_tx, mut reply_rx) = mpsc::unbounded_channel();
        let drain = self
            .config
            .drain_server_messages
            .then(|| tokio::spawn(drain_server_messages(self.tag.clone(), reader, reply_tx)));

        let result = self.stream_media(&mut writer, &mut stream, &mut reply_rx).await;

        if result.is_ok() {
            self.teardown(&mut writer, &stream).await;
        }
        if let Some(drain) = drain {
            drain.abort();
        }
        result
    }

    /// Transport, handshake, connect and createStream
    async fn setup(&self) -> Result<(ChannelReader, ChannelWriter, PublishStream)> {
        let mut channel = self.connector.connect(&self.url, &self.config).await?;

        let mut handshake = ClientHandshake::new(self.config.handshake);
        timeout(self.config.response_timeout, handshake.perform(&mut channel))
            .await
            .map_err(|_| Error::timeout("Handshake"))??;
        debug!("[{}] Handshake complete", self.tag);

        let mut conn = RtmpConnection::new(channel);
        let sequencer = CommandSequencer::new(self.config.response_timeout, self.tag.as_str());
        let params = ConnectParams {
            app: self.url.app.clone(),
            tc_url: self.url.tc_url(),
            flash_ver: self.config.flash_ver.clone(),
        };
        sequencer
            .connect(&mut conn, &params, self.config.chunk_size, self.config.window_ack_size)
            .await?;
        let stream_id = sequencer.create_stream(&mut conn, &self.url.stream).await?;

        let (reader, writer) = conn.into_split();
        let stream = PublishStream::new(stream_id, self.url.stream.as_str(), self.config.publish_type.as_str());
        Ok((reader, writer, stream))
    }

    /// Write queued media until shutdown or a fatal error
    async fn stream_media(
        &mut self,
        writer: &mut ChannelWriter,
        stream: &mut PublishStream,
        replies: &mut mpsc::UnboundedReceiver<RtmpMessage>,
    ) -> Result<()> {
        let mut muxer = FlvMuxer::new();
        let mut replies_open = self.config.drain_server_messages;
        let mut shutdown = self.shutdown.clone();

        loop {
            tokio::select! {
                _ = stop_requested(&mut shutdown) => return Ok(()),
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        return Ok(());
                    };
                    match self.handle(command, writer, stream, &mut muxer).await {
                        Ok(()) => {}
                        Err(e) if !e.is_fatal() => {
                            warn!("[{}] Dropping sample: {}", self.tag, e);
                        }
                        Err(e) => return Err(e),
                    }
                }
                reply = replies.recv(), if replies_open => match reply {
                    Some(reply) => writer.send_control(&reply).await?,
                    None => replies_open = false,
                },
            }
        }
    }

    async fn handle(
        &mut self,
        command: SessionCommand,
        writer: &mut ChannelWriter,
        stream: &mut PublishStream,
        muxer: &mut FlvMuxer,
    ) -> Result<()> {
        match command {
            SessionCommand::Video { payload, timestamp } => {
                stream.publish_video(writer, payload, timestamp).await
            }
            SessionCommand::Audio { payload, timestamp } => {
                stream.publish_audio(writer, payload, timestamp).await
            }
            SessionCommand::VideoFrame(frame) => {
                for tag in muxer.mux_video(&frame)? {
                    stream.publish_video(writer, tag.payload, tag.timestamp).await?;
                }
                Ok(())
            }
            SessionCommand::AudioFrame(frame) => {
                for tag in muxer.mux_audio(&frame)? {
                    stream.publish_audio(writer, tag.payload, tag.timestamp).await?;
                }
                Ok(())
            }
            SessionCommand::Metadata(metadata) => {
                self.metadata = metadata;
                stream.set_metadata(writer, self.metadata.to_amf()).await
            }
        }
    }

    /// Best effort: the channel may already be gone
    async fn teardown(&self, writer: &mut ChannelWriter, stream: &PublishStream) {
        if let Err(e) = stream.fc_unpublish(writer).await {
            warn!("[{}] FCUnpublish failed: {}", self.tag, e);
        }
        if let Err(e) = stream.delete_stream(writer).await {
            warn!("[{}] deleteStream failed: {}", self.tag, e);
        }
        if let Err(e) = writer.shutdown().await {
            debug!("[{}] Close failed: {}", self.tag, e);
        }
    }
}

/// Resolves once stop is requested or the session handle is gone
async fn stop_requested(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

/// Keep reading while publishing so control messages take effect and
/// acknowledgements and ping responses go back through the worker
async fn drain_server_messages(
    tag: String,
    mut reader: ChannelReader,
    replies: mpsc::UnboundedSender<RtmpMessage>,
) {
    loop {
        let received = match reader.read_message().await {
            Ok(received) => received,
            Err(e) => {
                debug!("[{}] Stopped reading server messages: {}", tag, e);
                return;
            }
        };

        if let RtmpMessage::Command(command) = &received.message {
            if command.name == COMMAND_ON_STATUS && command.status_level() == Some("error") {
                error!("[{}] Server reported {}", tag, command.describe());
            } else {
                info!("[{}] Server: {}", tag, command.describe());
            }
        }

        for reply in reader.take_replies() {
            if replies.send(reply).is_err() {
                return;
            }
        }
    }
}
