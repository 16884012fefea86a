#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PublishState {
    /// Not started
    #[default]
    Idle,

    /// Transport, handshake, connect and createStream in progress
    Connecting,

    /// Stream created; publish and metadata being sent
    AwaitingStreamReady,

    /// Accepting media
    Publishing,

    /// Torn down by `stop` or by the caller dropping the session
    Stopped,

    /// Ended by an error
    Failed,
}

impl PublishState {
    /// Whether a worker may still be running
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            PublishState::Connecting | PublishState::AwaitingStreamReady | PublishState::Publishing
        )
    }

    /// Check if can publish media
    pub fn can_publish(&self) -> bool {
        *self == PublishState::Publishing
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PublishState::Stopped | PublishState::Failed)
    }
}
