mod config;
mod sequencer;
mod session;
mod state;
mod transport;
mod endpoint;

pub use config::{ClientConfig, ClientConfigBuilder};
pub use sequencer::CommandSequencer;
pub use session::PublishSession;
pub use state::PublishState;
pub use transport::{BoxedChannel, Channel, Connector, TcpConnector};
pub use endpoint::RtmpUrl;
