use crate::{Error, Result};

/// Client side of the simple handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandshakeState {
    #[default]
    Idle,

    /// C0+C1 written, waiting for S0+S1+S2
    C0C1Sent,

    /// S0+S1+S2 read, C2 not yet written
    S0S1S2Received,

    C2Sent,

    Done,

    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeEvent {
    SentC0C1,
    ReceivedS0S1S2,
    SentC2,
    Completed,
}

impl HandshakeState {
    pub fn new() -> Self {
        HandshakeState::Idle
    }

    pub fn is_done(&self) -> bool {
        *self == HandshakeState::Done
    }

    pub fn is_failed(&self) -> bool {
        *self == HandshakeState::Failed
    }

    /// Advance on `event`; anything out of order is a handshake error
    pub fn transition(&mut self, event: HandshakeEvent) -> Result<()> {
        let next = match (*self, event) {
            (HandshakeState::Idle, HandshakeEvent::SentC0C1) => HandshakeState::C0C1Sent,
            (HandshakeState::C0C1Sent, HandshakeEvent::ReceivedS0S1S2) => HandshakeState::S0S1S2Received,
            (HandshakeState::S0S1S2Received, HandshakeEvent::SentC2) => HandshakeState::C2Sent,
            (HandshakeState::C2Sent, HandshakeEvent::Completed) => HandshakeState::Done,
            _ => {
                return Err(Error::handshake(format!(
                    "Invalid transition from {:?} with event {:?}",
                    self, event
                )));
            }
        };
        *self = next;
        Ok(())
    }
}

/// Handshake flavour requested by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandshakeMode {
    /// Random C1, echoed S1
    #[default]
    Simple,

    /// Digest-based handshake; not supported
    Complex,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_sequence() {
        let mut state = HandshakeState::new();
        for event in [
            HandshakeEvent::SentC0C1,
            HandshakeEvent::ReceivedS0S1S2,
            HandshakeEvent::SentC2,
            HandshakeEvent::Completed,
        ] {
            state.transition(event).unwrap();
        }
        assert!(state.is_done());
    }

    #[test]
    fn test_out_of_order_rejected() {
        let mut state = HandshakeState::new();
        assert!(state.transition(HandshakeEvent::SentC2).is_err());
        assert_eq!(state, HandshakeState::Idle);
        assert!(!state.is_failed());
    }
}
