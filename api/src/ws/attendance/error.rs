use util::identity::Role;

use super::events::ServerEvent;
use super::finalize::FinalizeError;
use super::session::SessionError;

/// Everything that turns an inbound frame into an `ERROR` reply. None of
/// these close the connection.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Invalid message format")]
    MalformedInput,
    #[error("Forbidden, {required} event only")]
    RoleViolation { required: Role },
    #[error("No active attendance session")]
    NoActiveSession,
    #[error("Unrecognized event: {0}")]
    UnrecognizedEvent(String),
    #[error("Invalid {event} payload")]
    InvalidPayload { event: &'static str },
    #[error(transparent)]
    Collaborator(FinalizeError),
}

impl ProtocolError {
    pub fn to_event(&self) -> ServerEvent {
        ServerEvent::error(self.to_string())
    }
}

impl From<SessionError> for ProtocolError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NoActiveSession => ProtocolError::NoActiveSession,
        }
    }
}

impl From<FinalizeError> for ProtocolError {
    fn from(err: FinalizeError) -> Self {
        match err {
            FinalizeError::Session(e) => e.into(),
            other => ProtocolError::Collaborator(other),
        }
    }
}
