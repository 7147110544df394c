use shared::domain::EventId;
use thiserror::Error;

/// One failed step inside a multi-call operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationFailure {
    pub operation: String,
    pub message: String,
}

impl OperationFailure {
    pub fn new(operation: impl Into<String>, error: &ClientError) -> Self {
        Self {
            operation: operation.into(),
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// Network fault, non-2xx status or an undecodable body.
    #[error("{message}")]
    Transport {
        message: String,
        status: Option<u16>,
    },
    #[error("{0}")]
    Validation(String),
    /// Some steps of a multi-call operation failed; the others were not rolled back.
    #[error("{context}: {} operation(s) failed", .failures.len())]
    Aggregate {
        context: String,
        failures: Vec<OperationFailure>,
        /// The event row that was persisted before the children failed.
        saved_event: Option<EventId>,
    },
}

impl ClientError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            status: None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }

    pub fn saved_event(&self) -> Option<EventId> {
        match self {
            Self::Aggregate { saved_event, .. } => *saved_event,
            _ => None,
        }
    }

    pub fn failures(&self) -> &[OperationFailure] {
        match self {
            Self::Aggregate { failures, .. } => failures,
            _ => &[],
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        let status = err.status().map(|status| status.as_u16());
        let message = if err.is_connect() {
            format!("could not reach the events API: {err}")
        } else if err.is_decode() {
            format!("events API returned malformed JSON: {err}")
        } else {
            format!("request to the events API failed: {err}")
        };
        Self::Transport { message, status }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
