use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Everything that can go wrong while dispatching one line of input.
///
/// None of these are fatal to the session; each is either recovered locally
/// or reported into the conversation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    #[error("classifier unavailable: {0}")]
    ClassificationService(String),

    #[error("no shell available")]
    ShellUnavailable,

    #[error("failed to write `{command}` to the shell: {message}")]
    ShellWrite { command: String, message: String },

    #[error("{}", inference_summary(.message, .timed_out))]
    Inference { message: String, timed_out: bool },

    #[error("session is closed")]
    SessionClosed,
}

fn inference_summary(message: &str, timed_out: &bool) -> String {
    if *timed_out {
        format!("assistant timed out: {}", message)
    } else {
        format!("assistant request failed: {}", message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    ClassificationService,
    ShellUnavailable,
    ShellWrite,
    Inference,
    SessionClosed,
}

impl DispatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DispatchError::ClassificationService(_) => ErrorKind::ClassificationService,
            DispatchError::ShellUnavailable => ErrorKind::ShellUnavailable,
            DispatchError::ShellWrite { .. } => ErrorKind::ShellWrite,
            DispatchError::Inference { .. } => ErrorKind::Inference,
            DispatchError::SessionClosed => ErrorKind::SessionClosed,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, DispatchError::Inference { timed_out: true, .. })
    }
}
