use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, ErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnMetadata {
    pub confidence: Option<f32>,
    pub response_time_ms: Option<u64>,
    pub error_flag: bool,
}

/// One message in the assistant side-channel. Never mutated once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub metadata: TurnMetadata,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>, confidence: Option<f32>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
            timestamp: Utc::now(),
            metadata: TurnMetadata { confidence, ..Default::default() },
        }
    }

    pub fn assistant(content: impl Into<String>, response_time_ms: u64, confidence: Option<f32>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            metadata: TurnMetadata {
                confidence,
                response_time_ms: Some(response_time_ms),
                error_flag: false,
            },
        }
    }

    pub fn assistant_error(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            metadata: TurnMetadata { error_flag: true, ..Default::default() },
        }
    }

    pub fn is_error(&self) -> bool {
        self.metadata.error_flag
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub kind: ErrorKind,
    pub message: String,
    pub input: String,
    pub timestamp: DateTime<Utc>,
}

impl ErrorRecord {
    pub fn new(error: &DispatchError, input: impl Into<String>) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
            input: input.into(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_constructors() {
        let user = ConversationTurn::user("what is docker?", Some(0.95));
        assert_eq!(user.role, TurnRole::User);
        assert!(!user.is_error());

        let reply = ConversationTurn::assistant("Docker runs containers.", 420, Some(0.95));
        assert_eq!(reply.metadata.response_time_ms, Some(420));

        let err = ConversationTurn::assistant_error("the assistant is unreachable");
        assert!(err.is_error());
        assert_eq!(err.role, TurnRole::Assistant);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_value(ConversationTurn::user("hi", None)).unwrap();
        assert_eq!(json["role"], "user");
    }

    #[test]
    fn test_error_record_copies_kind() {
        let rec = ErrorRecord::new(&DispatchError::ShellUnavailable, "ls");
        assert_eq!(rec.kind, ErrorKind::ShellUnavailable);
        assert_eq!(rec.message, "no shell available");
        assert_eq!(rec.input, "ls");
    }
}
