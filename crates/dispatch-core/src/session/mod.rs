pub mod context;
pub mod history;

pub use context::{Session, SessionContext, SessionUpdate, ShellHandle};
pub use history::{ConversationTurn, ErrorRecord, TurnMetadata, TurnRole};
