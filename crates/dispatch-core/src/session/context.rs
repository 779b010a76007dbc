use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use super::history::{ConversationTurn, ErrorRecord};

const DEFAULT_MAX_RECENT_COMMANDS: usize = 50;
const UPDATE_CHANNEL_CAPACITY: usize = 64;

/// Opaque reference to a live shell channel owned by the process host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShellHandle(String);

impl ShellHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ShellHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-tab state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionContext {
    pub session_id: Uuid,
    pub shell_handle: Option<ShellHandle>,
    pub working_directory: PathBuf,
    pub recent_commands: VecDeque<String>,
    pub conversation: Vec<ConversationTurn>,
    pub pending_errors: Vec<ErrorRecord>,
    max_recent_commands: usize,
}

impl SessionContext {
    pub fn new(working_directory: impl Into<PathBuf>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            shell_handle: None,
            working_directory: working_directory.into(),
            recent_commands: VecDeque::new(),
            conversation: Vec::new(),
            pending_errors: Vec::new(),
            max_recent_commands: DEFAULT_MAX_RECENT_COMMANDS,
        }
    }

    pub fn with_max_recent_commands(mut self, max: usize) -> Self {
        self.max_recent_commands = max.max(1);
        while self.recent_commands.len() > self.max_recent_commands {
            self.recent_commands.pop_front();
        }
        self
    }

    pub fn with_shell(mut self, handle: ShellHandle) -> Self {
        self.shell_handle = Some(handle);
        self
    }

    pub fn record_command(&mut self, command: impl Into<String>) {
        if self.recent_commands.len() >= self.max_recent_commands {
            self.recent_commands.pop_front();
        }
        self.recent_commands.push_back(command.into());
    }

    /// The last `count` commands, oldest first.
    pub fn last_commands(&self, count: usize) -> impl Iterator<Item = &str> {
        let skip = self.recent_commands.len().saturating_sub(count);
        self.recent_commands.iter().skip(skip).map(String::as_str)
    }

    pub fn last_turn(&self) -> Option<&ConversationTurn> {
        self.conversation.last()
    }
}

/// Change notifications for UI consumers.
#[derive(Debug, Clone)]
pub enum SessionUpdate {
    ShellAttached(ShellHandle),
    CommandSent(String),
    TurnAppended(ConversationTurn),
    ErrorRecorded(ErrorRecord),
    Closed,
}

/// A live tab: its context plus a liveness flag.
///
/// Every mutation goes through [`Session::apply`], which checks liveness under
/// the same lock `close` takes, so nothing lands in a session after it closed.
pub struct Session {
    id: Uuid,
    context: Mutex<SessionContext>,
    open: AtomicBool,
    updates: broadcast::Sender<SessionUpdate>,
}

impl Session {
    pub fn open(context: SessionContext) -> Arc<Self> {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Arc::new(Self {
            id: context.session_id,
            context: Mutex::new(context),
            open: AtomicBool::new(true),
            updates,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Marks the session destroyed. Later `apply` calls are no-ops.
    pub fn close(&self) {
        let _guard = self.context.lock();
        if self.open.swap(false, Ordering::SeqCst) {
            let _ = self.updates.send(SessionUpdate::Closed);
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionUpdate> {
        self.updates.subscribe()
    }

    pub fn snapshot(&self) -> SessionContext {
        self.context.lock().clone()
    }

    /// Reads the context without mutating it. Returns `None` once closed.
    pub fn read<R>(&self, f: impl FnOnce(&SessionContext) -> R) -> Option<R> {
        let guard = self.context.lock();
        self.is_open().then(|| f(&*guard))
    }

    /// Mutates the context if the session is still open.
    pub fn apply<R>(&self, f: impl FnOnce(&mut SessionContext) -> R) -> Option<R> {
        let mut guard = self.context.lock();
        if !self.is_open() {
            return None;
        }
        Some(f(&mut *guard))
    }

    pub fn shell_handle(&self) -> Option<ShellHandle> {
        self.context.lock().shell_handle.clone()
    }

    /// Called once the process host reports the shell is ready.
    pub fn attach_shell(&self, handle: ShellHandle) -> bool {
        let attached = self
            .apply(|ctx| ctx.shell_handle = Some(handle.clone()))
            .is_some();
        if attached {
            let _ = self.updates.send(SessionUpdate::ShellAttached(handle));
        }
        attached
    }

    pub fn append_turn(&self, turn: ConversationTurn) -> bool {
        let appended = self.apply(|ctx| ctx.conversation.push(turn.clone())).is_some();
        if appended {
            let _ = self.updates.send(SessionUpdate::TurnAppended(turn));
        }
        appended
    }

    pub fn record_command(&self, command: &str) -> bool {
        let recorded = self.apply(|ctx| ctx.record_command(command)).is_some();
        if recorded {
            let _ = self.updates.send(SessionUpdate::CommandSent(command.to_string()));
        }
        recorded
    }

    /// Records an error and its explanatory assistant turn in one step.
    pub fn record_failure(&self, record: ErrorRecord, turn: ConversationTurn) -> bool {
        let applied = self
            .apply(|ctx| {
                ctx.pending_errors.push(record.clone());
                ctx.conversation.push(turn.clone());
            })
            .is_some();
        if applied {
            let _ = self.updates.send(SessionUpdate::ErrorRecorded(record));
            let _ = self.updates.send(SessionUpdate::TurnAppended(turn));
        }
        applied
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("open", &self.is_open())
            .finish()
    }
}
