pub mod config;
pub mod dispatcher;
pub mod error;
pub mod ports;
pub mod prompt;
pub mod queue;
pub mod session;
pub mod stats;

pub use config::DispatchConfig;
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use error::{DispatchError, ErrorKind};
pub use ports::{ClassifierPort, InferencePort, ShellPort};
pub use queue::SessionQueue;
pub use session::{ConversationTurn, ErrorRecord, Session, SessionContext, SessionUpdate, ShellHandle, TurnRole};
pub use stats::StatsSnapshot;

// Simple in-crate mocks for demo/testing
pub mod mocks {
    use super::*;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use intent_router::{ClassificationError, RoutingDecision};
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Records every write; can be switched into a failing mode.
    #[derive(Default)]
    pub struct RecordingShell {
        writes: Mutex<Vec<(ShellHandle, String)>>,
        failing: AtomicBool,
    }

    impl RecordingShell {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub fn set_failing(&self, yes: bool) {
            self.failing.store(yes, Ordering::SeqCst);
        }

        pub fn writes(&self) -> Vec<String> {
            self.writes.lock().iter().map(|(_, s)| s.clone()).collect()
        }

        pub fn writes_for(&self, handle: &ShellHandle) -> Vec<String> {
            self.writes
                .lock()
                .iter()
                .filter(|(h, _)| h == handle)
                .map(|(_, s)| s.clone())
                .collect()
        }
    }

    #[async_trait]
    impl ShellPort for RecordingShell {
        async fn write(&self, handle: &ShellHandle, bytes: &[u8]) -> Result<()> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(anyhow!("broken pipe"));
            }
            self.writes
                .lock()
                .push((handle.clone(), String::from_utf8_lossy(bytes).into_owned()));
            Ok(())
        }
    }

    /// Assistant that replies with a fixed prefix, fails, hangs, or waits for a release signal.
    pub struct ScriptedInference {
        mode: Mutex<InferenceMode>,
        requests: Mutex<Vec<(String, String, String)>>,
        release: Notify,
    }

    #[derive(Debug, Clone)]
    pub enum InferenceMode {
        Echo,
        Fail(String),
        Delay(Duration),
        /// Blocks until `release` is called.
        Gated,
    }

    impl ScriptedInference {
        pub fn new(mode: InferenceMode) -> Arc<Self> {
            Arc::new(Self { mode: Mutex::new(mode), requests: Mutex::new(Vec::new()), release: Notify::new() })
        }

        pub fn set_mode(&self, mode: InferenceMode) {
            *self.mode.lock() = mode;
        }

        pub fn release(&self) {
            self.release.notify_one();
        }

        /// `(message, conversation_id, context)` for every call, in order.
        pub fn requests(&self) -> Vec<(String, String, String)> {
            self.requests.lock().clone()
        }
    }

    #[async_trait]
    impl InferencePort for ScriptedInference {
        async fn chat(&self, message: &str, conversation_id: &str, context: &str) -> Result<String> {
            self.requests
                .lock()
                .push((message.to_string(), conversation_id.to_string(), context.to_string()));
            let mode = self.mode.lock().clone();
            match mode {
                InferenceMode::Echo => Ok(format!("reply: {}", message)),
                InferenceMode::Fail(reason) => Err(anyhow!(reason)),
                InferenceMode::Delay(d) => {
                    tokio::time::sleep(d).await;
                    Ok(format!("reply: {}", message))
                }
                InferenceMode::Gated => {
                    self.release.notified().await;
                    Ok(format!("reply: {}", message))
                }
            }
        }
    }

    /// Primary classifier that is always down.
    pub struct FailingClassifier;

    #[async_trait]
    impl ClassifierPort for FailingClassifier {
        async fn classify(&self, _input: &str) -> std::result::Result<RoutingDecision, ClassificationError> {
            Err(ClassificationError::Unavailable("mock outage".to_string()))
        }
    }

    /// Primary classifier that never answers.
    pub struct StalledClassifier;

    #[async_trait]
    impl ClassifierPort for StalledClassifier {
        async fn classify(&self, _input: &str) -> std::result::Result<RoutingDecision, ClassificationError> {
            std::future::pending().await
        }
    }
}
