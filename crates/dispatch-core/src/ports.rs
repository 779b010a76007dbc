use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use intent_router::{CapabilityProbe, ClassificationError, IntentClassifier, RoutingDecision};

use crate::session::ShellHandle;

/// Write side of a live shell channel.
#[async_trait]
pub trait ShellPort: Send + Sync {
    async fn write(&self, handle: &ShellHandle, bytes: &[u8]) -> Result<()>;
}

/// AI inference backend.
#[async_trait]
pub trait InferencePort: Send + Sync {
    async fn chat(&self, message: &str, conversation_id: &str, context: &str) -> Result<String>;
}

/// Primary classification path. Failures make the dispatcher use the fallback heuristic.
#[async_trait]
pub trait ClassifierPort: Send + Sync {
    async fn classify(&self, input: &str) -> Result<RoutingDecision, ClassificationError>;
}

#[async_trait]
impl<P: CapabilityProbe> ClassifierPort for IntentClassifier<P> {
    async fn classify(&self, input: &str) -> Result<RoutingDecision, ClassificationError> {
        self.classify_async(input).await
    }
}

#[async_trait]
impl<T: ShellPort + ?Sized> ShellPort for Arc<T> {
    async fn write(&self, handle: &ShellHandle, bytes: &[u8]) -> Result<()> {
        (**self).write(handle, bytes).await
    }
}

#[async_trait]
impl<T: InferencePort + ?Sized> InferencePort for Arc<T> {
    async fn chat(&self, message: &str, conversation_id: &str, context: &str) -> Result<String> {
        (**self).chat(message, conversation_id, context).await
    }
}

#[async_trait]
impl<T: ClassifierPort + ?Sized> ClassifierPort for Arc<T> {
    async fn classify(&self, input: &str) -> Result<RoutingDecision, ClassificationError> {
        (**self).classify(input).await
    }
}
