use anyhow::Result;
use async_trait::async_trait;

/// Asks the host environment whether a token names a runnable program.
#[async_trait]
pub trait CapabilityProbe: Send + Sync {
    async fn resolves(&self, token: &str) -> Result<bool>;

    /// Disabled probes are skipped without suspending.
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Probe used when command resolution is unavailable or turned off.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProbe;

#[async_trait]
impl CapabilityProbe for NoProbe {
    async fn resolves(&self, _token: &str) -> Result<bool> {
        Ok(false)
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

#[async_trait]
impl<P: CapabilityProbe + ?Sized> CapabilityProbe for std::sync::Arc<P> {
    async fn resolves(&self, token: &str) -> Result<bool> {
        (**self).resolves(token).await
    }

    fn is_enabled(&self) -> bool {
        (**self).is_enabled()
    }
}
