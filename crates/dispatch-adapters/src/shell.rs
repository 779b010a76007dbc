use std::collections::HashMap;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use dispatch_core::{ShellHandle, ShellPort};
use parking_lot::Mutex;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};
use tracing::{debug, info};
use uuid::Uuid;

struct ShellProcess {
    child: Child,
    stdin: Option<ChildStdin>,
}

type SharedProcess = Arc<tokio::sync::Mutex<ShellProcess>>;

/// Spawns one interactive shell per handle and feeds it through piped stdin.
/// Output goes straight to the parent's stdout and stderr.
///
/// Each shell has its own lock, so a write stalled on one shell's full pipe
/// never holds up another shell.
pub struct ProcessShell {
    program: String,
    shells: Mutex<HashMap<ShellHandle, SharedProcess>>,
}

impl ProcessShell {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into(), shells: Mutex::new(HashMap::new()) }
    }

    pub async fn attach(&self, working_directory: &Path) -> Result<ShellHandle> {
        let mut child = Command::new(&self.program)
            .current_dir(working_directory)
            .stdin(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to start shell '{}'", self.program))?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("shell '{}' has no stdin", self.program))?;

        let handle = ShellHandle::new(format!("sh-{}", Uuid::new_v4().simple()));
        info!(%handle, program = %self.program, pid = ?child.id(), "shell attached");
        let process = ShellProcess { child, stdin: Some(stdin) };
        self.shells.lock().insert(handle.clone(), Arc::new(tokio::sync::Mutex::new(process)));
        Ok(handle)
    }

    /// Closes the shell's stdin and waits for it to exit.
    pub async fn detach(&self, handle: &ShellHandle) -> Result<ExitStatus> {
        let entry = self
            .shells
            .lock()
            .remove(handle)
            .ok_or_else(|| anyhow!("unknown shell handle {}", handle))?;
        let mut process = entry.lock().await;
        drop(process.stdin.take());
        let status = process.child.wait().await.context("waiting for shell to exit")?;
        debug!(%handle, ?status, "shell detached");
        Ok(status)
    }

    fn process(&self, handle: &ShellHandle) -> Result<SharedProcess> {
        self.shells
            .lock()
            .get(handle)
            .cloned()
            .ok_or_else(|| anyhow!("unknown shell handle {}", handle))
    }
}

#[async_trait]
impl ShellPort for ProcessShell {
    async fn write(&self, handle: &ShellHandle, bytes: &[u8]) -> Result<()> {
        let entry = self.process(handle)?;
        let mut process = entry.lock().await;
        let stdin = process
            .stdin
            .as_mut()
            .ok_or_else(|| anyhow!("shell {} is detaching", handle))?;
        stdin.write_all(bytes).await.context("write to shell stdin")?;
        stdin.flush().await.context("flush shell stdin")?;
        Ok(())
    }
}

/// `$SHELL` when set, otherwise the platform's default command interpreter.
pub fn default_shell_program() -> String {
    if cfg!(windows) {
        std::env::var("COMSPEC").unwrap_or_else(|_| "cmd.exe".to_string())
    } else {
        std::env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string())
    }
}
