//! Delegator that runs commands through a POSIX shell

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;

use crate::bootstrap::{AppContext, CommandResult, Delegator, DelegatorRegistry};
use crate::common::{Error, Result};

/// Shell looked up on PATH
const SHELL: &str = "sh";

/// How long output is still collected after the shell exits
const OUTPUT_GRACE: Duration = Duration::from_millis(200);

/// Offers a [`ShellDelegator`] when a shell is available
#[derive(Debug, Clone)]
pub struct ShellDelegatorRegistry {
    shell: Option<PathBuf>,
    context: AppContext,
}

impl ShellDelegatorRegistry {
    /// Find `sh` on PATH; without it no delegator is offered
    pub fn detect(context: AppContext) -> Self {
        let shell = match which::which(SHELL) {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::debug!(error = %e, "No shell on PATH, delegator unavailable");
                None
            }
        };
        Self { shell, context }
    }

    pub fn with_shell(shell: Option<PathBuf>, context: AppContext) -> Self {
        Self { shell, context }
    }
}

impl DelegatorRegistry for ShellDelegatorRegistry {
    fn ability_delegator(&self) -> Option<Arc<dyn Delegator>> {
        let shell = self.shell.clone()?;
        Some(Arc::new(ShellDelegator {
            shell,
            context: self.context.clone(),
        }))
    }
}

/// Runs `sh -c <command>`, bounded by the timeout in seconds
#[derive(Debug)]
pub struct ShellDelegator {
    shell: PathBuf,
    context: AppContext,
}

#[async_trait]
impl Delegator for ShellDelegator {
    fn app_context(&self) -> AppContext {
        self.context.clone()
    }

    async fn execute_shell_command(
        &self,
        command: &str,
        timeout_units: u32,
    ) -> Result<CommandResult> {
        tracing::debug!(shell = %self.shell.display(), command, timeout_units, "Executing shell command");

        let mut child = tokio::process::Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        // Daemons backgrounded by the command may hold the pipes open; only
        // the shell's exit is waited for.
        let (tx, mut rx) = mpsc::unbounded_channel();
        forward_output(child.stdout.take(), tx.clone());
        forward_output(child.stderr.take(), tx);

        let limit = Duration::from_secs(u64::from(timeout_units));
        let status = match tokio::time::timeout(limit, child.wait()).await {
            Ok(status) => status?,
            Err(_) => return Err(Error::Timeout(u64::from(timeout_units))),
        };

        let deadline = tokio::time::Instant::now() + OUTPUT_GRACE;
        let mut output = Vec::new();
        while let Ok(Some(chunk)) = tokio::time::timeout_at(deadline, rx.recv()).await {
            output.extend_from_slice(&chunk);
        }

        Ok(CommandResult {
            std_result: String::from_utf8_lossy(&output).into_owned(),
            exit_code: status.code().unwrap_or(-1),
        })
    }
}

/// Copy a child pipe into `tx` until EOF or until nobody listens
fn forward_output<R>(reader: Option<R>, tx: mpsc::UnboundedSender<Vec<u8>>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let Some(mut reader) = reader else {
        return;
    };
    tokio::spawn(async move {
        let mut buf = vec![0u8; 4096];
        loop {
            match reader.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    if tx.send(buf[..n].to_vec()).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Stopped reading command output");
                    break;
                }
            }
        }
    });
}
