//! Daemon launcher
//!
//! Best-effort "make sure a daemon exists". The start command is issued
//! through the host delegator; its result is logged and never escalated,
//! since a daemon may already be running regardless.

use std::fmt;
use std::sync::Arc;

use tokio::task::JoinHandle;

use super::capability::{names, CommandResult, DelegatorRegistry};
use super::token::ConnectionToken;

/// Which automation daemon the client talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DaemonFamily {
    /// UI automation (`uitest`)
    UiTest,
    /// Performance probes (`perftest`)
    PerfTest,
}

impl DaemonFamily {
    /// Shell tool that starts the daemon
    pub fn tool(self) -> &'static str {
        match self {
            DaemonFamily::UiTest => "uitest",
            DaemonFamily::PerfTest => "perftest",
        }
    }

    /// Capability name of the in-process module
    pub fn module_capability(self) -> &'static str {
        match self {
            DaemonFamily::UiTest => names::UITEST_MODULE,
            DaemonFamily::PerfTest => names::PERFTEST_MODULE,
        }
    }

    /// Spin-up budget for `start-daemon`, in shell timeout units
    pub fn default_timeout_units(self) -> u32 {
        match self {
            DaemonFamily::UiTest => 1,
            DaemonFamily::PerfTest => 3,
        }
    }

    /// `<tool> start-daemon <token>`
    pub fn start_command(self, token: &ConnectionToken) -> String {
        format!("{} start-daemon {}", self.tool(), token)
    }
}

impl fmt::Display for DaemonFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tool())
    }
}

/// Result of a daemon start attempt; observed for logging only
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// No delegator; the daemon must have been pre-started
    Skipped,
    Succeeded(CommandResult),
    Failed(String),
}

impl LaunchOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, LaunchOutcome::Failed(_))
    }
}

/// Issues `start-daemon` for one family
#[derive(Debug, Clone, Copy)]
pub struct DaemonLauncher {
    family: DaemonFamily,
    timeout_units: u32,
}

impl DaemonLauncher {
    pub fn new(family: DaemonFamily, timeout_units: u32) -> Self {
        Self {
            family,
            timeout_units,
        }
    }

    pub fn family(&self) -> DaemonFamily {
        self.family
    }

    /// Attempt to start the daemon and wait for the bounded command
    pub async fn launch(
        &self,
        token: &ConnectionToken,
        registry: &dyn DelegatorRegistry,
    ) -> LaunchOutcome {
        let Some(delegator) = registry.ability_delegator() else {
            tracing::warn!(
                family = %self.family,
                "Cannot get ability delegator, {}_daemon needs to be pre-started",
                self.family.tool()
            );
            return LaunchOutcome::Skipped;
        };

        let command = self.family.start_command(token);
        tracing::info!(
            family = %self.family,
            %command,
            timeout_units = self.timeout_units,
            "Starting daemon"
        );

        match delegator
            .execute_shell_command(&command, self.timeout_units)
            .await
        {
            Ok(result) => {
                tracing::info!(
                    family = %self.family,
                    result = %serde_json::to_string(&result).unwrap_or_default(),
                    "Start daemon finished"
                );
                LaunchOutcome::Succeeded(result)
            }
            Err(e) => {
                tracing::error!(family = %self.family, error = %e, "Start daemon failed");
                LaunchOutcome::Failed(e.to_string())
            }
        }
    }

    /// Launch task for a host without a delegator registry
    pub fn skip(&self) -> LaunchTask {
        tracing::warn!(
            family = %self.family,
            "No delegator registry, {}_daemon needs to be pre-started",
            self.family.tool()
        );
        LaunchTask {
            family: self.family,
            state: TaskState::Finished(LaunchOutcome::Skipped),
        }
    }

    /// Fire the launch on the current runtime and return immediately
    ///
    /// Outside a tokio runtime nothing is started and the task resolves to
    /// `Failed`.
    pub fn spawn(&self, token: ConnectionToken, registry: Arc<dyn DelegatorRegistry>) -> LaunchTask {
        let family = self.family;
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                tracing::error!(%family, error = %e, "No async runtime for daemon launch");
                return LaunchTask {
                    family,
                    state: TaskState::Finished(LaunchOutcome::Failed(e.to_string())),
                };
            }
        };

        let launcher = *self;
        let handle =
            runtime.spawn(async move { launcher.launch(&token, registry.as_ref()).await });
        LaunchTask {
            family,
            state: TaskState::Running(handle),
        }
    }
}

#[derive(Debug)]
enum TaskState {
    Running(JoinHandle<LaunchOutcome>),
    Finished(LaunchOutcome),
}

/// Handle to an in-flight launch
///
/// Dropping it detaches the launch; awaiting it is only useful for logging.
#[derive(Debug)]
pub struct LaunchTask {
    family: DaemonFamily,
    state: TaskState,
}

impl LaunchTask {
    pub async fn outcome(self) -> LaunchOutcome {
        let handle = match self.state {
            TaskState::Running(handle) => handle,
            TaskState::Finished(outcome) => return outcome,
        };
        match handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(family = %self.family, error = %e, "Daemon launch task aborted");
                LaunchOutcome::Failed(e.to_string())
            }
        }
    }
}
