//! End-to-end tests for the testkit bootstrap
//!
//! These tests drive the public API with in-memory host capabilities and
//! run the CLI binary for the user-facing commands.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Command;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use testkit::bootstrap::capability::names;
use testkit::bootstrap::{
    AppContext, BootstrapSettings, Capability, CapabilityResolver, CommandResult, Delegator,
    DelegatorRegistry, LaunchOutcome, ProcessIdentity, SetupOutcome, SetupState,
    SystemParameterProvider, TeardownOutcome, TestModule,
};
use testkit::common::config::BootstrapConfig;
use testkit::{ConnectionToken, DaemonFamily, Error, LifecycleHooks, TestEnvironment};

/// Everything observable from the host side
#[derive(Default)]
struct Observed {
    commands: Mutex<Vec<String>>,
    scheduled: Mutex<Vec<String>>,
    teardowns: Mutex<u32>,
    /// Ordered trace of "schedule" / "launch-start" / "launch-end"
    events: Mutex<Vec<&'static str>>,
}

impl Observed {
    fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    fn scheduled(&self) -> Vec<String> {
        self.scheduled.lock().unwrap().clone()
    }

    fn events(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().clone()
    }
}

struct FakeModule(Arc<Observed>);

impl TestModule for FakeModule {
    fn schedule_establish_connection(&self, token: &ConnectionToken) {
        self.0.scheduled.lock().unwrap().push(token.to_string());
        self.0.events.lock().unwrap().push("schedule");
    }

    fn teardown(&self) {
        *self.0.teardowns.lock().unwrap() += 1;
    }
}

/// How the fake shell answers `start-daemon`
#[derive(Clone)]
enum ShellBehaviour {
    Succeed,
    Fail,
    /// Block until the notify fires
    Gate(Arc<Notify>),
}

struct FakeDelegator {
    observed: Arc<Observed>,
    behaviour: ShellBehaviour,
}

#[async_trait]
impl Delegator for FakeDelegator {
    fn app_context(&self) -> AppContext {
        AppContext {
            application_name: "App".to_string(),
            area: 2,
        }
    }

    async fn execute_shell_command(
        &self,
        command: &str,
        timeout_units: u32,
    ) -> testkit::Result<CommandResult> {
        self.observed.commands.lock().unwrap().push(command.to_string());
        self.observed.events.lock().unwrap().push("launch-start");
        let result = match &self.behaviour {
            ShellBehaviour::Succeed => Ok(CommandResult {
                std_result: "success".to_string(),
                exit_code: 0,
            }),
            ShellBehaviour::Fail => Err(Error::Timeout(u64::from(timeout_units))),
            ShellBehaviour::Gate(notify) => {
                notify.notified().await;
                Ok(CommandResult {
                    std_result: "late".to_string(),
                    exit_code: 0,
                })
            }
        };
        self.observed.events.lock().unwrap().push("launch-end");
        result
    }
}

struct FakeRegistry {
    delegator: Option<Arc<FakeDelegator>>,
}

impl DelegatorRegistry for FakeRegistry {
    fn ability_delegator(&self) -> Option<Arc<dyn Delegator>> {
        self.delegator.clone().map(|d| d as Arc<dyn Delegator>)
    }
}

struct FakeParameters(HashMap<String, String>);

impl SystemParameterProvider for FakeParameters {
    fn get_sync(&self, key: &str, default: &str) -> String {
        self.0.get(key).cloned().unwrap_or_else(|| default.to_string())
    }
}

/// Test context with a fake host
struct TestContext {
    observed: Arc<Observed>,
    test_mode: &'static str,
    behaviour: Option<ShellBehaviour>,
    host_context: Option<AppContext>,
    registry: bool,
}

impl TestContext {
    fn new() -> Self {
        Self {
            observed: Arc::new(Observed::default()),
            test_mode: "1",
            behaviour: Some(ShellBehaviour::Succeed),
            host_context: None,
            registry: true,
        }
    }

    /// Host without any delegator registry capability
    fn without_registry(mut self) -> Self {
        self.registry = false;
        self
    }

    fn test_mode(mut self, value: &'static str) -> Self {
        self.test_mode = value;
        self
    }

    /// `None` means the registry has no delegator
    fn shell(mut self, behaviour: Option<ShellBehaviour>) -> Self {
        self.behaviour = behaviour;
        self
    }

    fn host_context(mut self, name: &str, area: u32) -> Self {
        self.host_context = Some(AppContext {
            application_name: name.to_string(),
            area,
        });
        self
    }

    fn resolver(&self) -> CapabilityResolver {
        let mut params = HashMap::new();
        params.insert(
            "persist.ace.testmode.enabled".to_string(),
            self.test_mode.to_string(),
        );
        let delegator = self.behaviour.clone().map(|behaviour| {
            Arc::new(FakeDelegator {
                observed: self.observed.clone(),
                behaviour,
            })
        });

        let mut resolver = CapabilityResolver::new()
            .with_native(
                names::PROCESS,
                Capability::Process(Arc::new(ProcessIdentity { pid: 1234, uid: 99 })),
            )
            .with_native(
                names::SYSTEM_PARAMETER,
                Capability::SystemParameters(Arc::new(FakeParameters(params))),
            )
            .with_legacy_plugin(
                names::UITEST_MODULE,
                Capability::Module(Arc::new(FakeModule(self.observed.clone()))),
            )
            .with_plugin(
                names::PERFTEST_MODULE,
                Capability::Module(Arc::new(FakeModule(self.observed.clone()))),
            );
        if self.registry {
            resolver = resolver.with_plugin(
                names::DELEGATOR_REGISTRY,
                Capability::DelegatorRegistry(Arc::new(FakeRegistry { delegator })),
            );
        }
        if let Some(context) = &self.host_context {
            resolver = resolver.with_native(names::APP_CONTEXT, Capability::AppContext(context.clone()));
        }
        resolver
    }

    fn environment(&self, family: DaemonFamily) -> Arc<TestEnvironment> {
        let env = TestEnvironment::load(family, self.resolver(), BootstrapSettings::for_family(family))
            .expect("module should resolve");
        Arc::new(env)
    }
}

async fn completed(outcome: SetupOutcome) -> (ConnectionToken, LaunchOutcome) {
    match outcome {
        SetupOutcome::Completed { token, launch } => (token, launch.outcome().await),
        other => panic!("expected completed setup, got {other:?}"),
    }
}

#[tokio::test]
async fn test_setup_twice_launches_and_schedules_once() {
    let ctx = TestContext::new();
    let env = ctx.environment(DaemonFamily::UiTest);

    let (token, launch) = completed(env.setup()).await;
    assert_eq!(token.as_str(), "App@1234@99@2");
    assert!(matches!(launch, LaunchOutcome::Succeeded(_)));

    assert!(matches!(env.setup(), SetupOutcome::AlreadyInitialized));

    assert_eq!(ctx.observed.commands(), vec!["uitest start-daemon App@1234@99@2"]);
    assert_eq!(ctx.observed.scheduled(), vec!["App@1234@99@2"]);
}

#[tokio::test]
async fn test_many_setups_from_shared_handle() {
    let ctx = TestContext::new();
    let env = ctx.environment(DaemonFamily::PerfTest);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let env = env.clone();
        handles.push(tokio::spawn(async move {
            match env.setup() {
                SetupOutcome::Completed { launch, .. } => {
                    launch.outcome().await;
                    true
                }
                _ => false,
            }
        }));
    }

    let mut completed_count = 0;
    for handle in handles {
        if handle.await.unwrap() {
            completed_count += 1;
        }
    }

    assert_eq!(completed_count, 1);
    assert_eq!(ctx.observed.commands(), vec!["perftest start-daemon App@1234@99@2"]);
    assert_eq!(ctx.observed.scheduled().len(), 1);
}

#[tokio::test]
async fn test_test_mode_disabled_has_no_side_effects() {
    let ctx = TestContext::new().test_mode("0");
    let env = ctx.environment(DaemonFamily::UiTest);

    assert!(matches!(env.setup(), SetupOutcome::PolicyDenied));
    assert_eq!(env.state(), SetupState::NotStarted);
    assert!(ctx.observed.commands().is_empty());
    assert!(ctx.observed.scheduled().is_empty());
}

#[tokio::test]
async fn test_missing_delegator_skips_launch_but_schedules() {
    let ctx = TestContext::new().shell(None).host_context("Host", 1);
    let env = ctx.environment(DaemonFamily::UiTest);

    let (token, launch) = completed(env.setup()).await;
    assert_eq!(launch, LaunchOutcome::Skipped);
    assert_eq!(ctx.observed.scheduled(), vec![token.to_string()]);
    assert_eq!(token.as_str(), "Host@1234@99@1");
    assert!(ctx.observed.commands().is_empty());
}

#[tokio::test]
async fn test_missing_registry_skips_launch_but_schedules() {
    let ctx = TestContext::new().without_registry().host_context("Host", 4);
    let env = ctx.environment(DaemonFamily::PerfTest);

    let (token, launch) = completed(env.setup()).await;
    assert_eq!(token.as_str(), "Host@1234@99@4");
    assert_eq!(launch, LaunchOutcome::Skipped);
    assert_eq!(ctx.observed.scheduled(), vec!["Host@1234@99@4"]);
    assert!(ctx.observed.commands().is_empty());
    assert_eq!(env.state(), SetupState::Done);
}

#[tokio::test]
async fn test_failed_launch_still_completes_setup() {
    let ctx = TestContext::new().shell(Some(ShellBehaviour::Fail));
    let env = ctx.environment(DaemonFamily::UiTest);

    let (_, launch) = completed(env.setup()).await;
    assert!(launch.is_failed());
    assert_eq!(env.state(), SetupState::Done);
    assert_eq!(ctx.observed.scheduled().len(), 1);
}

#[tokio::test]
async fn test_scheduling_does_not_wait_for_launch() {
    let gate = Arc::new(Notify::new());
    let ctx = TestContext::new().shell(Some(ShellBehaviour::Gate(gate.clone())));
    let env = ctx.environment(DaemonFamily::PerfTest);

    let SetupOutcome::Completed { launch, .. } = env.setup() else {
        panic!("expected completed setup");
    };

    // The connection is scheduled while the daemon start is still pending
    assert_eq!(ctx.observed.scheduled().len(), 1);
    assert_eq!(env.state(), SetupState::Done);

    tokio::time::sleep(Duration::from_millis(20)).await;
    gate.notify_one();
    assert!(matches!(launch.outcome().await, LaunchOutcome::Succeeded(_)));
    assert_eq!(
        ctx.observed.events(),
        vec!["schedule", "launch-start", "launch-end"]
    );
}

#[tokio::test]
async fn test_teardown_lifecycle() {
    let ctx = TestContext::new();
    let env = ctx.environment(DaemonFamily::UiTest);

    assert_eq!(env.teardown(), TeardownOutcome::NotSetUp);
    assert_eq!(*ctx.observed.teardowns.lock().unwrap(), 0);

    completed(env.setup()).await;
    assert_eq!(env.teardown(), TeardownOutcome::TornDown);
    assert_eq!(env.teardown(), TeardownOutcome::NotSetUp);
    assert!(matches!(env.setup(), SetupOutcome::AlreadyInitialized));
    assert_eq!(*ctx.observed.teardowns.lock().unwrap(), 1);
    assert_eq!(env.state(), SetupState::TornDown);
}

#[tokio::test]
async fn test_hooks_cover_both_families() {
    let ctx = TestContext::new();
    let hooks = LifecycleHooks::install(&ctx.resolver(), &BootstrapConfig::default());

    let ui = hooks.setup_ui_test_environment().expect("uitest module loaded");
    let perf = hooks.setup_perf_test_environment().expect("perftest module loaded");
    completed(ui).await;
    completed(perf).await;

    let mut commands = ctx.observed.commands();
    commands.sort();
    assert_eq!(
        commands,
        vec![
            "perftest start-daemon App@1234@99@2",
            "uitest start-daemon App@1234@99@2",
        ]
    );

    assert_eq!(hooks.teardown_ui_test_environment(), Some(TeardownOutcome::TornDown));
    assert_eq!(hooks.teardown_perf_test_environment(), Some(TeardownOutcome::TornDown));
}

#[test]
fn test_unknown_capability_is_absent() {
    let ctx = TestContext::new();
    let resolver = ctx.resolver();
    assert!(resolver.resolve("nothing.at.all").is_none());
    assert!(resolver.module("ui.test").is_none());
}

/// Path to the compiled CLI
fn testkit_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_testkit"))
}

fn write_config(dir: &std::path::Path, contents: &str) -> PathBuf {
    let path = dir.join("config.toml");
    std::fs::write(&path, contents).expect("Failed to write config");
    path
}

#[test]
fn test_cli_token() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "[application]\nname = \"Demo\"\narea = 2\n");

    let output = Command::new(testkit_bin())
        .arg("--config")
        .arg(&config)
        .arg("token")
        .output()
        .expect("Failed to run testkit");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let parts: Vec<&str> = stdout.trim().split('@').collect();
    assert_eq!(parts.len(), 4, "unexpected token: {stdout}");
    assert_eq!(parts[0], "Demo");
    assert!(parts[1].parse::<u32>().is_ok());
    assert!(parts[2].parse::<u32>().is_ok());
    assert_eq!(parts[3], "2");
}

#[test]
fn test_cli_bootstrap_denied_without_test_mode() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "[parameters]\n\"persist.ace.testmode.enabled\" = \"0\"\n");

    let output = Command::new(testkit_bin())
        .arg("--config")
        .arg(&config)
        .args(["bootstrap", "--family", "ui"])
        .env_remove("TESTKIT_PARAM_PERSIST_ACE_TESTMODE_ENABLED")
        .output()
        .expect("Failed to run testkit");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Test mode disabled"));
}

#[test]
fn test_cli_coverage_without_input() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "");

    let output = Command::new(testkit_bin())
        .arg("--config")
        .arg(&config)
        .arg("coverage")
        .output()
        .expect("Failed to run testkit");
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        "OHOS_REPORT_ERROR_MESSAGE: Coverage data generation failed. Please clean up the project and rerun\n"
    );
}

#[test]
fn test_cli_rejects_bad_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "[coverage]\nchunk_len = \"many\"\n");

    let output = Command::new(testkit_bin())
        .arg("--config")
        .arg(&config)
        .arg("token")
        .output()
        .expect("Failed to run testkit");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid configuration file"));
}
