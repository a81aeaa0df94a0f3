//! Test environment setup and teardown
//!
//! A [`TestEnvironment`] is created once per daemon family and shared by
//! handle between every caller that wants the environment up. The sequence:
//!
//! 1. guard check (at most one setup per environment)
//! 2. test-mode policy gate
//! 3. resolve process and application identity; the delegator registry is
//!    optional and only feeds the launch
//! 4. build the connection token
//! 5. schedule the connection on the module, then fire the daemon launch
//!
//! Step 5's two branches are independent: a skipped or failed launch never
//! prevents the module from connecting to an already running daemon.

use std::sync::Arc;

use crate::common::config::BootstrapConfig;

use super::capability::{names, CapabilityResolver, TestModule};
use super::guard::{SetupGuard, SetupState};
use super::launcher::{DaemonFamily, DaemonLauncher, LaunchTask};
use super::scheduler::schedule_connection;
use super::token::ConnectionToken;

/// Value the test-mode parameter must hold for setup to proceed
const TEST_MODE_ENABLED: &str = "1";

/// Per-environment bootstrap settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapSettings {
    pub require_test_mode: bool,
    pub test_mode_parameter: String,
    pub timeout_units: u32,
}

impl BootstrapSettings {
    pub fn for_family(family: DaemonFamily) -> Self {
        Self::from_config(&BootstrapConfig::default(), family)
    }

    pub fn from_config(config: &BootstrapConfig, family: DaemonFamily) -> Self {
        Self {
            require_test_mode: config.require_test_mode,
            test_mode_parameter: config.test_mode_parameter.clone(),
            timeout_units: config.timeout_units(family),
        }
    }
}

/// What a call to [`TestEnvironment::setup`] did
#[derive(Debug)]
pub enum SetupOutcome {
    /// Connection scheduled and daemon launch in flight
    Completed {
        token: ConnectionToken,
        launch: LaunchTask,
    },
    /// Setup already ran (or is running); nothing done
    AlreadyInitialized,
    /// The test-mode parameter forbids bootstrapping
    PolicyDenied,
    /// A capability the bootstrap depends on is missing
    CapabilityUnavailable(&'static str),
}

/// What a call to [`TestEnvironment::teardown`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownOutcome {
    TornDown,
    NotSetUp,
}

/// Owned bootstrap state for one daemon family
pub struct TestEnvironment {
    family: DaemonFamily,
    module: Arc<dyn TestModule>,
    resolver: CapabilityResolver,
    settings: BootstrapSettings,
    guard: SetupGuard,
}

impl std::fmt::Debug for TestEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestEnvironment")
            .field("family", &self.family)
            .field("settings", &self.settings)
            .field("state", &self.guard.state())
            .finish_non_exhaustive()
    }
}

impl TestEnvironment {
    pub fn new(
        family: DaemonFamily,
        module: Arc<dyn TestModule>,
        resolver: CapabilityResolver,
        settings: BootstrapSettings,
    ) -> Self {
        Self {
            family,
            module,
            resolver,
            settings,
            guard: SetupGuard::new(),
        }
    }

    /// Resolve the family's module and build its environment
    pub fn load(
        family: DaemonFamily,
        resolver: CapabilityResolver,
        settings: BootstrapSettings,
    ) -> Option<Self> {
        let Some(module) = resolver.module(family.module_capability()) else {
            tracing::error!(
                %family,
                capability = family.module_capability(),
                "Failed to load test module"
            );
            return None;
        };
        tracing::debug!(%family, "Loaded test module");
        Some(Self::new(family, module, resolver, settings))
    }

    pub fn family(&self) -> DaemonFamily {
        self.family
    }

    pub fn state(&self) -> SetupState {
        self.guard.state()
    }

    /// Bring the environment up, once
    ///
    /// Never fails; every problem is logged and reported as an outcome. The
    /// daemon launch is spawned on the current tokio runtime.
    pub fn setup(&self) -> SetupOutcome {
        if !self.guard.try_begin() {
            tracing::debug!(family = %self.family, state = ?self.guard.state(), "Setup already called");
            return SetupOutcome::AlreadyInitialized;
        }

        let outcome = self.run_setup();
        match &outcome {
            SetupOutcome::Completed { token, .. } => {
                self.guard.complete();
                tracing::info!(family = %self.family, %token, "Test environment ready");
            }
            _ => self.guard.abort(),
        }
        outcome
    }

    fn run_setup(&self) -> SetupOutcome {
        let family = self.family;

        if self.settings.require_test_mode {
            let Some(parameters) = self.resolver.parameters() else {
                tracing::error!(%family, "Failed to require systemparameter capability");
                return SetupOutcome::CapabilityUnavailable(names::SYSTEM_PARAMETER);
            };
            let key = &self.settings.test_mode_parameter;
            let value = parameters.get_sync(key, "0");
            if value != TEST_MODE_ENABLED {
                tracing::warn!(%family, parameter = %key, %value, "Test mode is not enabled, skipping setup");
                return SetupOutcome::PolicyDenied;
            }
        }

        let Some(process) = self.resolver.process() else {
            tracing::error!(%family, "Failed to require process capability");
            return SetupOutcome::CapabilityUnavailable(names::PROCESS);
        };

        let registry = self.resolver.delegator_registry();
        if registry.is_none() {
            tracing::warn!(%family, "Failed to require ability delegator registry");
        }

        let context = registry
            .as_ref()
            .and_then(|registry| registry.ability_delegator())
            .map(|delegator| delegator.app_context())
            .or_else(|| self.resolver.app_context());
        let Some(context) = context else {
            tracing::error!(%family, "No application context from delegator or host");
            return SetupOutcome::CapabilityUnavailable(names::APP_CONTEXT);
        };

        let token = ConnectionToken::build(&context, process.as_ref());
        schedule_connection(self.module.as_ref(), &token);

        let launcher = DaemonLauncher::new(family, self.settings.timeout_units);
        let launch = match registry {
            Some(registry) => launcher.spawn(token.clone(), registry),
            None => launcher.skip(),
        };

        SetupOutcome::Completed { token, launch }
    }

    /// Tear the environment down, only if setup completed
    pub fn teardown(&self) -> TeardownOutcome {
        if !self.guard.try_teardown() {
            tracing::debug!(family = %self.family, state = ?self.guard.state(), "Nothing to tear down");
            return TeardownOutcome::NotSetUp;
        }
        tracing::info!(family = %self.family, "Disposing test module");
        self.module.teardown();
        TeardownOutcome::TornDown
    }
}

/// Lifecycle entry points offered to the host test session
#[derive(Debug, Clone, Default)]
pub struct LifecycleHooks {
    ui: Option<Arc<TestEnvironment>>,
    perf: Option<Arc<TestEnvironment>>,
}

impl LifecycleHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every family whose module the resolver can provide
    pub fn install(resolver: &CapabilityResolver, config: &BootstrapConfig) -> Self {
        let mut hooks = Self::new();
        for family in [DaemonFamily::UiTest, DaemonFamily::PerfTest] {
            let settings = BootstrapSettings::from_config(config, family);
            if let Some(env) = TestEnvironment::load(family, resolver.clone(), settings) {
                hooks = hooks.with_environment(Arc::new(env));
            }
        }
        hooks
    }

    pub fn with_environment(mut self, env: Arc<TestEnvironment>) -> Self {
        match env.family() {
            DaemonFamily::UiTest => self.ui = Some(env),
            DaemonFamily::PerfTest => self.perf = Some(env),
        }
        self
    }

    pub fn environment(&self, family: DaemonFamily) -> Option<&Arc<TestEnvironment>> {
        match family {
            DaemonFamily::UiTest => self.ui.as_ref(),
            DaemonFamily::PerfTest => self.perf.as_ref(),
        }
    }

    /// `None` when the family's module was never loaded
    pub fn setup(&self, family: DaemonFamily) -> Option<SetupOutcome> {
        match self.environment(family) {
            Some(env) => Some(env.setup()),
            None => {
                tracing::warn!(%family, "Setup requested for unloaded test module");
                None
            }
        }
    }

    pub fn teardown(&self, family: DaemonFamily) -> Option<TeardownOutcome> {
        self.environment(family).map(|env| env.teardown())
    }

    pub fn setup_ui_test_environment(&self) -> Option<SetupOutcome> {
        self.setup(DaemonFamily::UiTest)
    }

    pub fn teardown_ui_test_environment(&self) -> Option<TeardownOutcome> {
        self.teardown(DaemonFamily::UiTest)
    }

    pub fn setup_perf_test_environment(&self) -> Option<SetupOutcome> {
        self.setup(DaemonFamily::PerfTest)
    }

    pub fn teardown_perf_test_environment(&self) -> Option<TeardownOutcome> {
        self.teardown(DaemonFamily::PerfTest)
    }
}
