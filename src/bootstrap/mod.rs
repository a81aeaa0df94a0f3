//! Client bootstrap for out-of-process test automation daemons
//!
//! Connects an in-process test runner to the UI automation or performance
//! daemon: resolves host capabilities, derives the connection token, hands
//! the token to the in-process module and launches the daemon best-effort.

pub mod capability;
pub mod environment;
pub mod guard;
pub mod launcher;
pub mod scheduler;
pub mod token;

pub use capability::{
    AppContext, Capability, CapabilityResolver, CapabilityTree, CommandResult, Delegator,
    DelegatorRegistry, ProcessInfo, SystemParameterProvider, TestModule,
};
pub use environment::{
    BootstrapSettings, LifecycleHooks, SetupOutcome, TeardownOutcome, TestEnvironment,
};
pub use guard::SetupState;
pub use launcher::{DaemonFamily, DaemonLauncher, LaunchOutcome, LaunchTask};
pub use token::{ConnectionToken, ProcessIdentity};
