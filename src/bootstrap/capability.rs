//! Host capabilities and their resolution
//!
//! The host runtime exposes native features under dotted names. A name is
//! looked up in three provider namespaces, in priority order:
//!
//! 1. the native registry, keyed by the full dotted name
//! 2. the plugin tree, walked segment by segment
//! 3. the legacy plugin tree, walked the same way
//!
//! The first hit wins. Absence is not an error; callers log and degrade.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::common::Result;

use super::token::ConnectionToken;

/// Well-known capability names
pub mod names {
    pub const PROCESS: &str = "process";
    pub const SYSTEM_PARAMETER: &str = "systemparameter";
    pub const DELEGATOR_REGISTRY: &str = "application.abilityDelegatorRegistry";
    pub const APP_CONTEXT: &str = "application.context";
    pub const UITEST_MODULE: &str = "uitest";
    pub const PERFTEST_MODULE: &str = "test.PerfTest";
}

/// Identity facts of the current process
pub trait ProcessInfo: Send + Sync {
    fn pid(&self) -> u32;
    fn uid(&self) -> u32;
}

/// Read access to system parameters
pub trait SystemParameterProvider: Send + Sync {
    /// Value of `key`, or `default` when unset
    fn get_sync(&self, key: &str, default: &str) -> String;
}

/// Entry point to the host's test delegator
pub trait DelegatorRegistry: Send + Sync {
    /// `None` when the host runs without a delegator (daemon pre-started externally)
    fn ability_delegator(&self) -> Option<Arc<dyn Delegator>>;
}

/// Application context reported by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppContext {
    /// Application (bundle) name
    pub application_name: String,
    /// Storage area of the context
    pub area: u32,
}

/// Output of a shell command run by the delegator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult {
    pub std_result: String,
    pub exit_code: i32,
}

/// The host's test delegator
#[async_trait]
pub trait Delegator: Send + Sync {
    fn app_context(&self) -> AppContext;

    /// Run `command`, bounded by `timeout_units` seconds
    async fn execute_shell_command(&self, command: &str, timeout_units: u32)
        -> Result<CommandResult>;
}

/// In-process side of a daemon family; owns the transport to the daemon
pub trait TestModule: Send + Sync {
    /// Hand over the token; the module dials or listens on its own
    fn schedule_establish_connection(&self, token: &ConnectionToken);

    fn teardown(&self);
}

/// A resolved capability handle
#[derive(Clone)]
pub enum Capability {
    Process(Arc<dyn ProcessInfo>),
    SystemParameters(Arc<dyn SystemParameterProvider>),
    DelegatorRegistry(Arc<dyn DelegatorRegistry>),
    AppContext(AppContext),
    Module(Arc<dyn TestModule>),
}

impl Capability {
    /// Short kind name, for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Capability::Process(_) => "process",
            Capability::SystemParameters(_) => "system-parameters",
            Capability::DelegatorRegistry(_) => "delegator-registry",
            Capability::AppContext(_) => "app-context",
            Capability::Module(_) => "module",
        }
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::AppContext(ctx) => f.debug_tuple("AppContext").field(ctx).finish(),
            other => write!(f, "Capability({})", other.kind()),
        }
    }
}

/// Nested key/value tree of capabilities
#[derive(Debug, Clone)]
pub enum CapabilityTree {
    Leaf(Capability),
    Branch(BTreeMap<String, CapabilityTree>),
}

impl Default for CapabilityTree {
    fn default() -> Self {
        CapabilityTree::Branch(BTreeMap::new())
    }
}

impl CapabilityTree {
    /// Insert `capability` at a dotted path, creating branches on the way
    ///
    /// An existing leaf in the way is replaced by a branch.
    pub fn insert(&mut self, name: &str, capability: Capability) {
        let mut node = self;
        for segment in name.split('.') {
            if matches!(node, CapabilityTree::Leaf(_)) {
                *node = CapabilityTree::default();
            }
            let CapabilityTree::Branch(children) = node else {
                unreachable!("leaf replaced above");
            };
            node = children.entry(segment.to_string()).or_default();
        }
        *node = CapabilityTree::Leaf(capability);
    }

    /// Walk a dotted path; `None` as soon as a segment is missing
    pub fn lookup(&self, name: &str) -> Option<&Capability> {
        let mut node = self;
        for segment in name.split('.') {
            match node {
                CapabilityTree::Branch(children) => node = children.get(segment)?,
                CapabilityTree::Leaf(_) => return None,
            }
        }
        match node {
            CapabilityTree::Leaf(capability) => Some(capability),
            CapabilityTree::Branch(_) => None,
        }
    }
}

/// Which namespace satisfied a lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    Native,
    Plugin,
    LegacyPlugin,
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Namespace::Native => write!(f, "native"),
            Namespace::Plugin => write!(f, "plugin"),
            Namespace::LegacyPlugin => write!(f, "legacy-plugin"),
        }
    }
}

/// Looks up capabilities across the provider namespaces
#[derive(Debug, Clone, Default)]
pub struct CapabilityResolver {
    native: HashMap<String, Capability>,
    plugin: CapabilityTree,
    legacy: CapabilityTree,
}

impl CapabilityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a capability in the native registry
    pub fn with_native(mut self, name: &str, capability: Capability) -> Self {
        self.native.insert(name.to_string(), capability);
        self
    }

    /// Register a capability in the plugin tree
    pub fn with_plugin(mut self, name: &str, capability: Capability) -> Self {
        self.plugin.insert(name, capability);
        self
    }

    /// Register a capability in the legacy plugin tree
    pub fn with_legacy_plugin(mut self, name: &str, capability: Capability) -> Self {
        self.legacy.insert(name, capability);
        self
    }

    /// Resolve a name, reporting which namespace answered
    pub fn resolve_with_source(&self, name: &str) -> Option<(Namespace, Capability)> {
        let found = self
            .native
            .get(name)
            .map(|c| (Namespace::Native, c))
            .or_else(|| self.plugin.lookup(name).map(|c| (Namespace::Plugin, c)))
            .or_else(|| self.legacy.lookup(name).map(|c| (Namespace::LegacyPlugin, c)));

        match found {
            Some((namespace, capability)) => {
                tracing::trace!(name, %namespace, kind = capability.kind(), "Resolved capability");
                Some((namespace, capability.clone()))
            }
            None => {
                tracing::debug!(name, "Capability not found in any namespace");
                None
            }
        }
    }

    pub fn resolve(&self, name: &str) -> Option<Capability> {
        self.resolve_with_source(name).map(|(_, capability)| capability)
    }

    pub fn process(&self) -> Option<Arc<dyn ProcessInfo>> {
        match self.resolve(names::PROCESS)? {
            Capability::Process(process) => Some(process),
            other => mismatched(names::PROCESS, &other),
        }
    }

    pub fn parameters(&self) -> Option<Arc<dyn SystemParameterProvider>> {
        match self.resolve(names::SYSTEM_PARAMETER)? {
            Capability::SystemParameters(params) => Some(params),
            other => mismatched(names::SYSTEM_PARAMETER, &other),
        }
    }

    pub fn delegator_registry(&self) -> Option<Arc<dyn DelegatorRegistry>> {
        match self.resolve(names::DELEGATOR_REGISTRY)? {
            Capability::DelegatorRegistry(registry) => Some(registry),
            other => mismatched(names::DELEGATOR_REGISTRY, &other),
        }
    }

    pub fn app_context(&self) -> Option<AppContext> {
        match self.resolve(names::APP_CONTEXT)? {
            Capability::AppContext(ctx) => Some(ctx),
            other => mismatched(names::APP_CONTEXT, &other),
        }
    }

    pub fn module(&self, name: &str) -> Option<Arc<dyn TestModule>> {
        match self.resolve(name)? {
            Capability::Module(module) => Some(module),
            other => mismatched(name, &other),
        }
    }
}

fn mismatched<T>(name: &str, found: &Capability) -> Option<T> {
    tracing::warn!(name, kind = found.kind(), "Capability has unexpected kind");
    None
}
