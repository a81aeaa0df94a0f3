//! Host capabilities backed by the local operating system
//!
//! Used by the CLI to run the bootstrap outside of a managed test host.

pub mod module;
pub mod parameters;
pub mod process;
pub mod shell;

use std::sync::Arc;

use crate::bootstrap::capability::names;
use crate::bootstrap::{AppContext, Capability, CapabilityResolver, DaemonFamily};
use crate::common::config::Config;

pub use module::HostModule;
pub use parameters::ConfigParameters;
pub use process::OsProcess;
pub use shell::{ShellDelegator, ShellDelegatorRegistry};

/// Capabilities wired for the local host
#[derive(Debug, Clone)]
pub struct Host {
    pub resolver: CapabilityResolver,
    ui_module: Arc<HostModule>,
    perf_module: Arc<HostModule>,
}

impl Host {
    pub fn from_config(config: &Config) -> Self {
        let context = AppContext {
            application_name: config.application.name.clone(),
            area: config.application.area,
        };
        let ui_module = Arc::new(HostModule::new(DaemonFamily::UiTest));
        let perf_module = Arc::new(HostModule::new(DaemonFamily::PerfTest));

        let resolver = CapabilityResolver::new()
            .with_native(names::PROCESS, Capability::Process(Arc::new(OsProcess)))
            .with_native(
                names::SYSTEM_PARAMETER,
                Capability::SystemParameters(Arc::new(ConfigParameters::new(
                    config.parameters.clone(),
                ))),
            )
            .with_native(
                names::DELEGATOR_REGISTRY,
                Capability::DelegatorRegistry(Arc::new(ShellDelegatorRegistry::detect(
                    context.clone(),
                ))),
            )
            .with_native(names::APP_CONTEXT, Capability::AppContext(context))
            .with_plugin(names::UITEST_MODULE, Capability::Module(ui_module.clone()))
            .with_plugin(names::PERFTEST_MODULE, Capability::Module(perf_module.clone()));

        Self {
            resolver,
            ui_module,
            perf_module,
        }
    }

    pub fn module(&self, family: DaemonFamily) -> &Arc<HostModule> {
        match family {
            DaemonFamily::UiTest => &self.ui_module,
            DaemonFamily::PerfTest => &self.perf_module,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_resolves_all_capabilities() {
        let host = Host::from_config(&Config::default());

        assert!(host.resolver.process().is_some());
        assert!(host.resolver.parameters().is_some());
        assert!(host.resolver.delegator_registry().is_some());
        assert_eq!(host.resolver.app_context().unwrap().application_name, "testkit");
        assert!(host.resolver.module(names::UITEST_MODULE).is_some());
        assert!(host.resolver.module(names::PERFTEST_MODULE).is_some());
    }
}
