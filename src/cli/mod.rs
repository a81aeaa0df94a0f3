//! CLI command handling
//!
//! Dispatches CLI commands against the local host and formats output.

use colored::Colorize;

use crate::bootstrap::capability::names;
use crate::bootstrap::{
    BootstrapSettings, ConnectionToken, DaemonFamily, LaunchOutcome, SetupOutcome, TestEnvironment,
};
use crate::commands::Commands;
use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::host::{Host, OsProcess};
use crate::report;

/// Dispatch a CLI command
pub async fn dispatch(command: Commands, config: Config) -> Result<()> {
    match command {
        Commands::Bootstrap { family } => bootstrap(family.into(), &config).await,

        Commands::Token => {
            let host = Host::from_config(&config);
            let context = host
                .resolver
                .app_context()
                .ok_or_else(|| Error::CapabilityUnavailable(names::APP_CONTEXT.to_string()))?;
            println!("{}", ConnectionToken::build(&context, &OsProcess));
            Ok(())
        }

        Commands::Coverage { input, chunk_len } => {
            let payload = match input {
                Some(path) => {
                    let content = std::fs::read_to_string(&path)
                        .map_err(|e| Error::file_read(&path, e))?;
                    Some(serde_json::from_str::<serde_json::Value>(&content)?)
                }
                None => None,
            };
            let chunk_len = chunk_len.unwrap_or(config.coverage.chunk_len);
            if chunk_len == 0 {
                return Err(Error::Config("--chunk-len must be greater than zero".to_string()));
            }
            let mut stdout = std::io::stdout().lock();
            report::emit_coverage(&mut stdout, payload.as_ref(), chunk_len)?;
            Ok(())
        }

        Commands::MockList { path } => {
            let mocks = report::load_mock_list(&path)?;
            println!("{}", serde_json::to_string_pretty(&mocks)?);
            Ok(())
        }
    }
}

async fn bootstrap(family: DaemonFamily, config: &Config) -> Result<()> {
    let host = Host::from_config(config);
    let settings = BootstrapSettings::from_config(&config.bootstrap, family);
    let env = TestEnvironment::load(family, host.resolver.clone(), settings)
        .ok_or_else(|| Error::ModuleNotLoaded(family.to_string()))?;

    match env.setup() {
        SetupOutcome::Completed { token, launch } => {
            println!("{} {}", "Token:".blue().bold(), token);
            print_launch(&launch.outcome().await);
            if let Some(scheduled) = host.module(family).scheduled_token() {
                println!("{} {}", "Connection scheduled:".blue().bold(), scheduled);
            }
        }
        SetupOutcome::AlreadyInitialized => println!("Environment already set up"),
        SetupOutcome::PolicyDenied => {
            println!(
                "{} parameter '{}' is not \"1\"; set it under [parameters] or via {}",
                "Test mode disabled:".yellow().bold(),
                config.bootstrap.test_mode_parameter,
                crate::host::ConfigParameters::env_var_name(&config.bootstrap.test_mode_parameter)
            );
        }
        SetupOutcome::CapabilityUnavailable(name) => {
            println!("{} {}", "Capability unavailable:".red().bold(), name);
        }
    }

    env.teardown();
    Ok(())
}

fn print_launch(outcome: &LaunchOutcome) {
    match outcome {
        LaunchOutcome::Skipped => {
            println!("{} no delegator, daemon must be pre-started", "Launch:".yellow().bold())
        }
        LaunchOutcome::Succeeded(result) => {
            println!("{} exit code {}", "Launch:".green().bold(), result.exit_code);
            let output = result.std_result.trim();
            if !output.is_empty() {
                println!("  {}", output.dimmed());
            }
        }
        LaunchOutcome::Failed(reason) => {
            println!("{} {}", "Launch failed:".red().bold(), reason)
        }
    }
}
