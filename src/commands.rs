//! CLI command definitions
//!
//! Defines the clap commands for the testkit CLI.

use clap::{Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::bootstrap::DaemonFamily;

#[derive(Subcommand)]
pub enum Commands {
    /// Set up the test environment, report the daemon launch, then tear it down
    Bootstrap {
        /// Daemon family to connect to
        #[arg(long, value_enum, default_value_t = Family::Ui)]
        family: Family,
    },

    /// Print the connection token of this process
    Token,

    /// Emit coverage report lines for a coverage JSON file
    Coverage {
        /// Coverage JSON; reports an error line when omitted
        input: Option<PathBuf>,

        /// Characters per report line (default from config)
        #[arg(long)]
        chunk_len: Option<usize>,
    },

    /// Print the module -> source map of a mock configuration file
    MockList {
        /// Path to mock-config.json
        path: PathBuf,
    },
}

/// Daemon family as given on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Family {
    /// UI automation daemon
    Ui,
    /// Performance test daemon
    Perf,
}

impl From<Family> for DaemonFamily {
    fn from(family: Family) -> Self {
        match family {
            Family::Ui => DaemonFamily::UiTest,
            Family::Perf => DaemonFamily::PerfTest,
        }
    }
}
