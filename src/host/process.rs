//! Process identity from the operating system

use crate::bootstrap::ProcessInfo;

/// The current OS process
#[derive(Debug, Clone, Copy, Default)]
pub struct OsProcess;

impl ProcessInfo for OsProcess {
    fn pid(&self) -> u32 {
        std::process::id()
    }

    #[cfg(unix)]
    fn uid(&self) -> u32 {
        unsafe { libc::getuid() }
    }

    #[cfg(not(unix))]
    fn uid(&self) -> u32 {
        0
    }
}
