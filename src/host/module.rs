//! In-process test module used by the CLI
//!
//! The transport to the daemon belongs to the module; this one records the
//! token it was handed so the CLI can report it.

use std::sync::Mutex;

use crate::bootstrap::{ConnectionToken, DaemonFamily, TestModule};

#[derive(Debug)]
pub struct HostModule {
    family: DaemonFamily,
    token: Mutex<Option<ConnectionToken>>,
}

impl HostModule {
    pub fn new(family: DaemonFamily) -> Self {
        Self {
            family,
            token: Mutex::new(None),
        }
    }

    /// Token from the last scheduled connection, if any
    pub fn scheduled_token(&self) -> Option<ConnectionToken> {
        self.token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl TestModule for HostModule {
    fn schedule_establish_connection(&self, token: &ConnectionToken) {
        tracing::info!(family = %self.family, %token, "Connection scheduled");
        *self
            .token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(token.clone());
    }

    fn teardown(&self) {
        let token = self
            .token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        tracing::info!(family = %self.family, token = ?token.as_ref().map(|t| t.as_str()), "Module disposed");
    }
}
