//! Connection scheduling

use super::capability::TestModule;
use super::token::ConnectionToken;

/// Hand the token to the module so it can reach the daemon
///
/// Runs regardless of how the daemon launch turns out.
pub fn schedule_connection(module: &dyn TestModule, token: &ConnectionToken) {
    tracing::info!(%token, "Scheduling probe and connection establishment");
    module.schedule_establish_connection(token);
}
