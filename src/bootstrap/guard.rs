//! Setup/teardown idempotency guard

use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle of one bootstrap environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SetupState {
    NotStarted = 0,
    InProgress = 1,
    Done = 2,
    TornDown = 3,
}

impl SetupState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => SetupState::NotStarted,
            1 => SetupState::InProgress,
            2 => SetupState::Done,
            _ => SetupState::TornDown,
        }
    }
}

/// Check-and-set state flag shared by every entry point of one environment
///
/// `TornDown` is terminal.
#[derive(Debug)]
pub struct SetupGuard {
    state: AtomicU8,
}

impl Default for SetupGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl SetupGuard {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(SetupState::NotStarted as u8),
        }
    }

    pub fn state(&self) -> SetupState {
        SetupState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn transition(&self, from: SetupState, to: SetupState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// `NotStarted -> InProgress`; false if anyone got here first
    pub fn try_begin(&self) -> bool {
        self.transition(SetupState::NotStarted, SetupState::InProgress)
    }

    /// `InProgress -> Done`
    pub fn complete(&self) {
        if !self.transition(SetupState::InProgress, SetupState::Done) {
            tracing::warn!(state = ?self.state(), "Setup completed from unexpected state");
        }
    }

    /// `InProgress -> NotStarted`, so a later setup may try again
    pub fn abort(&self) {
        if !self.transition(SetupState::InProgress, SetupState::NotStarted) {
            tracing::warn!(state = ?self.state(), "Setup aborted from unexpected state");
        }
    }

    /// `Done -> TornDown`; false unless setup had completed
    pub fn try_teardown(&self) -> bool {
        self.transition(SetupState::Done, SetupState::TornDown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_only_once() {
        let guard = SetupGuard::new();
        assert!(guard.try_begin());
        assert!(!guard.try_begin());
        guard.complete();
        assert!(!guard.try_begin());
        assert_eq!(guard.state(), SetupState::Done);
    }

    #[test]
    fn test_abort_allows_retry() {
        let guard = SetupGuard::new();
        assert!(guard.try_begin());
        guard.abort();
        assert_eq!(guard.state(), SetupState::NotStarted);
        assert!(guard.try_begin());
    }

    #[test]
    fn test_teardown_requires_done() {
        let guard = SetupGuard::new();
        assert!(!guard.try_teardown());

        guard.try_begin();
        assert!(!guard.try_teardown());

        guard.complete();
        assert!(guard.try_teardown());
        assert!(!guard.try_teardown());
    }

    #[test]
    fn test_torn_down_is_terminal() {
        let guard = SetupGuard::new();
        guard.try_begin();
        guard.complete();
        guard.try_teardown();

        assert!(!guard.try_begin());
        assert_eq!(guard.state(), SetupState::TornDown);
    }
}
