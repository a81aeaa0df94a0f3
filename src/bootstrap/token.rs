//! Connection token derivation

use std::fmt;

use serde::Serialize;

use super::capability::{AppContext, ProcessInfo};

/// Process identity as plain values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessIdentity {
    pub pid: u32,
    pub uid: u32,
}

impl ProcessInfo for ProcessIdentity {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn uid(&self) -> u32 {
        self.uid
    }
}

/// Opaque key correlating one client instance with its daemon session
///
/// Format: `<applicationName>@<pid>@<uid>@<area>`. Never parsed after
/// construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ConnectionToken(String);

impl ConnectionToken {
    pub fn build(context: &AppContext, process: &dyn ProcessInfo) -> Self {
        Self(format!(
            "{}@{}@{}@{}",
            context.application_name,
            process.pid(),
            process.uid(),
            context.area
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(name: &str, area: u32) -> AppContext {
        AppContext {
            application_name: name.to_string(),
            area,
        }
    }

    #[test]
    fn test_token_format() {
        let token = ConnectionToken::build(&app("App", 2), &ProcessIdentity { pid: 1234, uid: 99 });
        assert_eq!(token.as_str(), "App@1234@99@2");
        assert_eq!(token.to_string(), "App@1234@99@2");
    }

    #[test]
    fn test_token_is_deterministic() {
        let process = ProcessIdentity { pid: 7, uid: 8 };
        let a = ConnectionToken::build(&app("App", 1), &process);
        let b = ConnectionToken::build(&app("App", 1), &process);
        assert_eq!(a, b);
    }

    #[test]
    fn test_token_differs_by_pid_and_uid() {
        let ctx = app("App", 1);
        let base = ConnectionToken::build(&ctx, &ProcessIdentity { pid: 7, uid: 8 });
        let other_pid = ConnectionToken::build(&ctx, &ProcessIdentity { pid: 70, uid: 8 });
        let other_uid = ConnectionToken::build(&ctx, &ProcessIdentity { pid: 7, uid: 80 });
        assert_ne!(base, other_pid);
        assert_ne!(base, other_uid);
    }

    #[test]
    fn test_token_serializes_as_string() {
        let token = ConnectionToken::build(&app("A", 0), &ProcessIdentity { pid: 1, uid: 2 });
        assert_eq!(serde_json::to_string(&token).unwrap(), "\"A@1@2@0\"");
    }
}
