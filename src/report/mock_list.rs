//! Mock list configuration
//!
//! The runner reads `mock/mock-config.json`, mapping a module to the source
//! that replaces it:
//!
//! ```json
//! { "@ohos.router": { "source": "src/mock/router.mock.ets" } }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::common::{Error, Result};

#[derive(Debug, Deserialize)]
struct MockEntry {
    source: Option<serde_json::Value>,
}

/// Parse mock configuration text into module -> source
pub fn parse_mock_list(json: &str) -> Result<BTreeMap<String, String>> {
    let entries: BTreeMap<String, MockEntry> = serde_json::from_str(json)?;
    let mut mocks = BTreeMap::new();
    for (module, entry) in entries {
        let source = match entry.source {
            Some(serde_json::Value::String(s)) => s,
            Some(serde_json::Value::Null) | None => {
                return Err(Error::MockList(format!("entry '{}' has no source", module)));
            }
            Some(other) => other.to_string(),
        };
        mocks.insert(module, source);
    }
    tracing::info!(count = mocks.len(), "Parsed mock list");
    Ok(mocks)
}

/// Read and parse a mock configuration file
pub fn load_mock_list(path: &Path) -> Result<BTreeMap<String, String>> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
    parse_mock_list(&content)
}
