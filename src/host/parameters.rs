//! System parameters backed by the config file and the environment

use std::collections::HashMap;

use crate::bootstrap::SystemParameterProvider;

/// Prefix of environment variables overriding a parameter
const ENV_PREFIX: &str = "TESTKIT_PARAM_";

/// Parameters from the `[parameters]` config table
///
/// `TESTKIT_PARAM_<KEY>` wins over the table, with the key upper-cased and
/// dots replaced by underscores.
#[derive(Debug, Clone, Default)]
pub struct ConfigParameters {
    values: HashMap<String, String>,
}

impl ConfigParameters {
    pub fn new(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    /// Environment variable consulted for `key`
    pub fn env_var_name(key: &str) -> String {
        format!("{}{}", ENV_PREFIX, key.to_uppercase().replace('.', "_"))
    }
}

impl SystemParameterProvider for ConfigParameters {
    fn get_sync(&self, key: &str, default: &str) -> String {
        if let Ok(value) = std::env::var(Self::env_var_name(key)) {
            return value;
        }
        self.values
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_name() {
        assert_eq!(
            ConfigParameters::env_var_name("persist.ace.testmode.enabled"),
            "TESTKIT_PARAM_PERSIST_ACE_TESTMODE_ENABLED"
        );
    }

    #[test]
    fn test_table_value_and_default() {
        let mut values = HashMap::new();
        values.insert("testkit.unit.present".to_string(), "1".to_string());
        let params = ConfigParameters::new(values);

        assert_eq!(params.get_sync("testkit.unit.present", "0"), "1");
        assert_eq!(params.get_sync("testkit.unit.absent", "0"), "0");
    }
}
