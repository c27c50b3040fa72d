// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plugin configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{OpenWithError, Result};
use crate::types::LogLevel;

/// Settings the host can tune per application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginConfig {
    /// Log threshold applied at startup and after every session reset.
    pub default_verbosity: i32,
    /// Name the plugin logs under.
    pub plugin_name: String,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            default_verbosity: LogLevel::Info.as_i32(),
            plugin_name: "OpenWithPlugin".into(),
        }
    }
}

impl PluginConfig {
    /// Read a JSON config file. Missing keys take their default value.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)?;
        serde_json::from_str(&data)
            .map_err(|e| OpenWithError::Config(format!("{}: {e}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_plugin_conventions() {
        let config = PluginConfig::default();
        assert_eq!(config.default_verbosity, 10);
        assert_eq!(config.plugin_name, "OpenWithPlugin");
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("openwith.json");
        std::fs::write(&path, r#"{ "default_verbosity": 0 }"#).expect("write");

        let config = PluginConfig::load(&path).expect("load");
        assert_eq!(config.default_verbosity, 0);
        assert_eq!(config.plugin_name, "OpenWithPlugin");
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("openwith.json");
        std::fs::write(&path, "not json").expect("write");

        let err = PluginConfig::load(&path).unwrap_err();
        assert!(matches!(err, OpenWithError::Config(_)));
    }
}
