//! Configuration loading and parsing

use anyhow::{Context, Result};
use plc_log_recorder::{RecorderConfig, RecorderError, SymbolInfo, SymbolResolver, VariableConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: RecorderConfig,
    #[serde(default)]
    pub variables: Vec<VariableEntry>,
}

/// A variable to record, with the type metadata the controller would report for it
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VariableEntry {
    #[serde(flatten)]
    pub variable: VariableConfig,
    pub type_id: String,
    pub type_name: String,
}

impl AppConfig {
    /// Change-detection settings for every configured variable
    pub fn variable_configs(&self) -> Vec<VariableConfig> {
        self.variables.iter().map(|v| v.variable.clone()).collect()
    }

    /// Symbol metadata table built from the configured variables
    pub fn symbol_table(&self) -> SymbolTable {
        SymbolTable {
            symbols: self
                .variables
                .iter()
                .map(|v| {
                    (
                        v.variable.path.to_lowercase(),
                        SymbolInfo::new(v.type_id.clone(), v.type_name.clone()),
                    )
                })
                .collect(),
        }
    }
}

/// Symbol resolver backed by the configuration file
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: HashMap<String, SymbolInfo>,
}

impl SymbolResolver for SymbolTable {
    fn resolve(&self, symbol_path: &str) -> plc_log_recorder::Result<SymbolInfo> {
        self.symbols
            .get(&symbol_path.to_lowercase())
            .cloned()
            .ok_or_else(|| {
                RecorderError::Symbol(
                    symbol_path.to_string(),
                    "no type information configured".to_string(),
                )
            })
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const SAMPLE: &str = r#"
        [logging]
        directory = "/tmp/plc-logs"
        max_lines = 250

        [[variables]]
        path = "MAIN.fTemperature"
        decimals = 2
        threshold = 0.5
        type_id = "ADST_REAL64"
        type_name = "LREAL"

        [[variables]]
        path = "MAIN.bRunning"
        type_id = "ADST_BIT"
        type_name = "BOOL"
    "#;

    #[test]
    fn test_config_deserialization() {
        let config: AppConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.logging.directory, PathBuf::from("/tmp/plc-logs"));
        assert_eq!(config.logging.max_lines, 250);
        assert_eq!(config.variables.len(), 2);

        let temperature = &config.variables[0];
        assert_eq!(temperature.variable.decimals, Some(2));
        assert_eq!(temperature.variable.threshold, Some(0.5));
        assert_eq!(config.variables[1].variable.threshold, None);
    }

    #[test]
    fn test_logging_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [[variables]]
            path = "MAIN.n"
            type_id = "ADST_INT16"
            type_name = "INT"
        "#,
        )
        .unwrap();
        assert_eq!(config.logging, RecorderConfig::default());
    }

    #[test]
    fn test_symbol_table_lookup() {
        let config: AppConfig = toml::from_str(SAMPLE).unwrap();
        let table = config.symbol_table();

        let info = table.resolve("main.ftemperature").unwrap();
        assert_eq!(info, SymbolInfo::new("ADST_REAL64", "LREAL"));
        assert!(table.resolve("MAIN.unknown").is_err());
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
