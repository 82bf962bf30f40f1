//! Configuration management for the model engine
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (oas-models.toml)
//! - Environment variables (OAS_MODELS__*)
//!
//! ## Example config file (oas-models.toml):
//! ```toml
//! [generator]
//! sort_params_by_required = true
//! converter_suffix = "Converter"
//!
//! [generator.type_mappings]
//! money = "Money"
//!
//! [generator.naming]
//! model_name_prefix = ""
//! api_suffix = "Handler"
//!
//! [input]
//! skip_prefixes = ["target/", ".git/"]
//!
//! [output]
//! format = "pretty"
//! path = "build/models.json"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::codegen::CodegenConfig;
use crate::graph::LoadConfig;

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Engine settings handed to every run
    #[serde(default)]
    pub generator: CodegenConfig,

    /// Input loading settings
    #[serde(default)]
    pub input: InputConfig,

    /// Report output settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// Input configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    /// Skip schema files under these relative prefixes
    #[serde(default = "default_skip_prefixes")]
    pub skip_prefixes: Vec<String>,

    /// Only load schema files under these relative prefixes
    #[serde(default)]
    pub include_prefixes: Vec<String>,
}

/// Output configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// JSON layout of written reports
    #[serde(default)]
    pub format: OutputFormat,

    /// Where reports are written (stdout when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Output format for JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

fn default_skip_prefixes() -> Vec<String> {
    LoadConfig::default().skip_prefixes
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            skip_prefixes: default_skip_prefixes(),
            include_prefixes: Vec::new(),
        }
    }
}

impl InputConfig {
    pub fn load_config(&self) -> LoadConfig {
        LoadConfig {
            skip_prefixes: self.skip_prefixes.clone(),
            include_prefixes: self.include_prefixes.clone(),
        }
    }
}

impl OutputFormat {
    /// Render a value as JSON in this format
    pub fn render<T: Serialize + ?Sized>(&self, value: &T) -> serde_json::Result<String> {
        match self {
            Self::Pretty => serde_json::to_string_pretty(value),
            Self::Compact => serde_json::to_string(value),
        }
    }
}

impl EngineConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, layering an explicit file over the defaults
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = ["oas-models.toml", ".oas-models.toml", "config/oas-models.toml"];
        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(user_config) = Self::user_config_path() {
            if user_config.exists() {
                builder = builder.add_source(File::from(user_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // OAS_MODELS__GENERATOR__SORT_PARAMS_BY_REQUIRED=false
        builder = builder.add_source(
            Environment::with_prefix("OAS_MODELS")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Per-user config file location
    pub fn user_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("dev", "oas", "oas-models")
            .map(|dirs| dirs.config_dir().join("oas-models.toml"))
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = self
            .to_toml()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}
