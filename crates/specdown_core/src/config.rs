//! Workspace configuration.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use jsonc_parser::ParseOptions;
use jsonschema::Validator;
use serde::{Deserialize, Serialize};

use crate::CoreError;

// Embed the schema
const SCHEMA_JSON: &str = include_str!("../../../schemas/v1/config.json");
static CONFIG_SCHEMA: OnceLock<Result<Validator, String>> = OnceLock::new();

/// File names looked up, in order, when no config path is given.
pub const CONFIG_FILE_NAMES: &[&str] = &[".specdown.jsonc", ".specdown.json"];

/// Written by `specdown init`.
pub const CONFIG_TEMPLATE: &str = r#"{
  // Glob patterns a document must match. Empty means every markdown file.
  "include": [],
  "exclude": ["**/node_modules/**", "**/target/**"],
  "validation": {
    // Requirements without scenarios are errors when true, warnings otherwise.
    "requireScenarios": true,
    // Treat warnings as failures.
    "strict": false
  },
  "tasks": {
    // Number tasks without an explicit id as <section>.<position>.
    "autoNumber": true
  },
  "maxFileSize": 10485760
}
"#;

/// Configuration for a specdown workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecdownConfig {
    /// File patterns to include.
    #[serde(default)]
    pub include: Vec<String>,

    /// File patterns to exclude.
    #[serde(default)]
    pub exclude: Vec<String>,

    #[serde(default)]
    pub validation: ValidationConfig,

    #[serde(default)]
    pub tasks: TasksConfig,

    /// Largest file, in bytes, that will be read.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Directory containing the configuration file. Relative patterns are
    /// resolved against it.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationConfig {
    #[serde(default = "default_true")]
    pub require_scenarios: bool,
    #[serde(default)]
    pub strict: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            require_scenarios: true,
            strict: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TasksConfig {
    #[serde(default = "default_true")]
    pub auto_number: bool,
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self { auto_number: true }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024
}

impl SpecdownConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self {
            include: Vec::new(),
            exclude: Vec::new(),
            validation: ValidationConfig::default(),
            tasks: TasksConfig::default(),
            max_file_size: default_max_file_size(),
            base_dir: None,
        }
    }

    /// Loads configuration from a file.
    ///
    /// Supports `.specdown.jsonc` and `.specdown.json`; comments and
    /// trailing commas are accepted in both.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| CoreError::config(format!("Failed to read config: {}", e)))?;

        let mut config = Self::from_json(&content)?;
        if let Some(parent) = path.parent() {
            config.base_dir = Some(parent.to_path_buf());
        }

        Ok(config)
    }

    /// Parses configuration from JSONC text with schema validation.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let value = jsonc_parser::parse_to_serde_value(json, &ParseOptions::default())
            .map_err(|e| CoreError::config(format!("Invalid JSON: {}", e)))?
            .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new()));

        let schema = CONFIG_SCHEMA
            .get_or_init(|| {
                let schema_json: serde_json::Value = serde_json::from_str(SCHEMA_JSON)
                    .map_err(|e| format!("Invalid embedded config schema: {}", e))?;
                Validator::new(&schema_json)
                    .map_err(|e| format!("Invalid config schema compilation: {}", e))
            })
            .as_ref()
            .map_err(|e| CoreError::internal(e.clone()))?;

        if let Err(e) = schema.validate(&value) {
            let error_msg = format!("{} at {}", e, e.instance_path());
            return Err(CoreError::config(format!(
                "Config validation failed: {}",
                error_msg
            )));
        }

        serde_json::from_value(value)
            .map_err(|e| CoreError::config(format!("Invalid config: {}", e)))
    }

    /// Finds the first config file in `dir`.
    pub fn find_in(dir: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    /// Loads `explicit` if given, else the config file in `dir`, else the
    /// defaults with `dir` as base directory.
    pub fn load(explicit: Option<&Path>, dir: &Path) -> Result<Self, CoreError> {
        match explicit.map(Path::to_path_buf).or_else(|| Self::find_in(dir)) {
            Some(path) => Self::from_file(path),
            None => Ok(Self {
                base_dir: Some(dir.to_path_buf()),
                ..Self::new()
            }),
        }
    }

    /// Directory that relative patterns are resolved against.
    pub fn base_dir(&self) -> &Path {
        match &self.base_dir {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }
}

impl Default for SpecdownConfig {
    fn default() -> Self {
        Self::new()
    }
}
