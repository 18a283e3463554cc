//! Configuration management for callfix
//!
//! callfix stores configuration in ~/.callfix/config.toml

use crate::patcher::PatchRule;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// callfix configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// File to patch when none is given on the command line
    #[serde(default)]
    pub target: TargetConfig,

    /// Matching and insertion rule
    #[serde(default)]
    pub rule: PatchRule,

    /// Preview output settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Debug log settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Number of context lines to show around insertions
    #[serde(default = "default_context_lines")]
    pub context_lines: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            context_lines: default_context_lines(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Write a debug log to ~/.callfix/callfix.log
    #[serde(default)]
    pub debug: bool,
}

fn default_context_lines() -> usize { 2 }

pub const MAX_CONTEXT_LINES: usize = 10;
const MAX_LOOKBACK: usize = 1000;

/// Directory holding the config and log files
pub fn config_dir() -> Result<PathBuf> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;

    Ok(home_dir.join(".callfix"))
}

/// Get the configuration file path
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Get the default configuration file content with comments
fn get_default_config_content() -> &'static str {
    r#"# callfix Configuration File
#
# Values set here can be overridden by command-line flags.

[target]
# File patched when no FILE argument is given (optional)
#path = "/path/to/src/components/ResumeForm.tsx"

[rule]
# Substring that must appear on the line before the matched line
previous_marker = "resumeData,"

# Substring that must appear on the matched line.
# Everything before it on that line is reused as indentation.
current_marker = "apiKey"

# Substring that must appear on the line after the matched line
next_marker = ");"

# Call name that must appear within `lookback` lines above the matched line
anchor = "generateCustomSectionContent"
lookback = 10

# Text inserted as a new line before the matched line
insert_text = "undefined,"

[output]
# Number of context lines to show around insertions (default: 2, max: 10)
context_lines = 2

[logging]
# Write a debug log to ~/.callfix/callfix.log (default: false)
debug = false
"#
}

/// Write the default commented configuration file to `path`
pub fn save_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
    }

    fs::write(path, get_default_config_content())
        .with_context(|| format!("Failed to write default config file: {}", path.display()))?;

    Ok(())
}

/// Load configuration from the default location, creating it if needed
pub fn load_config() -> Result<Config> {
    load_config_from(&config_file_path()?)
}

/// Load configuration from `path`
///
/// A missing file is created from the default template. A malformed file is
/// reported, never replaced.
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        save_default_config(path)?;
    }

    let config_str = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&config_str)
        .with_context(|| format!("Malformed config file: {}", path.display()))?;

    validate_config(&config)
        .with_context(|| format!("Invalid config file: {}", path.display()))?;

    Ok(config)
}

/// Serialize the effective configuration for display
pub fn to_toml(config: &Config) -> Result<String> {
    toml::to_string_pretty(config).context("Failed to serialize config")
}

/// Validate configuration values
pub fn validate_config(config: &Config) -> Result<()> {
    validate_rule(&config.rule)?;

    if config.output.context_lines > MAX_CONTEXT_LINES {
        anyhow::bail!(
            "Invalid context_lines: {} (max {})",
            config.output.context_lines,
            MAX_CONTEXT_LINES
        );
    }

    Ok(())
}

/// Validate a patch rule, whether it came from the config file or from flags
pub fn validate_rule(rule: &PatchRule) -> Result<()> {
    let markers = [
        ("previous_marker", &rule.previous_marker),
        ("current_marker", &rule.current_marker),
        ("next_marker", &rule.next_marker),
        ("anchor", &rule.anchor),
    ];

    for (name, value) in markers {
        if value.is_empty() {
            anyhow::bail!("Invalid {}: must not be empty", name);
        }
    }

    if rule.insert_text.contains(['\n', '\r']) {
        anyhow::bail!("Invalid insert_text: must be a single line");
    }

    if rule.lookback > MAX_LOOKBACK {
        anyhow::bail!("Invalid lookback: {} (max {})", rule.lookback, MAX_LOOKBACK);
    }

    Ok(())
}
