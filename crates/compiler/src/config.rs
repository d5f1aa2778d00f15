//! `modelmark.toml` support.
//!
//! ```toml
//! [compiler]
//! dialect = "legacy"
//! infer_foreign_keys = false
//! fail_on_warnings = true
//! ```
//!
//! Every key is optional; a missing `[compiler]` table yields the defaults.

use std::path::Path;

use clap::ValueEnum;
use modelmark_compiler_parser::DialectSelection;
use serde::{Deserialize, Serialize};

use crate::CompilerOptions;

/// Dialect choice as written in configuration files and on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DialectSetting {
    #[default]
    Auto,
    Current,
    Legacy,
}

impl From<DialectSetting> for DialectSelection {
    fn from(setting: DialectSetting) -> Self {
        match setting {
            DialectSetting::Auto => Self::Auto,
            DialectSetting::Current => Self::Current,
            DialectSetting::Legacy => Self::Legacy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerSection {
    pub dialect: DialectSetting,
    pub infer_foreign_keys: bool,
    pub fail_on_warnings: bool,
}

impl Default for CompilerSection {
    fn default() -> Self {
        Self {
            dialect: DialectSetting::Auto,
            infer_foreign_keys: true,
            fail_on_warnings: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerConfig {
    #[serde(default)]
    pub compiler: CompilerSection,
}

impl CompilerConfig {
    /// Load a configuration from a file path
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_file_content(&content)
    }

    pub fn from_file_content(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| {
            tracing::error!("Failed to parse TOML: {}", e);
            e
        })?;
        Ok(config)
    }

    pub fn options(&self) -> CompilerOptions {
        CompilerOptions {
            dialect: self.compiler.dialect.into(),
            infer_foreign_keys: self.compiler.infer_foreign_keys,
            fail_on_warnings: self.compiler.fail_on_warnings,
        }
    }
}
