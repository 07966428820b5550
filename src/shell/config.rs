//! Shell configuration

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::accumulator::BalanceMode;
use super::error::Result;

/// Console settings, loadable from a JSON file
///
/// Missing fields take their default values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Prompt shown before each new statement (default: `>`)
    pub input_prompt: String,

    /// Prefix printed before each result (default: `>>`)
    pub output_prompt: String,

    /// Suppress prompts, result prefixes and the banner
    pub quiet: bool,

    /// Character introducing a meta-command (default: `:`)
    pub command_prefix: char,

    /// Delimiter counting used to detect incomplete statements
    pub balance: BalanceMode,

    /// History file for the line-editing console
    pub history_file: Option<PathBuf>,

    /// Use the line-editing console when attached to a terminal
    pub line_editing: bool,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            input_prompt: ">".to_string(),
            output_prompt: ">>".to_string(),
            quiet: false,
            command_prefix: ':',
            balance: BalanceMode::Plain,
            history_file: None,
            line_editing: true,
        }
    }
}

impl ShellConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read(path)?;
        let config = serde_json::from_slice(&data)?;
        Ok(config)
    }

    /// Write configuration as pretty-printed JSON
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Prompt for a new statement, empty when quiet
    pub fn statement_prompt(&self) -> &str {
        if self.quiet { "" } else { &self.input_prompt }
    }

    /// Prefix for printed results, empty when quiet
    pub fn result_prefix(&self) -> &str {
        if self.quiet { "" } else { &self.output_prompt }
    }
}
