//! Compiler configuration

use anyhow::Context as _;
use ql_binder::BindOptions;
use ql_interpreter::DEFAULT_MAX_CALL_DEPTH;
use ql_lower::LowerOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Options for one [`Compilation`](crate::Compilation)
///
/// Loaded from TOML; missing keys keep their defaults:
///
/// ```toml
/// max_lowering_passes = 64
/// check_all_paths_return = true
/// fold_constants = true
/// max_call_depth = 64
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerOptions {
    /// Upper bound on lowering passes per method
    pub max_lowering_passes: usize,
    /// Report `NotAllPathsReturn` for non-void methods
    pub check_all_paths_return: bool,
    /// Fold literal operations and propagate read-only constants
    pub fold_constants: bool,
    /// Nested user calls allowed before evaluation stops with a runtime error
    pub max_call_depth: usize,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        let lowering = LowerOptions::default();
        Self {
            max_lowering_passes: lowering.max_passes,
            check_all_paths_return: true,
            fold_constants: lowering.fold_constants,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

impl CompilerOptions {
    /// Parses options from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error for malformed TOML, unknown keys or mistyped values.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Reads options from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or does not parse.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("invalid compiler options in {}", path.display()))
    }

    /// Options handed to the lowerer
    pub fn lower_options(&self) -> LowerOptions {
        LowerOptions {
            max_passes: self.max_lowering_passes,
            fold_constants: self.fold_constants,
        }
    }

    /// Options handed to the binder
    pub fn bind_options(&self) -> BindOptions {
        BindOptions {
            check_all_paths_return: self.check_all_paths_return,
            lowering: self.lower_options(),
        }
    }
}
