//! Registry configuration.
//!
//! ```toml
//! flush = "manual"
//!
//! [names]
//! separator = "-"
//! reserved = ["font-face", "missing-glyph"]
//! lowercase = true
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::name::NameRules;

/// Errors that can occur while loading a [`RegistryConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to read {path}: {source}")]
	Read {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("failed to parse registry config: {0}")]
	Parse(#[from] toml::de::Error),
}

/// When definitions upgrade the elements that already exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlushMode {
	/// `define` and `define_lazy` upgrade existing elements before returning.
	#[default]
	Immediate,
	/// Definitions are queued until [`crate::ComponentRegistry::flush`].
	Manual,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
	pub names: NameRules,
	pub flush: FlushMode,
}

impl RegistryConfig {
	pub fn from_toml_str(src: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(src)?)
	}

	/// Reads and parses a TOML config file.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let src = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
			path: path.to_path_buf(),
			source,
		})?;
		Self::from_toml_str(&src)
	}
}

#[cfg(test)]
mod tests {
	use std::io::Write;

	use super::*;

	#[test]
	fn empty_config_uses_defaults() {
		let config = RegistryConfig::from_toml_str("").unwrap();
		assert_eq!(config, RegistryConfig::default());
		assert_eq!(config.flush, FlushMode::Immediate);
		assert!(config.names.reserved.contains("font-face"));
	}

	#[test]
	fn overrides_names_and_flush() {
		let config = RegistryConfig::from_toml_str(
			r#"
flush = "manual"

[names]
separator = ":"
reserved = ["ui:root"]
"#,
		)
		.unwrap();

		assert_eq!(config.flush, FlushMode::Manual);
		assert_eq!(config.names.separator, ':');
		assert_eq!(config.names.reserved.len(), 1);
		assert!(config.names.lowercase);
	}

	#[test]
	fn rejects_unknown_keys() {
		let err = RegistryConfig::from_toml_str("[names]\nseperator = \":\"\n").unwrap_err();
		assert!(matches!(err, ConfigError::Parse(_)));
	}

	#[test]
	fn load_reports_missing_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("missing.toml");
		let err = RegistryConfig::load(&path).unwrap_err();
		assert!(matches!(err, ConfigError::Read { path: p, .. } if p == path));
	}

	#[test]
	fn load_reads_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "flush = \"manual\"").unwrap();
		let config = RegistryConfig::load(file.path()).unwrap();
		assert_eq!(config.flush, FlushMode::Manual);
	}
}
