//! Component name validation.
//!
//! A [`Name`] can only be obtained through [`NameRules::validate`], so every
//! name stored in the registry or used to key a defined signal has already
//! passed the separator, reserved-word and character rules. Names are never
//! normalized: `x-case` and `X-CASE` are different inputs, and the default
//! rules reject the latter outright.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use serde::Deserialize;

/// Names that collide with built-in element semantics.
pub const DEFAULT_RESERVED: &[&str] = &[
	"annotation-xml",
	"color-profile",
	"font-face",
	"font-face-src",
	"font-face-uri",
	"font-face-format",
	"font-face-name",
	"missing-glyph",
];

/// Separator that distinguishes component names from built-in element names.
pub const DEFAULT_SEPARATOR: char = '-';

/// Reason a candidate name was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
	#[error("name is empty")]
	Empty,
	#[error("name must contain the separator {0:?}")]
	MissingSeparator(char),
	#[error("name is reserved")]
	Reserved,
	#[error("name must not contain uppercase ASCII letters")]
	Uppercase,
	#[error("name must start with a letter")]
	InvalidStart,
	#[error("name contains invalid character {0:?}")]
	InvalidChar(char),
}

/// Validated component name.
///
/// Cheap to clone; comparison and hashing are exact on the original string.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(Arc<str>);

impl Name {
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Debug for Name {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(&*self.0, f)
	}
}

impl fmt::Display for Name {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl Borrow<str> for Name {
	fn borrow(&self) -> &str {
		&self.0
	}
}

impl AsRef<str> for Name {
	fn as_ref(&self) -> &str {
		&self.0
	}
}

/// Platform-defined naming rules.
///
/// Deserializable so hosts can swap the separator or reserved set from
/// configuration; see [`crate::RegistryConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NameRules {
	/// Character every component name must contain.
	pub separator: char,
	/// Exact names that can never be defined.
	pub reserved: FxHashSet<String>,
	/// Require a lowercase ASCII first letter and reject uppercase ASCII.
	pub lowercase: bool,
}

impl Default for NameRules {
	fn default() -> Self {
		Self {
			separator: DEFAULT_SEPARATOR,
			reserved: DEFAULT_RESERVED.iter().map(|s| (*s).to_owned()).collect(),
			lowercase: true,
		}
	}
}

impl NameRules {
	/// Validates `candidate`, returning it unchanged as a [`Name`].
	pub fn validate(&self, candidate: &str) -> Result<Name, NameError> {
		let Some(first) = candidate.chars().next() else {
			return Err(NameError::Empty);
		};
		if !candidate.contains(self.separator) {
			return Err(NameError::MissingSeparator(self.separator));
		}
		if self.reserved.contains(candidate) {
			return Err(NameError::Reserved);
		}
		if self.lowercase && candidate.chars().any(|c| c.is_ascii_uppercase()) {
			return Err(NameError::Uppercase);
		}
		if !first.is_ascii_alphabetic() {
			return Err(NameError::InvalidStart);
		}
		if let Some(bad) = candidate.chars().find(|&c| !self.is_name_char(c)) {
			return Err(NameError::InvalidChar(bad));
		}
		Ok(Name(Arc::from(candidate)))
	}

	/// Returns true if `candidate` passes [`Self::validate`].
	pub fn is_valid(&self, candidate: &str) -> bool {
		self.validate(candidate).is_ok()
	}

	fn is_name_char(&self, c: char) -> bool {
		if c == self.separator {
			return true;
		}
		if !c.is_ascii() {
			return !c.is_whitespace() && !c.is_control();
		}
		c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_')
	}
}
