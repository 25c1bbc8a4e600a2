use std::sync::Arc;

use crate::element::CallbackError;
use crate::name::{Name, NameError};

/// Synchronous registration failures, reported to the immediate caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DefineError {
	#[error("{name:?} is not a valid component name: {reason}")]
	InvalidName { name: String, reason: NameError },
	#[error("define({0:?}) requires a constructor")]
	MissingConstructor(String),
	#[error("define_lazy({0:?}) requires a generator")]
	MissingGenerator(String),
	#[error("a component named {0} has already been defined")]
	Duplicate(Name),
}

/// Failure to turn a lazy generator into a constructor.
///
/// Stored in the definition once it fails; the name never resolves afterwards.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
	#[error("generator failed: {0}")]
	Generator(String),
	#[error("deferred constructor rejected: {0}")]
	Deferred(String),
	#[error("deferred resolution panicked")]
	Panicked,
	#[error("no runtime available for deferred resolution: {0}")]
	Runtime(String),
}

/// Errors surfaced by an upgrade attempt.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UpgradeError {
	#[error("resolving {name} failed: {source}")]
	Resolution {
		name: Name,
		#[source]
		source: Arc<ResolutionError>,
	},
	#[error("constructing {name} failed: {source}")]
	Construct {
		name: Name,
		#[source]
		source: CallbackError,
	},
}

/// Errors observed by a [`crate::WhenDefined`] awaiter.
#[derive(Debug, Clone, thiserror::Error)]
pub enum WhenDefinedError {
	#[error("{name} will never be defined: {source}")]
	ResolutionFailed {
		name: Name,
		#[source]
		source: Arc<ResolutionError>,
	},
	#[error("registry dropped before {0} was defined")]
	RegistryDropped(Name),
}
