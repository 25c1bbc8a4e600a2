//! Component definition registry with lazily resolved constructors.
//!
//! Components are registered under a validated [`Name`] either eagerly, with
//! a ready [`Constructor`], or lazily, with a [`Generator`] that produces the
//! constructor the first time an element of that name needs upgrading. The
//! registry drives elements owned by an [`ElementHost`] through their
//! construction and connected callbacks once a constructor is available, and
//! signals [`ComponentRegistry::when_defined`] awaiters afterwards.
//!
//! # Modules
//!
//! - [`name`] - name validation rules
//! - [`config`] - TOML-loadable registry configuration
//! - [`element`] - host and constructor contracts
//! - [`definition`] - definition records and generators
//! - [`registry`] - the registry handle
//! - [`upgrade`] - upgrade coordination
//! - [`signal`] - one-shot "defined" signals

pub mod config;
pub mod definition;
pub mod element;
mod error;
pub mod name;
pub mod registry;
mod resolver;
pub mod signal;
pub mod upgrade;

pub use config::{ConfigError, FlushMode, RegistryConfig};
pub use definition::{
	BoxFutureStatic, DefinitionKind, DefinitionRecord, DefinitionStatus, DeferredConstructor, Generator,
	GeneratorOutput,
};
pub use element::{CallbackError, Constructor, ElementConstructor, ElementHost, ElementId, ElementState};
pub use error::{DefineError, ResolutionError, UpgradeError, WhenDefinedError};
pub use name::{Name, NameError, NameRules};
pub use registry::ComponentRegistry;
pub use signal::WhenDefined;
pub use upgrade::UpgradeOutcome;

#[cfg(test)]
mod test_support;
