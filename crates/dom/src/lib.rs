//! In-memory element tree that hosts a lazydef [`ComponentRegistry`].
//!
//! [`Document`] owns the tree and the registry together and reports every
//! element that is created or connected to the registry, the way a browser's
//! parser and mutation observer would. It exists for the CLI demo and for
//! end-to-end tests of lazy definitions; the registry itself only knows the
//! [`ElementHost`] contract.

mod document;
mod tree;

pub use document::{BODY_NAME, Document};
pub use lazydef_registry::{
	ComponentRegistry, Constructor, ElementConstructor, ElementHost, ElementId, ElementState, Generator,
	RegistryConfig,
};
pub use tree::TreeError;
