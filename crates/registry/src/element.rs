//! Contracts between the registry and the element tree it upgrades.
//!
//! The registry never owns elements. It addresses them by [`ElementId`] and
//! asks an [`ElementHost`] for names, document order and connection state.
//! Construction and connection behaviour lives behind [`ElementConstructor`].

use std::fmt;
use std::sync::Arc;

use crate::name::Name;

/// Host-assigned element identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

impl ElementId {
	pub const fn new(raw: u64) -> Self {
		Self(raw)
	}

	pub const fn raw(self) -> u64 {
		self.0
	}
}

impl fmt::Display for ElementId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// Upgrade state of one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ElementState {
	/// Not upgraded yet; a candidate whenever its name gets a constructor.
	#[default]
	Undefined,
	/// Claimed by a constructor.
	Custom,
	/// The construction callback failed. Never retried.
	Failed,
}

/// Error returned by a lifecycle callback.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct CallbackError(pub String);

impl CallbackError {
	pub fn new(msg: impl Into<String>) -> Self {
		Self(msg.into())
	}
}

/// Lifecycle callbacks of a component kind.
pub trait ElementConstructor: Send + Sync + 'static {
	/// Runs once, when the element is upgraded.
	fn construct(&self, element: ElementId) -> Result<(), CallbackError>;

	/// Runs when the element is connected, including right after upgrade.
	fn connected(&self, _element: ElementId) {}

	fn disconnected(&self, _element: ElementId) {}
}

/// Shared handle to a resolved constructor.
///
/// Identity is pointer identity; use [`Arc::ptr_eq`] to compare.
pub type Constructor = Arc<dyn ElementConstructor>;

/// Element tree consumed by the registry.
///
/// Implementations must not call back into the registry while holding their
/// own locks; the registry calls these methods from inside upgrades and
/// definitions.
pub trait ElementHost: Send + Sync + 'static {
	/// Local name of `element`, or `None` if the host does not know it.
	fn local_name(&self, element: ElementId) -> Option<String>;

	/// Elements named `name` still in [`ElementState::Undefined`], in document
	/// order.
	fn pending(&self, name: &Name) -> Vec<ElementId>;

	fn is_connected(&self, element: ElementId) -> bool;

	fn state(&self, element: ElementId) -> Option<ElementState>;

	/// Moves `element` from `Undefined` to `Custom`, recording its constructor.
	///
	/// Returns false if the element was not `Undefined`; the caller must then
	/// leave it alone.
	fn claim(&self, element: ElementId, constructor: &Constructor) -> bool;

	/// Marks a claimed element whose construction callback failed.
	fn mark_failed(&self, element: ElementId);
}
