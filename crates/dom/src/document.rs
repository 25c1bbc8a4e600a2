//! Document facade: tree mutations wired to registry upgrades.
//!
//! The document plays the role of the mutation observer. Creating an element
//! and connecting a subtree both ask the registry to upgrade the undefined
//! elements involved; connecting and disconnecting already-custom elements
//! runs their lifecycle callbacks directly.
//!
//! Upgrade failures here have no caller that could act on them, so they are
//! reported through `tracing` and the mutation itself still succeeds.

use std::sync::Arc;

use lazydef_registry::{ComponentRegistry, ElementHost, ElementId, ElementState, RegistryConfig};
use tokio::runtime::Handle;
use tracing::{error, trace};

use crate::tree::{Tree, TreeError};

pub const BODY_NAME: &str = "body";

#[derive(Clone)]
pub struct Document {
	tree: Arc<Tree>,
	registry: ComponentRegistry,
	body: ElementId,
}

impl Document {
	pub fn new() -> Self {
		Self::with_config(RegistryConfig::default())
	}

	pub fn with_config(config: RegistryConfig) -> Self {
		let tree = Arc::new(Tree::new());
		let registry = ComponentRegistry::new(tree.clone(), config);
		Self::assemble(tree, registry)
	}

	/// Like [`Self::with_config`], with deferred resolutions running on `handle`.
	pub fn with_runtime(config: RegistryConfig, handle: Handle) -> Self {
		let tree = Arc::new(Tree::new());
		let registry = ComponentRegistry::with_runtime(tree.clone(), config, handle);
		Self::assemble(tree, registry)
	}

	fn assemble(tree: Arc<Tree>, registry: ComponentRegistry) -> Self {
		let body = tree.create(BODY_NAME);
		let doc = Self {
			tree,
			registry,
			body,
		};
		if let Err(err) = doc.tree.append(doc.tree.root(), body) {
			error!(error = %err, "failed to attach body");
		}
		doc
	}

	pub fn registry(&self) -> &ComponentRegistry {
		&self.registry
	}

	pub fn root(&self) -> ElementId {
		self.tree.root()
	}

	pub fn body(&self) -> ElementId {
		self.body
	}

	/// Creates a detached element, upgrading it if `name` has a constructor
	/// or a lazy definition that can produce one.
	pub fn create_element(&self, name: &str) -> ElementId {
		let id = self.tree.create(name);
		trace!(element = %id, name, "document.create_element");
		self.upgrade_reporting(id);
		id
	}

	/// Appends `child` (moving it if already parented) and, if it ends up
	/// connected, upgrades or connects its subtree in tree order.
	pub fn append_child(&self, parent: ElementId, child: ElementId) -> Result<(), TreeError> {
		let was_connected = self.tree.append(parent, child)?;
		if was_connected {
			self.disconnect_subtree(child)?;
		}
		if self.tree.is_connected(child) {
			self.connect_subtree(child)?;
		}
		Ok(())
	}

	/// Detaches `child`, running disconnected callbacks if it was connected.
	pub fn remove_child(&self, parent: ElementId, child: ElementId) -> Result<(), TreeError> {
		if self.tree.remove(parent, child)? {
			self.disconnect_subtree(child)?;
		}
		Ok(())
	}

	/// Upgrades every undefined element in `root`'s subtree, connected or not.
	pub fn upgrade_subtree(&self, root: ElementId) -> Result<(), TreeError> {
		for visit in self.tree.subtree(root)? {
			if visit.state == ElementState::Undefined && visit.id != self.root() {
				self.upgrade_reporting(visit.id);
			}
		}
		Ok(())
	}

	pub fn state(&self, element: ElementId) -> Option<ElementState> {
		self.tree.state(element)
	}

	pub fn is_connected(&self, element: ElementId) -> bool {
		self.tree.is_connected(element)
	}

	pub fn local_name(&self, element: ElementId) -> Option<String> {
		self.tree.local_name(element)
	}

	pub fn children(&self, parent: ElementId) -> Vec<ElementId> {
		self.tree.children(parent)
	}

	pub fn parent(&self, child: ElementId) -> Option<ElementId> {
		self.tree.parent(child)
	}

	/// States are captured before any callback runs, so an element upgraded
	/// by an earlier sibling's resolution is not connected twice.
	fn connect_subtree(&self, root: ElementId) -> Result<(), TreeError> {
		for visit in self.tree.subtree(root)? {
			match (visit.state, visit.constructor) {
				(ElementState::Custom, Some(ctor)) => ctor.connected(visit.id),
				(ElementState::Undefined, _) => {
					self.upgrade_reporting(visit.id);
				}
				_ => {}
			}
		}
		Ok(())
	}

	fn disconnect_subtree(&self, root: ElementId) -> Result<(), TreeError> {
		for visit in self.tree.subtree(root)? {
			if let Some(ctor) = visit.constructor {
				ctor.disconnected(visit.id);
			}
		}
		Ok(())
	}

	fn upgrade_reporting(&self, id: ElementId) {
		match self.registry.upgrade(id) {
			Ok(outcome) => trace!(element = %id, ?outcome, "document.upgrade"),
			Err(err) => error!(element = %id, error = %err, "upgrade failed"),
		}
	}
}

impl Default for Document {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Debug for Document {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Document")
			.field("body", &self.body)
			.field("registry", &self.registry)
			.finish()
	}
}
