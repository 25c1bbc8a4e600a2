//! Arena-backed element tree.
//!
//! Node 0 is the document root and is always connected. Every other node is
//! created detached and connected by parenting it under a connected node.

use lazydef_registry::{Constructor, ElementHost, ElementId, ElementState, Name};
use parking_lot::RwLock;

pub(crate) const ROOT_NAME: &str = "#document";

/// Structural errors from tree mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
	#[error("unknown element {0}")]
	UnknownElement(ElementId),
	#[error("{child} is not a child of {parent}")]
	NotAChild { parent: ElementId, child: ElementId },
	#[error("inserting {child} under {parent} would create a cycle")]
	Cycle { parent: ElementId, child: ElementId },
	#[error("the document root cannot be moved")]
	RootMove,
}

struct Node {
	name: String,
	parent: Option<usize>,
	children: Vec<usize>,
	state: ElementState,
	constructor: Option<Constructor>,
}

/// Snapshot of one node taken during a subtree walk.
pub(crate) struct Visit {
	pub(crate) id: ElementId,
	pub(crate) state: ElementState,
	pub(crate) constructor: Option<Constructor>,
}

pub(crate) struct Tree {
	nodes: RwLock<Vec<Node>>,
}

impl Tree {
	pub(crate) fn new() -> Self {
		Self {
			nodes: RwLock::new(vec![Node {
				name: ROOT_NAME.to_owned(),
				parent: None,
				children: Vec::new(),
				state: ElementState::Undefined,
				constructor: None,
			}]),
		}
	}

	pub(crate) fn root(&self) -> ElementId {
		ElementId::new(0)
	}

	pub(crate) fn create(&self, name: &str) -> ElementId {
		let mut nodes = self.nodes.write();
		nodes.push(Node {
			name: name.to_owned(),
			parent: None,
			children: Vec::new(),
			state: ElementState::Undefined,
			constructor: None,
		});
		ElementId::new((nodes.len() - 1) as u64)
	}

	/// Moves `child` to the end of `parent`'s children.
	///
	/// Returns whether `child` was connected before the move.
	pub(crate) fn append(&self, parent: ElementId, child: ElementId) -> Result<bool, TreeError> {
		let mut nodes = self.nodes.write();
		let p = index(&nodes, parent)?;
		let c = index(&nodes, child)?;
		if c == 0 {
			return Err(TreeError::RootMove);
		}
		if is_inclusive_ancestor(&nodes, c, p) {
			return Err(TreeError::Cycle { parent, child });
		}

		let was_connected = connected(&nodes, c);
		if let Some(old) = nodes[c].parent.take() {
			nodes[old].children.retain(|&n| n != c);
		}
		nodes[c].parent = Some(p);
		nodes[p].children.push(c);
		Ok(was_connected)
	}

	/// Detaches `child` from `parent`. Returns whether it was connected.
	pub(crate) fn remove(&self, parent: ElementId, child: ElementId) -> Result<bool, TreeError> {
		let mut nodes = self.nodes.write();
		let p = index(&nodes, parent)?;
		let c = index(&nodes, child)?;
		if nodes[c].parent != Some(p) {
			return Err(TreeError::NotAChild { parent, child });
		}
		let was_connected = connected(&nodes, c);
		nodes[p].children.retain(|&n| n != c);
		nodes[c].parent = None;
		Ok(was_connected)
	}

	/// `root` and its descendants in tree order.
	pub(crate) fn subtree(&self, root: ElementId) -> Result<Vec<Visit>, TreeError> {
		let nodes = self.nodes.read();
		let start = index(&nodes, root)?;
		Ok(preorder(&nodes, start)
			.into_iter()
			.map(|i| Visit {
				id: ElementId::new(i as u64),
				state: nodes[i].state,
				constructor: nodes[i].constructor.clone(),
			})
			.collect())
	}

	pub(crate) fn children(&self, parent: ElementId) -> Vec<ElementId> {
		let nodes = self.nodes.read();
		index(&nodes, parent)
			.map(|p| nodes[p].children.iter().map(|&i| ElementId::new(i as u64)).collect())
			.unwrap_or_default()
	}

	pub(crate) fn parent(&self, child: ElementId) -> Option<ElementId> {
		let nodes = self.nodes.read();
		let c = index(&nodes, child).ok()?;
		nodes[c].parent.map(|p| ElementId::new(p as u64))
	}
}

impl ElementHost for Tree {
	fn local_name(&self, element: ElementId) -> Option<String> {
		let nodes = self.nodes.read();
		let i = index(&nodes, element).ok().filter(|&i| i != 0)?;
		Some(nodes[i].name.clone())
	}

	/// Connected matches only. Detached elements upgrade when they are
	/// created, connected, or passed to `Document::upgrade_subtree`.
	fn pending(&self, name: &Name) -> Vec<ElementId> {
		let nodes = self.nodes.read();
		preorder(&nodes, 0)
			.into_iter()
			.filter(|&i| nodes[i].name == name.as_str() && nodes[i].state == ElementState::Undefined)
			.map(|i| ElementId::new(i as u64))
			.collect()
	}

	fn is_connected(&self, element: ElementId) -> bool {
		let nodes = self.nodes.read();
		index(&nodes, element).map(|i| connected(&nodes, i)).unwrap_or(false)
	}

	fn state(&self, element: ElementId) -> Option<ElementState> {
		let nodes = self.nodes.read();
		let i = index(&nodes, element).ok().filter(|&i| i != 0)?;
		Some(nodes[i].state)
	}

	fn claim(&self, element: ElementId, constructor: &Constructor) -> bool {
		let mut nodes = self.nodes.write();
		let Ok(i) = index(&nodes, element) else {
			return false;
		};
		let node = &mut nodes[i];
		if i == 0 || node.state != ElementState::Undefined {
			return false;
		}
		node.state = ElementState::Custom;
		node.constructor = Some(constructor.clone());
		true
	}

	fn mark_failed(&self, element: ElementId) {
		let mut nodes = self.nodes.write();
		if let Ok(i) = index(&nodes, element) {
			nodes[i].state = ElementState::Failed;
			nodes[i].constructor = None;
		}
	}
}

fn index(nodes: &[Node], id: ElementId) -> Result<usize, TreeError> {
	usize::try_from(id.raw())
		.ok()
		.filter(|&i| i < nodes.len())
		.ok_or(TreeError::UnknownElement(id))
}

fn connected(nodes: &[Node], mut i: usize) -> bool {
	loop {
		if i == 0 {
			return true;
		}
		match nodes[i].parent {
			Some(p) => i = p,
			None => return false,
		}
	}
}

/// True if `ancestor` is `node` or one of its ancestors.
fn is_inclusive_ancestor(nodes: &[Node], ancestor: usize, mut node: usize) -> bool {
	loop {
		if node == ancestor {
			return true;
		}
		match nodes[node].parent {
			Some(p) => node = p,
			None => return false,
		}
	}
}

fn preorder(nodes: &[Node], start: usize) -> Vec<usize> {
	let mut out = Vec::new();
	let mut stack = vec![start];
	while let Some(i) = stack.pop() {
		out.push(i);
		stack.extend(nodes[i].children.iter().rev());
	}
	out
}
