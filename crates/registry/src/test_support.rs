//! In-memory host and recording constructors for unit tests.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::{CallbackError, Constructor, ElementConstructor, ElementHost, ElementId, ElementState, Name};

struct MockElement {
	id: ElementId,
	name: String,
	connected: bool,
	listed: bool,
	state: ElementState,
}

/// Flat element list; insertion order is document order.
#[derive(Default)]
pub(crate) struct MockHost {
	elements: Mutex<Vec<MockElement>>,
}

impl MockHost {
	pub(crate) fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub(crate) fn add(&self, name: &str, connected: bool) -> ElementId {
		self.push(name, connected, true)
	}

	/// Adds an element that [`ElementHost::pending`] never lists.
	pub(crate) fn add_unlisted(&self, name: &str) -> ElementId {
		self.push(name, false, false)
	}

	fn push(&self, name: &str, connected: bool, listed: bool) -> ElementId {
		let mut elements = self.elements.lock();
		let id = ElementId::new(elements.len() as u64 + 1);
		elements.push(MockElement {
			id,
			name: name.to_owned(),
			connected,
			listed,
			state: ElementState::Undefined,
		});
		id
	}

	pub(crate) fn state_of(&self, id: ElementId) -> ElementState {
		self.state(id).unwrap_or_default()
	}
}

impl ElementHost for MockHost {
	fn local_name(&self, element: ElementId) -> Option<String> {
		let elements = self.elements.lock();
		elements.iter().find(|e| e.id == element).map(|e| e.name.clone())
	}

	fn pending(&self, name: &Name) -> Vec<ElementId> {
		let elements = self.elements.lock();
		elements
			.iter()
			.filter(|e| e.listed && e.name == name.as_str() && e.state == ElementState::Undefined)
			.map(|e| e.id)
			.collect()
	}

	fn is_connected(&self, element: ElementId) -> bool {
		let elements = self.elements.lock();
		elements.iter().any(|e| e.id == element && e.connected)
	}

	fn state(&self, element: ElementId) -> Option<ElementState> {
		let elements = self.elements.lock();
		elements.iter().find(|e| e.id == element).map(|e| e.state)
	}

	fn claim(&self, element: ElementId, _constructor: &Constructor) -> bool {
		let mut elements = self.elements.lock();
		match elements.iter_mut().find(|e| e.id == element) {
			Some(e) if e.state == ElementState::Undefined => {
				e.state = ElementState::Custom;
				true
			}
			_ => false,
		}
	}

	fn mark_failed(&self, element: ElementId) {
		let mut elements = self.elements.lock();
		if let Some(e) = elements.iter_mut().find(|e| e.id == element) {
			e.state = ElementState::Failed;
		}
	}
}

pub(crate) type Log = Arc<Mutex<Vec<String>>>;

/// Constructor that appends `"<tag>:construct:<id>"`-style lines to a log.
pub(crate) struct Recording {
	tag: &'static str,
	log: Log,
	fail: bool,
}

impl Recording {
	pub(crate) fn new(tag: &'static str, log: &Log) -> Constructor {
		Arc::new(Self {
			tag,
			log: log.clone(),
			fail: false,
		})
	}

	pub(crate) fn failing(tag: &'static str, log: &Log) -> Constructor {
		Arc::new(Self {
			tag,
			log: log.clone(),
			fail: true,
		})
	}
}

impl ElementConstructor for Recording {
	fn construct(&self, element: ElementId) -> Result<(), CallbackError> {
		self.log.lock().push(format!("{}:construct:{}", self.tag, element.raw()));
		if self.fail {
			return Err(CallbackError::new("constructor threw"));
		}
		Ok(())
	}

	fn connected(&self, element: ElementId) {
		self.log.lock().push(format!("{}:connected:{}", self.tag, element.raw()));
	}
}

pub(crate) fn log() -> Log {
	Arc::new(Mutex::new(Vec::new()))
}
