//! Name → definition registry.
//!
//! # Role
//!
//! [`ComponentRegistry`] is the single source of truth for which names are
//! known and which are resolved. It validates and stores definitions, hands
//! out constructors only once they are observable, and owns the per-name
//! [`DefinedSignal`]s behind [`ComponentRegistry::when_defined`].
//!
//! # Invariants
//!
//! - Entries are never removed or replaced; a second definition under an
//!   existing name fails regardless of the first one's state.
//! - `get` never exposes a lazy definition before it reaches `Resolved`.
//! - The state lock is never held while calling a generator, a lifecycle
//!   callback, or the element host.

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap as HashMap;
use tokio::runtime::Handle;
use tracing::{debug, trace};

use crate::config::{FlushMode, RegistryConfig};
use crate::definition::{Definition, DefinitionRecord, Generator, Resolution};
use crate::element::{Constructor, ElementHost};
use crate::error::{DefineError, ResolutionError};
use crate::name::{Name, NameRules};
use crate::resolver::DeferredResolver;
use crate::signal::{DefinedSignal, WhenDefined};

/// Cheaply cloneable handle to a component registry.
#[derive(Clone)]
pub struct ComponentRegistry {
	pub(crate) inner: Arc<Inner>,
}

pub(crate) struct Inner {
	pub(crate) config: RegistryConfig,
	pub(crate) host: Arc<dyn ElementHost>,
	pub(crate) resolver: DeferredResolver,
	pub(crate) state: Mutex<State>,
}

#[derive(Default)]
pub(crate) struct State {
	pub(crate) definitions: HashMap<Name, Definition>,
	pub(crate) signals: HashMap<Name, DefinedSignal>,
	/// Names defined under [`FlushMode::Manual`] awaiting [`ComponentRegistry::flush`].
	pub(crate) unflushed: Vec<Name>,
}

impl ComponentRegistry {
	pub fn new(host: Arc<dyn ElementHost>, config: RegistryConfig) -> Self {
		Self::build(host, config, None)
	}

	/// Like [`Self::new`], but runs deferred resolutions on `handle`.
	pub fn with_runtime(host: Arc<dyn ElementHost>, config: RegistryConfig, handle: Handle) -> Self {
		Self::build(host, config, Some(handle))
	}

	fn build(host: Arc<dyn ElementHost>, config: RegistryConfig, handle: Option<Handle>) -> Self {
		Self {
			inner: Arc::new(Inner {
				config,
				host,
				resolver: DeferredResolver::new(handle),
				state: Mutex::new(State::default()),
			}),
		}
	}

	pub fn config(&self) -> &RegistryConfig {
		&self.inner.config
	}

	pub fn rules(&self) -> &NameRules {
		&self.inner.config.names
	}

	/// Registers a ready constructor under `name`.
	///
	/// Existing elements named `name` are upgraded in document order before
	/// this returns (unless flushing is manual).
	pub fn define(&self, name: &str, constructor: impl Into<Option<Constructor>>) -> Result<(), DefineError> {
		let Some(ctor) = constructor.into() else {
			return Err(DefineError::MissingConstructor(name.to_owned()));
		};
		let name = self.validate(name)?;
		if !self.insert(&name, Definition::Eager(ctor.clone()))? {
			return Ok(());
		}

		self.upgrade_pending(&name, &ctor, Vec::new(), None);
		self.satisfy(&name, &ctor);
		Ok(())
	}

	/// Registers `generator` to produce the constructor for `name` on first use.
	///
	/// If elements named `name` already exist, resolution starts immediately:
	/// a generator with ready output upgrades them before this returns, a
	/// deferred one upgrades them once its future settles. Resolution
	/// failures do not fail the registration; they are reported and the name
	/// stays unresolved.
	pub fn define_lazy(&self, name: &str, generator: impl Into<Option<Generator>>) -> Result<(), DefineError> {
		let Some(generator) = generator.into() else {
			return Err(DefineError::MissingGenerator(name.to_owned()));
		};
		let name = self.validate(name)?;
		if !self.insert(&name, Definition::Lazy(Resolution::NotStarted(generator)))? {
			return Ok(());
		}

		self.upgrade_existing(&name);
		Ok(())
	}

	/// Resolved constructor for `name`, if any.
	pub fn get(&self, name: &str) -> Option<Constructor> {
		let state = self.inner.state.lock();
		state.definitions.get(name).and_then(Definition::constructor).cloned()
	}

	pub fn is_defined(&self, name: &str) -> bool {
		self.get(name).is_some()
	}

	/// Waits for `name` to be defined.
	///
	/// `name` must be valid but need not be registered yet. The returned
	/// future fails if the name's lazy resolution failed.
	pub fn when_defined(&self, name: &str) -> Result<WhenDefined, DefineError> {
		let name = self.validate(name)?;
		let mut state = self.inner.state.lock();
		let signal = state.signals.entry(name.clone()).or_insert_with(DefinedSignal::new);
		trace!(name = %name, settled = signal.is_settled(), "registry.when_defined");
		Ok(signal.subscribe(name))
	}

	/// Upgrades elements for names defined since the last flush.
	///
	/// No-op under [`FlushMode::Immediate`].
	pub fn flush(&self) {
		let names = std::mem::take(&mut self.inner.state.lock().unflushed);
		for name in names {
			debug!(name = %name, "registry.flush");
			let eager = {
				let state = self.inner.state.lock();
				match state.definitions.get(&name) {
					Some(Definition::Eager(ctor)) => Some(ctor.clone()),
					_ => None,
				}
			};
			match eager {
				Some(ctor) => {
					self.upgrade_pending(&name, &ctor, Vec::new(), None);
					self.satisfy(&name, &ctor);
				}
				None => self.upgrade_existing(&name),
			}
		}
	}

	/// Definitions sorted by name.
	pub fn snapshot(&self) -> Vec<DefinitionRecord> {
		let state = self.inner.state.lock();
		let mut records: Vec<_> = state
			.definitions
			.iter()
			.map(|(name, def)| def.record(name))
			.collect();
		records.sort_by(|a, b| a.name.cmp(&b.name));
		records
	}

	fn validate(&self, name: &str) -> Result<Name, DefineError> {
		self.rules().validate(name).map_err(|reason| DefineError::InvalidName {
			name: name.to_owned(),
			reason,
		})
	}

	/// Stores a new definition. Returns false if its upgrades must wait for
	/// [`Self::flush`].
	fn insert(&self, name: &Name, def: Definition) -> Result<bool, DefineError> {
		let mut state = self.inner.state.lock();
		if state.definitions.contains_key(name) {
			return Err(DefineError::Duplicate(name.clone()));
		}
		let kind = def.record(name).kind;
		state.definitions.insert(name.clone(), def);
		debug!(name = %name, ?kind, "registry.define");

		if self.inner.config.flush == FlushMode::Manual {
			state.unflushed.push(name.clone());
			return Ok(false);
		}
		Ok(true)
	}

	pub(crate) fn satisfy(&self, name: &Name, ctor: &Constructor) {
		let mut state = self.inner.state.lock();
		let signal = state.signals.entry(name.clone()).or_insert_with(DefinedSignal::new);
		if signal.satisfy(ctor) {
			debug!(name = %name, "registry.defined");
		}
	}

	pub(crate) fn fail(&self, name: &Name, err: &Arc<ResolutionError>) {
		let mut state = self.inner.state.lock();
		let signal = state.signals.entry(name.clone()).or_insert_with(DefinedSignal::new);
		signal.fail(err);
	}
}

impl std::fmt::Debug for ComponentRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ComponentRegistry")
			.field("config", &self.inner.config)
			.field("definitions", &self.snapshot())
			.finish()
	}
}
