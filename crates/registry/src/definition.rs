//! Definition records and lazy generators.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::element::{Constructor, ElementId};
use crate::error::ResolutionError;
use crate::name::Name;

/// A pinned, boxed future that is required to be Send and 'static.
pub type BoxFutureStatic<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Deferred constructor produced by an asynchronous generator.
pub type DeferredConstructor = BoxFutureStatic<Result<Constructor, ResolutionError>>;

/// What a generator hands back when invoked.
pub enum GeneratorOutput {
	/// Usable immediately; resolution completes in the same call.
	Ready(Constructor),
	/// Must be awaited; resolution completes when the future settles.
	Deferred(DeferredConstructor),
}

impl fmt::Debug for GeneratorOutput {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Ready(_) => f.write_str("Ready(..)"),
			Self::Deferred(_) => f.write_str("Deferred(..)"),
		}
	}
}

/// Produces a constructor on first use. Invoked at most once.
pub struct Generator(Box<dyn FnOnce() -> Result<GeneratorOutput, ResolutionError> + Send>);

impl Generator {
	pub fn new<F>(f: F) -> Self
	where
		F: FnOnce() -> Result<GeneratorOutput, ResolutionError> + Send + 'static,
	{
		Self(Box::new(f))
	}

	/// Generator that returns its constructor synchronously.
	pub fn ready<F>(f: F) -> Self
	where
		F: FnOnce() -> Constructor + Send + 'static,
	{
		Self::new(move || Ok(GeneratorOutput::Ready(f())))
	}

	/// Generator whose constructor arrives through a future.
	pub fn deferred<F, Fut>(f: F) -> Self
	where
		F: FnOnce() -> Fut + Send + 'static,
		Fut: Future<Output = Result<Constructor, ResolutionError>> + Send + 'static,
	{
		Self::new(move || Ok(GeneratorOutput::Deferred(Box::pin(f()))))
	}

	pub(crate) fn invoke(self) -> Result<GeneratorOutput, ResolutionError> {
		(self.0)()
	}
}

impl fmt::Debug for Generator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("Generator(..)")
	}
}

/// Resolution state of a lazy definition.
pub(crate) enum Resolution {
	NotStarted(Generator),
	/// Generator invoked, constructor not yet available. `waiting` holds
	/// elements whose upgrade was requested meanwhile.
	InFlight { waiting: Vec<ElementId> },
	Resolved(Constructor),
	Failed(Arc<ResolutionError>),
}

impl Resolution {
	/// Takes the generator and moves to `InFlight`. `None` unless `NotStarted`.
	pub(crate) fn start(&mut self, waiting: Vec<ElementId>) -> Option<Generator> {
		if !matches!(self, Self::NotStarted(_)) {
			return None;
		}
		match std::mem::replace(self, Self::InFlight { waiting }) {
			Self::NotStarted(generator) => Some(generator),
			_ => None,
		}
	}
}

pub(crate) enum Definition {
	Eager(Constructor),
	Lazy(Resolution),
}

impl Definition {
	/// Constructor, once one is observable.
	pub(crate) fn constructor(&self) -> Option<&Constructor> {
		match self {
			Self::Eager(ctor) | Self::Lazy(Resolution::Resolved(ctor)) => Some(ctor),
			Self::Lazy(_) => None,
		}
	}

	pub(crate) fn record(&self, name: &Name) -> DefinitionRecord {
		let (kind, status) = match self {
			Self::Eager(_) => (DefinitionKind::Eager, DefinitionStatus::Resolved),
			Self::Lazy(res) => (DefinitionKind::Lazy, match res {
				Resolution::NotStarted(_) => DefinitionStatus::NotStarted,
				Resolution::InFlight { .. } => DefinitionStatus::InFlight,
				Resolution::Resolved(_) => DefinitionStatus::Resolved,
				Resolution::Failed(_) => DefinitionStatus::Failed,
			}),
		};
		DefinitionRecord {
			name: name.clone(),
			kind,
			status,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionKind {
	Eager,
	Lazy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionStatus {
	NotStarted,
	InFlight,
	Resolved,
	Failed,
}

/// Snapshot of one definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionRecord {
	pub name: Name,
	pub kind: DefinitionKind,
	pub status: DefinitionStatus,
}
