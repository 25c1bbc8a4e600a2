//! Turns lazy generators into constructors.
//!
//! # Role
//!
//! The resolver owns the mechanics of running a generator: invoking it,
//! and, for deferred output, driving the returned future on a tokio runtime
//! until it settles. It never touches registry state; the registry moves a
//! definition to `InFlight` before calling in and receives the outcome
//! through a settle callback.

use std::panic::{self, AssertUnwindSafe};

use tokio::runtime::Handle;
use tracing::trace;

use crate::definition::{DeferredConstructor, Generator, GeneratorOutput};
use crate::element::Constructor;
use crate::error::ResolutionError;

mod spawn;

pub(crate) struct DeferredResolver {
	handle: Option<Handle>,
}

impl DeferredResolver {
	pub(crate) fn new(handle: Option<Handle>) -> Self {
		Self { handle }
	}

	/// Invokes `generator`. Must be called without registry locks held.
	///
	/// A panicking generator is reported as [`ResolutionError::Panicked`] so
	/// its definition fails instead of staying in flight.
	pub(crate) fn invoke(&self, generator: Generator) -> Result<GeneratorOutput, ResolutionError> {
		let output = panic::catch_unwind(AssertUnwindSafe(|| generator.invoke()))
			.unwrap_or(Err(ResolutionError::Panicked));
		trace!(?output, "resolver.invoke");
		output
	}

	/// Drives `deferred` to completion, then hands the outcome to `on_settle`.
	///
	/// Panics and runtime shutdown inside the deferred future are reported as
	/// [`ResolutionError::Panicked`] and [`ResolutionError::Runtime`].
	/// Fails without calling `on_settle` if no runtime can be obtained.
	pub(crate) fn spawn<F>(&self, deferred: DeferredConstructor, on_settle: F) -> Result<(), ResolutionError>
	where
		F: FnOnce(Result<Constructor, ResolutionError>) + Send + 'static,
	{
		let handle = spawn::runtime_handle(self.handle.as_ref())?;
		let task = handle.spawn(deferred);
		handle.spawn(async move {
			let outcome = match task.await {
				Ok(outcome) => outcome,
				Err(err) if err.is_panic() => Err(ResolutionError::Panicked),
				Err(err) => Err(ResolutionError::Runtime(err.to_string())),
			};
			on_settle(outcome);
		});
		Ok(())
	}
}
