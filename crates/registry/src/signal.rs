//! One-shot "name is defined" signals.
//!
//! # Invariants
//!
//! - A signal leaves `Pending` at most once; later `satisfy`/`fail` calls are
//!   ignored.
//! - Receivers subscribed before or after settlement observe the same outcome.

use std::future::IntoFuture;
use std::sync::Arc;

use tokio::sync::watch;

use crate::definition::BoxFutureStatic;
use crate::element::Constructor;
use crate::error::{ResolutionError, WhenDefinedError};
use crate::name::Name;

#[derive(Clone)]
enum SignalState {
	Pending,
	Defined(Constructor),
	Failed(Arc<ResolutionError>),
}

impl SignalState {
	fn is_pending(&self) -> bool {
		matches!(self, Self::Pending)
	}
}

pub(crate) struct DefinedSignal {
	tx: watch::Sender<SignalState>,
}

impl DefinedSignal {
	pub(crate) fn new() -> Self {
		Self {
			tx: watch::Sender::new(SignalState::Pending),
		}
	}

	/// Returns false if the signal had already settled.
	pub(crate) fn satisfy(&self, ctor: &Constructor) -> bool {
		self.settle(SignalState::Defined(ctor.clone()))
	}

	pub(crate) fn fail(&self, err: &Arc<ResolutionError>) -> bool {
		self.settle(SignalState::Failed(err.clone()))
	}

	pub(crate) fn is_settled(&self) -> bool {
		!self.tx.borrow().is_pending()
	}

	pub(crate) fn subscribe(&self, name: Name) -> WhenDefined {
		WhenDefined {
			name,
			rx: self.tx.subscribe(),
		}
	}

	fn settle(&self, next: SignalState) -> bool {
		self.tx.send_if_modified(|state| {
			if !state.is_pending() {
				return false;
			}
			*state = next;
			true
		})
	}
}

/// Future returned by [`crate::ComponentRegistry::when_defined`].
///
/// Resolves with the constructor once the name is defined, or fails if its
/// lazy resolution failed.
pub struct WhenDefined {
	name: Name,
	rx: watch::Receiver<SignalState>,
}

impl WhenDefined {
	pub fn name(&self) -> &Name {
		&self.name
	}

	/// Settled outcome without waiting, or `None` while pending.
	pub fn peek(&self) -> Option<Result<Constructor, WhenDefinedError>> {
		let state = self.rx.borrow().clone();
		Self::outcome(&self.name, state)
	}

	async fn wait(mut self) -> Result<Constructor, WhenDefinedError> {
		let settled = self.rx.wait_for(|state| !state.is_pending()).await.map(|state| state.clone());
		match settled.ok().and_then(|state| Self::outcome(&self.name, state)) {
			Some(outcome) => outcome,
			None => Err(WhenDefinedError::RegistryDropped(self.name)),
		}
	}

	fn outcome(name: &Name, state: SignalState) -> Option<Result<Constructor, WhenDefinedError>> {
		match state {
			SignalState::Pending => None,
			SignalState::Defined(ctor) => Some(Ok(ctor)),
			SignalState::Failed(source) => Some(Err(WhenDefinedError::ResolutionFailed {
				name: name.clone(),
				source,
			})),
		}
	}
}

impl IntoFuture for WhenDefined {
	type Output = Result<Constructor, WhenDefinedError>;
	type IntoFuture = BoxFutureStatic<Self::Output>;

	fn into_future(self) -> Self::IntoFuture {
		Box::pin(self.wait())
	}
}
