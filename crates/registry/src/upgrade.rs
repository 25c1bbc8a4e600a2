//! Upgrade coordination.
//!
//! Every trigger (element creation, insertion into the tree, a definition
//! arriving while matching elements exist) funnels into [`ComponentRegistry::upgrade`]
//! or the per-name scan in `upgrade_existing`. Both route through `drive`,
//! which reads the definition state once and either upgrades, starts the
//! lazy resolution, or parks the element until an in-flight resolution
//! settles.
//!
//! # Invariants
//!
//! - An element is constructed at most once: [`ElementHost::claim`] is the
//!   only way into [`ElementState::Custom`].
//! - After a resolution settles, pending elements upgrade in document order,
//!   followed by parked elements the host did not enumerate.
//! - `when_defined` awaiters are released only after those upgrades ran.
//!
//! [`ElementHost::claim`]: crate::ElementHost::claim

use std::sync::Arc;

use tracing::{debug, error, trace};

use crate::definition::{Definition, Generator, GeneratorOutput, Resolution};
use crate::element::{CallbackError, Constructor, ElementId, ElementState};
use crate::error::{ResolutionError, UpgradeError};
use crate::name::Name;
use crate::registry::{ComponentRegistry, State};

/// Result of one upgrade request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpgradeOutcome {
	/// Constructed now (and connected, if attached).
	Upgraded,
	/// Already upgraded or failed earlier, unknown to the host, or (for
	/// `upgrade_all`) nothing was pending.
	Skipped,
	/// No definition for the element's name.
	Undefined,
	/// Resolution is in flight; the element upgrades once it settles.
	Deferred,
	/// The name's lazy resolution failed; the element stays undefined.
	Unresolvable,
}

enum Step {
	Undefined,
	Ready(Name, Constructor),
	Start(Name, Generator),
	Parked,
	Failed,
}

/// Reads the definition for `local` and advances it if resolution must start.
fn next_step(state: &mut State, local: &str, requester: Option<ElementId>) -> Step {
	let Some(name) = state.definitions.get_key_value(local).map(|(name, _)| name.clone()) else {
		return Step::Undefined;
	};
	match state.definitions.get_mut(&name) {
		None => Step::Undefined,
		Some(Definition::Eager(ctor)) => Step::Ready(name, ctor.clone()),
		Some(Definition::Lazy(res)) => {
			if let Some(generator) = res.start(requester.into_iter().collect()) {
				return Step::Start(name, generator);
			}
			match res {
				Resolution::Resolved(ctor) => Step::Ready(name, ctor.clone()),
				Resolution::Failed(_) => Step::Failed,
				Resolution::InFlight { waiting } => {
					if let Some(id) = requester
						&& !waiting.contains(&id)
					{
						waiting.push(id);
					}
					Step::Parked
				}
				Resolution::NotStarted(_) => Step::Parked,
			}
		}
	}
}

/// What one pass over a name's pending elements did.
#[derive(Debug, Default)]
pub(crate) struct Sweep {
	pub(crate) upgraded: usize,
	pub(crate) requester_failure: Option<CallbackError>,
}

impl Sweep {
	fn outcome(&self) -> UpgradeOutcome {
		if self.upgraded > 0 {
			UpgradeOutcome::Upgraded
		} else {
			UpgradeOutcome::Skipped
		}
	}
}

impl ComponentRegistry {
	/// Upgrades `element` if its name has, or can lazily obtain, a constructor.
	///
	/// Triggers resolution of a `NotStarted` lazy definition. A resolution or
	/// construction failure is returned here; the element stays unupgraded
	/// (or is marked failed, for construction errors).
	pub fn upgrade(&self, element: ElementId) -> Result<UpgradeOutcome, UpgradeError> {
		let host = &self.inner.host;
		let Some(local) = host.local_name(element) else {
			return Ok(UpgradeOutcome::Skipped);
		};
		if host.state(element) != Some(ElementState::Undefined) {
			return Ok(UpgradeOutcome::Skipped);
		}
		self.drive(&local, Some(element))
	}

	/// Upgrades every pending element named `name`, resolving a lazy
	/// definition first if needed.
	pub fn upgrade_all(&self, name: &str) -> Result<UpgradeOutcome, UpgradeError> {
		self.drive(name, None)
	}

	/// Starts resolution for a freshly defined name if matching elements are
	/// already waiting. Failures have no caller to go to and are reported.
	pub(crate) fn upgrade_existing(&self, name: &Name) {
		if self.inner.host.pending(name).is_empty() {
			return;
		}
		if let Err(err) = self.drive(name.as_str(), None) {
			error!(name = %name, error = %err, "upgrade of existing elements failed");
		}
	}

	fn drive(&self, local: &str, requester: Option<ElementId>) -> Result<UpgradeOutcome, UpgradeError> {
		let step = next_step(&mut self.inner.state.lock(), local, requester);

		match step {
			Step::Undefined => Ok(UpgradeOutcome::Undefined),
			Step::Failed => Ok(UpgradeOutcome::Unresolvable),
			Step::Parked => Ok(UpgradeOutcome::Deferred),
			Step::Ready(name, ctor) => match requester {
				Some(id) => match self.upgrade_element(&name, id, &ctor) {
					Ok(true) => Ok(UpgradeOutcome::Upgraded),
					Ok(false) => Ok(UpgradeOutcome::Skipped),
					Err(source) => Err(UpgradeError::Construct { name, source }),
				},
				None => Ok(self.upgrade_pending(&name, &ctor, Vec::new(), None).outcome()),
			},
			Step::Start(name, generator) => self.resolve(name, generator, requester),
		}
	}

	fn resolve(&self, name: Name, generator: Generator, requester: Option<ElementId>) -> Result<UpgradeOutcome, UpgradeError> {
		debug!(name = %name, element = ?requester, "registry.resolve");
		let output = match self.inner.resolver.invoke(generator) {
			Ok(output) => output,
			Err(err) => return Err(self.settle_failed(&name, err)),
		};

		match output {
			GeneratorOutput::Ready(ctor) => {
				let mut sweep = self.settle(&name, ctor, requester);
				if let Some(source) = sweep.requester_failure.take() {
					return Err(UpgradeError::Construct { name, source });
				}
				match requester {
					Some(id) if self.inner.host.state(id) == Some(ElementState::Custom) => Ok(UpgradeOutcome::Upgraded),
					Some(_) => Ok(UpgradeOutcome::Skipped),
					None => Ok(sweep.outcome()),
				}
			}
			GeneratorOutput::Deferred(deferred) => {
				let registry = self.clone();
				let settle_name = name.clone();
				let spawned = self.inner.resolver.spawn(deferred, move |outcome| match outcome {
					Ok(ctor) => {
						registry.settle(&settle_name, ctor, None);
					}
					Err(err) => {
						let err = registry.settle_failed(&settle_name, err);
						error!(name = %settle_name, error = %err, "deferred resolution failed");
					}
				});
				match spawned {
					Ok(()) => Ok(UpgradeOutcome::Deferred),
					Err(err) => Err(self.settle_failed(&name, err)),
				}
			}
		}
	}

	/// Installs a resolved constructor, upgrades everything waiting on it and
	/// releases `when_defined` awaiters.
	fn settle(&self, name: &Name, ctor: Constructor, requester: Option<ElementId>) -> Sweep {
		let parked = {
			let mut state = self.inner.state.lock();
			let Some(Definition::Lazy(res)) = state.definitions.get_mut(name) else {
				return Sweep::default();
			};
			let Resolution::InFlight { waiting } = res else {
				return Sweep::default();
			};
			let parked = std::mem::take(waiting);
			*res = Resolution::Resolved(ctor.clone());
			parked
		};
		debug!(name = %name, parked = parked.len(), "registry.resolved");

		let sweep = self.upgrade_pending(name, &ctor, parked, requester);
		self.satisfy(name, &ctor);
		sweep
	}

	fn settle_failed(&self, name: &Name, err: ResolutionError) -> UpgradeError {
		let err = Arc::new(err);
		{
			let mut state = self.inner.state.lock();
			if let Some(Definition::Lazy(res)) = state.definitions.get_mut(name)
				&& matches!(res, Resolution::InFlight { .. })
			{
				*res = Resolution::Failed(err.clone());
			}
		}
		debug!(name = %name, error = %err, "registry.resolution_failed");
		self.fail(name, &err);
		UpgradeError::Resolution {
			name: name.clone(),
			source: err,
		}
	}

	/// Upgrades the host's pending elements for `name` in document order,
	/// then any `extra` elements the host did not list.
	///
	/// Construction failures are reported, except for `requester`'s, which is
	/// handed back in the [`Sweep`].
	pub(crate) fn upgrade_pending(
		&self,
		name: &Name,
		ctor: &Constructor,
		extra: Vec<ElementId>,
		requester: Option<ElementId>,
	) -> Sweep {
		let mut order = self.inner.host.pending(name);
		for id in extra {
			if !order.contains(&id) {
				order.push(id);
			}
		}

		let mut sweep = Sweep::default();
		for id in order {
			match self.upgrade_element(name, id, ctor) {
				Ok(true) => sweep.upgraded += 1,
				Ok(false) => {}
				Err(err) if Some(id) == requester => sweep.requester_failure = Some(err),
				Err(err) => error!(name = %name, element = %id, error = %err, "construction failed"),
			}
		}
		sweep
	}

	/// Claims and constructs one element. Returns false if it was not
	/// `Undefined`.
	fn upgrade_element(&self, name: &Name, id: ElementId, ctor: &Constructor) -> Result<bool, CallbackError> {
		let host = &self.inner.host;
		if !host.claim(id, ctor) {
			return Ok(false);
		}
		trace!(name = %name, element = %id, "registry.upgrade");
		if let Err(err) = ctor.construct(id) {
			host.mark_failed(id);
			return Err(err);
		}
		if host.is_connected(id) {
			ctor.connected(id);
		}
		Ok(true)
	}
}
