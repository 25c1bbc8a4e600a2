use std::sync::OnceLock;

use tokio::runtime::{Handle, Runtime};

use crate::error::ResolutionError;

const FALLBACK_THREAD_NAME: &str = "lazydef-resolver";

/// Picks the runtime deferred resolutions run on.
///
/// An explicitly configured handle wins, then the ambient runtime, then a
/// process-wide fallback runtime built on first use.
pub(super) fn runtime_handle(configured: Option<&Handle>) -> Result<Handle, ResolutionError> {
	if let Some(handle) = configured {
		return Ok(handle.clone());
	}
	if let Ok(handle) = Handle::try_current() {
		return Ok(handle);
	}

	static FALLBACK_RT: OnceLock<Result<Runtime, String>> = OnceLock::new();
	let runtime = FALLBACK_RT.get_or_init(|| {
		tokio::runtime::Builder::new_multi_thread()
			.enable_all()
			.worker_threads(1)
			.thread_name(FALLBACK_THREAD_NAME)
			.build()
			.map_err(|err| err.to_string())
	});
	match runtime {
		Ok(runtime) => Ok(runtime.handle().clone()),
		Err(err) => Err(ResolutionError::Runtime(err.clone())),
	}
}
