//! Optional observability helpers for the guard's protocol stages.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `csrf_guard.stage` with the `stage`
//!   (protocol phase) and `site` (call site) fields.
//! - Enable `metrics` to increment the `csrf_guard_stage_total` counter for every
//!   attempt/success/failure, labeled by `stage` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Protocol stages observed by the guard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GuardStage {
	/// Token acquisition from the CSRF endpoint.
	Fetch,
	/// Ordinary dispatch of an intercepted request.
	Dispatch,
	/// One-shot resubmission after a stale-token rejection.
	Retry,
	/// Session-expiry redirect to the login route. Recorded only when the navigation
	/// is actually performed (attempt + success; the navigator hook is infallible),
	/// never for redirects suppressed at the login route.
	Redirect,
}
impl GuardStage {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			GuardStage::Fetch => "fetch",
			GuardStage::Dispatch => "dispatch",
			GuardStage::Retry => "retry",
			GuardStage::Redirect => "redirect",
		}
	}
}
impl Display for GuardStage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageOutcome {
	/// Entry to a guard stage.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl StageOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			StageOutcome::Attempt => "attempt",
			StageOutcome::Success => "success",
			StageOutcome::Failure => "failure",
		}
	}
}
impl Display for StageOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
