//! Session-expiry hooks: the navigator seam used for 401 redirects.

// self
use crate::_prelude::*;

/// Host-application hook that performs the login redirect on session expiry.
///
/// The guard never resolves a 401 in-process; it reports the current location, lets the
/// client decide whether a redirect is warranted, and performs the navigation as a side
/// effect. The triggering request still fails with the original error. The trait is
/// object-safe so hosts inject it as `Arc<dyn SessionNavigator>`.
pub trait SessionNavigator
where
	Self: Send + Sync,
{
	/// Returns the application's current location path.
	fn current_path(&self) -> String;

	/// Navigates the application to the login route.
	fn redirect(&self, login_path: &str);
}

/// Navigator for headless callers that have no location to redirect.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopNavigator;
impl SessionNavigator for NoopNavigator {
	fn current_path(&self) -> String {
		"/".into()
	}

	fn redirect(&self, _: &str) {}
}

/// Checks whether `current` already sits under the login prefix, on a path-segment
/// boundary, so 401 handling never loops through the login route.
pub(crate) fn under_login_prefix(current: &str, login_path: &str) -> bool {
	let prefix = login_path.trim_end_matches('/');

	current == prefix
		|| current.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('/'))
}
