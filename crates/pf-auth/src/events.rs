//! Login/logout notifications published to an optional event bus.
//! Providers call [`publish_login`]/[`publish_logout`] after a successful
//! credential check; a bus is genuinely optional context, not a dependency
//! — its absence must never fail the login.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::identity::Identity;

/// Published once an identity has been established by a provider.
#[derive(Debug, Clone)]
pub struct LoginEvent {
	pub identity: Identity,
	pub at: DateTime<Utc>,
}

/// Published once a session has been revoked.
#[derive(Debug, Clone)]
pub struct LogoutEvent {
	pub session_id: String,
	pub subject: String,
	pub at: DateTime<Utc>,
}

/// A sink for auth lifecycle notifications. Left deliberately minimal —
/// servers wire this to whatever pub/sub or metrics system they already
/// have; `pf-auth` only needs somewhere to hand the event off.
pub trait EventBus: Send + Sync {
	fn publish_login(&self, event: LoginEvent);
	fn publish_logout(&self, event: LogoutEvent);
}

/// Publishes a login event if a bus is present; a no-op otherwise.
pub fn publish_login(bus: Option<&Arc<dyn EventBus>>, identity: &Identity) {
	if let Some(bus) = bus {
		bus.publish_login(LoginEvent { identity: identity.clone(), at: Utc::now() });
	}
}

/// Publishes a logout event if a bus is present; a no-op otherwise.
pub fn publish_logout(bus: Option<&Arc<dyn EventBus>>, session_id: &str, subject: &str) {
	if let Some(bus) = bus {
		bus.publish_logout(LogoutEvent { session_id: session_id.to_string(), subject: subject.to_string(), at: Utc::now() });
	}
}
