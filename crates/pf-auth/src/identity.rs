//! The resolved identity of an authenticated request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata recorded when one identity is acting on behalf of another
/// (support tooling impersonating a user, for example).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegation {
	pub admin_subject: String,
	pub reason: String,
	pub original_subject: String,
}

/// An authenticated principal. Immutable once minted; a refresh mints a
/// new `Identity` rather than mutating this one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
	pub provider: String,
	pub subject: String,
	pub session_id: String,
	pub auth_time: DateTime<Utc>,
	pub email: Option<String>,
	pub email_verified: bool,
	pub display_name: Option<String>,
	pub scopes: Vec<String>,
	pub delegation: Option<Delegation>,
}

impl Identity {
	pub fn new(provider: impl Into<String>, subject: impl Into<String>, session_id: impl Into<String>) -> Self {
		Self {
			provider: provider.into(),
			subject: subject.into(),
			session_id: session_id.into(),
			auth_time: Utc::now(),
			email: None,
			email_verified: false,
			display_name: None,
			scopes: Vec::new(),
			delegation: None,
		}
	}

	pub fn with_email(mut self, email: impl Into<String>, verified: bool) -> Self {
		self.email = Some(email.into());
		self.email_verified = verified;
		self
	}

	pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
		self.display_name = Some(name.into());
		self
	}

	pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
		self.scopes = scopes;
		self
	}

	pub fn with_delegation(mut self, delegation: Delegation) -> Self {
		self.delegation = Some(delegation);
		self
	}
}
