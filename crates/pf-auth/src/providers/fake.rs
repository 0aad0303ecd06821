//! The test-only `fake` provider: a deterministic identity, overridable by
//! credential keys, with error injection so tests can exercise login
//! failure paths without a real account store.

use async_trait::async_trait;
use pf_core::{Error, Result};
use serde_json::Value;

use crate::identity::Identity;

use super::LoginProvider;

/// A credential-driven validation hook run before a [`FakeProvider`] issues
/// its identity, so tests can reject specific inputs without writing a new
/// provider.
pub trait Validator: Send + Sync {
	fn validate(&self, creds: &Value) -> Result<()>;
}

impl<F: Fn(&Value) -> Result<()> + Send + Sync> Validator for F {
	fn validate(&self, creds: &Value) -> Result<()> {
		self(creds)
	}
}

/// Always succeeds with a default identity, overridable per-call by
/// `creds` keys (`id`, `email`, `name`, `email_verified`), or fails on
/// demand via `error_code`/`error_message` — exercises the same dispatch
/// path a real provider uses without needing an account store.
#[derive(Default)]
pub struct FakeProvider {
	validator: Option<Box<dyn Validator>>,
}

impl FakeProvider {
	pub fn new() -> Self {
		Self { validator: None }
	}

	/// Runs `validator` before issuing an identity; a validator error
	/// short-circuits authentication with that error.
	pub fn with_validator(mut self, validator: impl Validator + 'static) -> Self {
		self.validator = Some(Box::new(validator));
		self
	}
}

fn parse_error_code(code: &str) -> pf_core::ErrorKind {
	use pf_core::ErrorKind::*;
	match code {
		"invalid_argument" => InvalidArgument,
		"unauthenticated" => Unauthenticated,
		"permission_denied" => PermissionDenied,
		"not_found" => NotFound,
		"already_exists" => AlreadyExists,
		"failed_precondition" => FailedPrecondition,
		"resource_exhausted" => ResourceExhausted,
		"unavailable" => Unavailable,
		"deadline_exceeded" => DeadlineExceeded,
		"unimplemented" => Unimplemented,
		_ => Internal,
	}
}

fn build_error(kind: pf_core::ErrorKind, message: String) -> Error {
	use pf_core::ErrorKind::*;
	match kind {
		InvalidArgument => Error::invalid_argument(message),
		Unauthenticated => Error::unauthenticated(message),
		PermissionDenied => Error::permission_denied(message),
		NotFound => Error::not_found(message),
		AlreadyExists => Error::already_exists(message),
		FailedPrecondition => Error::failed_precondition(message),
		ResourceExhausted => Error::resource_exhausted(message),
		Unavailable => Error::unavailable(message),
		DeadlineExceeded => Error::deadline_exceeded(message),
		Unimplemented => Error::unimplemented(message),
		_ => Error::internal(message),
	}
}

#[async_trait]
impl LoginProvider for FakeProvider {
	fn name(&self) -> &str {
		"fake"
	}

	async fn authenticate(&self, creds: &Value) -> Result<Identity> {
		if let Some(validator) = &self.validator {
			validator.validate(creds)?;
		}

		if let Some(code) = creds.get("error_code").and_then(Value::as_str) {
			let message = creds.get("error_message").and_then(Value::as_str).unwrap_or("fake provider error injection");
			return Err(build_error(parse_error_code(code), message.to_string()));
		}

		let id = creds.get("id").and_then(Value::as_str).unwrap_or("fake-user");
		let session_id = uuid::Uuid::new_v4().to_string();
		let mut identity = Identity::new("fake", id, session_id);
		if let Some(email) = creds.get("email").and_then(Value::as_str) {
			let verified = creds.get("email_verified").and_then(Value::as_bool).unwrap_or(true);
			identity = identity.with_email(email, verified);
		}
		if let Some(name) = creds.get("name").and_then(Value::as_str) {
			identity = identity.with_display_name(name);
		}
		Ok(identity)
	}
}
