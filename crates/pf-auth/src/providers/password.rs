//! Email/password login, dispatched against an injected account store and
//! password hasher so callers can swap in a real database and Argon2 in
//! production, or an in-memory store and the identity hasher in tests.

use async_trait::async_trait;
use pf_core::{Error, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::hasher::Hasher;
use crate::identity::Identity;

use super::LoginProvider;

/// The stored account a password login is checked against.
#[derive(Debug, Clone)]
pub struct Account {
	pub id: String,
	pub email: String,
	pub hash: String,
	pub email_verified: bool,
	pub display_name: Option<String>,
}

/// Looks an account up by email. Implementations back this with whatever
/// store the application uses; `pf-auth` has no opinion on persistence.
#[async_trait]
pub trait AccountFinder: Send + Sync {
	async fn find_by_email(&self, email: &str) -> Result<Option<Account>>;
}

#[derive(Deserialize)]
struct PasswordCreds {
	email: String,
	password: String,
}

/// The `password` provider: looks up the account, verifies the submitted
/// password against the stored hash.
pub struct PasswordProvider {
	finder: Box<dyn AccountFinder>,
	hasher: Box<dyn Hasher>,
}

impl PasswordProvider {
	pub fn new(finder: Box<dyn AccountFinder>, hasher: Box<dyn Hasher>) -> Self {
		Self { finder, hasher }
	}
}

#[async_trait]
impl LoginProvider for PasswordProvider {
	fn name(&self) -> &str {
		"password"
	}

	/// Maps both "no such account" and "wrong password" to the same
	/// `Unauthenticated` error, so a failed login never reveals whether the
	/// email address is registered.
	async fn authenticate(&self, creds: &Value) -> Result<Identity> {
		let creds: PasswordCreds =
			serde_json::from_value(creds.clone()).map_err(|e| Error::invalid_argument("malformed password credentials").with_cause(e))?;

		let account = self
			.finder
			.find_by_email(&creds.email)
			.await?
			.ok_or_else(|| Error::unauthenticated("invalid email or password"))?;

		let verified = self.hasher.verify(&creds.password, &account.hash)?;
		if !verified {
			return Err(Error::unauthenticated("invalid email or password"));
		}

		let mut identity = Identity::new("password", account.id, uuid::Uuid::new_v4().to_string())
			.with_email(account.email, account.email_verified);
		if let Some(name) = account.display_name {
			identity = identity.with_display_name(name);
		}
		Ok(identity)
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;

	use parking_lot::RwLock;

	use super::*;
	use crate::hasher::IdentityHasher;

	struct InMemoryFinder {
		accounts: RwLock<HashMap<String, Account>>,
	}

	#[async_trait]
	impl AccountFinder for InMemoryFinder {
		async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
			Ok(self.accounts.read().get(email).cloned())
		}
	}

	fn provider_with_account(email: &str, password: &str) -> PasswordProvider {
		let hasher = IdentityHasher;
		let account = Account {
			id: "1".to_string(),
			email: email.to_string(),
			hash: hasher.hash(password).unwrap(),
			email_verified: true,
			display_name: Some("Logan".to_string()),
		};
		let mut accounts = HashMap::new();
		accounts.insert(email.to_string(), account);
		PasswordProvider::new(Box::new(InMemoryFinder { accounts: RwLock::new(accounts) }), Box::new(hasher))
	}

	#[tokio::test]
	async fn correct_password_authenticates() {
		let provider = provider_with_account("logan@example.com", "password");
		let creds = serde_json::json!({ "email": "logan@example.com", "password": "password" });
		let identity = provider.authenticate(&creds).await.unwrap();
		assert_eq!(identity.subject, "1");
		assert_eq!(identity.provider, "password");
		assert_eq!(identity.email.as_deref(), Some("logan@example.com"));
	}

	#[tokio::test]
	async fn wrong_password_is_unauthenticated() {
		let provider = provider_with_account("logan@example.com", "password");
		let creds = serde_json::json!({ "email": "logan@example.com", "password": "wrong" });
		let err = provider.authenticate(&creds).await.unwrap_err();
		assert!(err.is(pf_core::ErrorKind::Unauthenticated));
	}

	#[tokio::test]
	async fn unknown_account_is_unauthenticated_not_not_found() {
		let provider = provider_with_account("logan@example.com", "password");
		let creds = serde_json::json!({ "email": "nobody@example.com", "password": "password" });
		let err = provider.authenticate(&creds).await.unwrap_err();
		assert!(err.is(pf_core::ErrorKind::Unauthenticated));
	}
}
