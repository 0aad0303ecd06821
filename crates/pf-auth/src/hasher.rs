//! Password hashing, injected into the password provider so tests can
//! swap in a cheap deterministic hasher.

use pf_core::{Error, Result};

/// A pluggable password hashing algorithm.
pub trait Hasher: Send + Sync {
	fn hash(&self, password: &str) -> Result<String>;
	fn verify(&self, password: &str, hash: &str) -> Result<bool>;
}

/// Argon2id, the framework's default — OWASP's current recommendation.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2Hasher;

impl Argon2Hasher {
	pub fn new() -> Self {
		Self
	}
}

impl Hasher for Argon2Hasher {
	fn hash(&self, password: &str) -> Result<String> {
		use argon2::password_hash::{PasswordHasher as _, SaltString, rand_core::OsRng};
		use argon2::Argon2;

		let salt = SaltString::generate(&mut OsRng);
		Argon2::default()
			.hash_password(password.as_bytes(), &salt)
			.map(|hash| hash.to_string())
			.map_err(|e| Error::internal("hash password").with_cause(HashError(e.to_string())))
	}

	fn verify(&self, password: &str, hash: &str) -> Result<bool> {
		use argon2::password_hash::{PasswordHash, PasswordVerifier};
		use argon2::Argon2;

		let parsed = PasswordHash::new(hash)
			.map_err(|e| Error::internal("parse password hash").with_cause(HashError(e.to_string())))?;
		Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
	}
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct HashError(String);

/// A trivial SHA-256 digest hasher. Test-only: fast and deterministic, not
/// suitable for real credentials (no salt, no work factor).
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityHasher;

impl Hasher for IdentityHasher {
	fn hash(&self, password: &str) -> Result<String> {
		use sha2::{Digest, Sha256};
		Ok(hex::encode(Sha256::digest(password.as_bytes())))
	}

	fn verify(&self, password: &str, hash: &str) -> Result<bool> {
		Ok(self.hash(password)? == hash)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn argon2_hash_round_trips() {
		let hasher = Argon2Hasher::new();
		let hash = hasher.hash("correct horse battery staple").unwrap();
		assert!(hasher.verify("correct horse battery staple", &hash).unwrap());
		assert!(!hasher.verify("wrong", &hash).unwrap());
	}

	#[test]
	fn identity_hasher_is_deterministic() {
		let hasher = IdentityHasher;
		let hash = hasher.hash("password123").unwrap();
		assert_eq!(hash, hasher.hash("password123").unwrap());
		assert!(hasher.verify("password123", &hash).unwrap());
	}
}
