//! Identity token mint/verify: a signed, self-describing JWT carrying an
//! [`Identity`], checked against a process-wide signing key and a session
//! blocklist.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use pf_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::blocklist::Blocklist;
use crate::identity::{Delegation, Identity};

/// JWT claims embedding an [`Identity`]. `exp`/`iat` are Unix timestamps,
/// as `jsonwebtoken` expects.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
	sub: String,
	sid: String,
	provider: String,
	iat: i64,
	exp: i64,
	email: Option<String>,
	email_verified: bool,
	display_name: Option<String>,
	#[serde(default)]
	scopes: Vec<String>,
	delegation: Option<Delegation>,
}

impl Claims {
	fn from_identity(identity: &Identity, ttl: Duration) -> Self {
		let now = Utc::now();
		Self {
			sub: identity.subject.clone(),
			sid: identity.session_id.clone(),
			provider: identity.provider.clone(),
			iat: identity.auth_time.timestamp(),
			exp: (now + ttl).timestamp(),
			email: identity.email.clone(),
			email_verified: identity.email_verified,
			display_name: identity.display_name.clone(),
			scopes: identity.scopes.clone(),
			delegation: identity.delegation.clone(),
		}
	}

	fn into_identity(self) -> Identity {
		Identity {
			provider: self.provider,
			subject: self.sub,
			session_id: self.sid,
			auth_time: chrono::DateTime::from_timestamp(self.iat, 0).unwrap_or_else(Utc::now),
			email: self.email,
			email_verified: self.email_verified,
			display_name: self.display_name,
			scopes: self.scopes,
			delegation: self.delegation,
		}
	}
}

/// Mints and verifies identity tokens for one signing key. Holding the
/// blocklist here keeps `verify` a single call for interceptors.
pub struct TokenAuthority {
	encoding_key: EncodingKey,
	decoding_key: DecodingKey,
	validation: Validation,
	blocklist: Blocklist,
}

impl TokenAuthority {
	pub fn new(signing_key: &[u8]) -> Self {
		let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
		validation.validate_exp = true;
		Self {
			encoding_key: EncodingKey::from_secret(signing_key),
			decoding_key: DecodingKey::from_secret(signing_key),
			validation,
			blocklist: Blocklist::new(),
		}
	}

	pub fn blocklist(&self) -> &Blocklist {
		&self.blocklist
	}

	/// Mints a token for `identity`, valid for `ttl`.
	pub fn mint(&self, identity: &Identity, ttl: Duration) -> Result<String> {
		encode(&Header::new(jsonwebtoken::Algorithm::HS256), &Claims::from_identity(identity, ttl), &self.encoding_key)
			.map_err(|e| Error::internal("mint identity token").with_cause(e))
	}

	/// Verifies `token`: checks signature and expiration, then rejects
	/// blocklisted sessions.
	pub fn verify(&self, token: &str) -> Result<Identity> {
		let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
			.map_err(|e| Error::unauthenticated("invalid identity token").with_cause(e))?;
		if self.blocklist.contains(&data.claims.sid) {
			return Err(Error::unauthenticated("session has been revoked"));
		}
		Ok(data.claims.into_identity())
	}

	/// Invalidates `session_id` for the remainder of its token lifetime.
	pub fn revoke(&self, session_id: &str, remaining_lifetime: Duration) {
		self.blocklist.insert(session_id, remaining_lifetime);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample_identity() -> Identity {
		Identity::new("password", "user-1", "session-1").with_email("a@example.com", true)
	}

	#[test]
	fn mint_then_verify_round_trips() {
		let authority = TokenAuthority::new(b"test-signing-key-at-least-32-bytes!");
		let identity = sample_identity();
		let token = authority.mint(&identity, Duration::hours(1)).unwrap();
		let verified = authority.verify(&token).unwrap();
		assert_eq!(verified.subject, identity.subject);
		assert_eq!(verified.session_id, identity.session_id);
		assert_eq!(verified.email.as_deref(), Some("a@example.com"));
	}

	#[test]
	fn verify_rejects_expired_token() {
		let authority = TokenAuthority::new(b"test-signing-key-at-least-32-bytes!");
		let token = authority.mint(&sample_identity(), Duration::seconds(-1)).unwrap();
		let err = authority.verify(&token).unwrap_err();
		assert!(err.is(pf_core::ErrorKind::Unauthenticated));
	}

	#[test]
	fn verify_rejects_revoked_session() {
		let authority = TokenAuthority::new(b"test-signing-key-at-least-32-bytes!");
		let identity = sample_identity();
		let token = authority.mint(&identity, Duration::hours(1)).unwrap();
		authority.revoke(&identity.session_id, Duration::hours(1));
		let err = authority.verify(&token).unwrap_err();
		assert!(err.is(pf_core::ErrorKind::Unauthenticated));
	}

	#[test]
	fn verify_rejects_tampered_signature() {
		let authority = TokenAuthority::new(b"test-signing-key-at-least-32-bytes!");
		let mut token = authority.mint(&sample_identity(), Duration::hours(1)).unwrap();
		token.push('x');
		assert!(authority.verify(&token).is_err());
	}

	#[test]
	fn verify_rejects_a_token_minted_under_a_different_key() {
		let minting_authority = TokenAuthority::new(b"test-signing-key-at-least-32-bytes!");
		let verifying_authority = TokenAuthority::new(b"a-completely-different-key-32-bytes!");
		let token = minting_authority.mint(&sample_identity(), Duration::hours(1)).unwrap();
		let err = verifying_authority.verify(&token).unwrap_err();
		assert!(err.is(pf_core::ErrorKind::Unauthenticated));
	}
}
