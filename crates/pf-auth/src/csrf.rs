//! HMAC-structured CSRF tokens: `signature_random_data`, double-submitted
//! as a cookie and a query parameter, with a header bypass for clients a
//! browser form cannot forge requests from.

use hmac::{Hmac, Mac};
use pf_core::{Error, Result};
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Header whose presence (set to `"1"`) substitutes for the double-submit
/// check: a cross-site HTML form cannot set custom headers, so this alone
/// is sufficient proof of same-origin intent for non-browser clients.
pub const BYPASS_HEADER: &str = "X-CSRF-Protection";

const RANDOM_BYTES: usize = 16;

fn mac_hex(secret: &[u8], session_id: &str, random_hex: &str) -> Result<String> {
	let mut mac = HmacSha256::new_from_slice(secret).map_err(|e| Error::internal("construct csrf hmac").with_cause(e))?;
	mac.update(session_id.as_bytes());
	mac.update(b":");
	mac.update(random_hex.as_bytes());
	Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Generates a token bound to `session_id`, of the shape
/// `<hex signature>_<hex random>`.
pub fn generate_token(secret: &[u8], session_id: &str) -> Result<String> {
	let mut random_bytes = [0u8; RANDOM_BYTES];
	rand::rng().fill_bytes(&mut random_bytes);
	let random_hex = hex::encode(random_bytes);
	let signature = mac_hex(secret, session_id, &random_hex)?;
	Ok(format!("{signature}_{random_hex}"))
}

/// Verifies `token` was produced by [`generate_token`] for the same
/// `secret` and `session_id`. Fails closed: any malformed input is an
/// invalid token, never a panic.
pub fn verify_token(token: &str, secret: &[u8], session_id: &str) -> bool {
	let Some((signature, random_hex)) = token.split_once('_') else {
		return false;
	};
	let Ok(provided) = hex::decode(signature) else {
		return false;
	};
	let Ok(_) = hex::decode(random_hex) else {
		return false;
	};
	let Ok(expected_hex) = mac_hex(secret, session_id, random_hex) else {
		return false;
	};
	let Ok(expected) = hex::decode(expected_hex) else {
		return false;
	};
	provided.ct_eq(&expected).into()
}

/// Checks CSRF for a state-mutating request: satisfied by either the
/// bypass header or a token that matches both the cookie and the query
/// parameter. On failure, returns a `FailedPrecondition` error per the
/// contract.
pub fn check(
	bypass_header: Option<&str>,
	cookie_token: Option<&str>,
	query_token: Option<&str>,
	secret: &[u8],
	session_id: &str,
) -> Result<()> {
	if bypass_header == Some("1") {
		return Ok(());
	}
	let (Some(cookie_token), Some(query_token)) = (cookie_token, query_token) else {
		return Err(Error::failed_precondition("missing csrf token"));
	};
	if cookie_token != query_token {
		return Err(Error::failed_precondition("csrf token mismatch between cookie and query"));
	}
	if !verify_token(cookie_token, secret, session_id) {
		return Err(Error::failed_precondition("csrf token failed verification"));
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	const SECRET: &[u8] = b"csrf-signing-key-at-least-32-bytes!";

	#[test]
	fn generated_token_verifies() {
		let token = generate_token(SECRET, "session-1").unwrap();
		assert!(verify_token(&token, SECRET, "session-1"));
	}

	#[test]
	fn token_is_bound_to_session() {
		let token = generate_token(SECRET, "session-1").unwrap();
		assert!(!verify_token(&token, SECRET, "session-2"));
	}

	#[test]
	fn token_is_bound_to_secret() {
		let token = generate_token(SECRET, "session-1").unwrap();
		assert!(!verify_token(&token, b"a-different-signing-key-32-bytes", "session-1"));
	}

	#[test]
	fn malformed_tokens_fail_closed() {
		assert!(!verify_token("not-a-valid-token", SECRET, "session-1"));
		assert!(!verify_token("", SECRET, "session-1"));
	}

	#[test]
	fn check_passes_with_bypass_header() {
		check(Some("1"), None, None, SECRET, "session-1").unwrap();
	}

	#[test]
	fn check_fails_precondition_without_any_proof() {
		let err = check(None, None, None, SECRET, "session-1").unwrap_err();
		assert!(err.is(pf_core::ErrorKind::FailedPrecondition));
	}

	#[test]
	fn check_fails_when_cookie_and_query_disagree() {
		let token = generate_token(SECRET, "session-1").unwrap();
		let err = check(None, Some(token.as_str()), Some("different"), SECRET, "session-1").unwrap_err();
		assert!(err.is(pf_core::ErrorKind::FailedPrecondition));
	}

	#[test]
	fn check_passes_with_matching_double_submit() {
		let token = generate_token(SECRET, "session-1").unwrap();
		check(None, Some(token.as_str()), Some(token.as_str()), SECRET, "session-1").unwrap();
	}
}
