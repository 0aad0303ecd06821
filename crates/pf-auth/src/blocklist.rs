//! In-memory session blocklist. Logout inserts a session ID with a TTL
//! equal to the token's remaining lifetime; `contains` is consulted on
//! every verify.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;

/// Revoked session IDs, each expiring once its token would have expired
/// anyway — past that point the signature check alone rejects it, so the
/// blocklist entry can be forgotten.
pub struct Blocklist {
	entries: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl Default for Blocklist {
	fn default() -> Self {
		Self::new()
	}
}

impl Blocklist {
	pub fn new() -> Self {
		Self { entries: RwLock::new(HashMap::new()) }
	}

	pub fn insert(&self, session_id: &str, ttl: Duration) {
		let expires_at = Utc::now() + ttl;
		self.entries.write().insert(session_id.to_string(), expires_at);
	}

	/// Whether `session_id` is currently revoked. Lazily evicts the entry
	/// if it has outlived its TTL, rather than running a background sweep.
	pub fn contains(&self, session_id: &str) -> bool {
		let expired = {
			let entries = self.entries.read();
			match entries.get(session_id) {
				Some(expires_at) => *expires_at <= Utc::now(),
				None => return false,
			}
		};
		if expired {
			self.entries.write().remove(session_id);
			false
		} else {
			true
		}
	}

	pub fn len(&self) -> usize {
		self.entries.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn revoked_session_is_blocked_until_ttl_elapses() {
		let blocklist = Blocklist::new();
		assert!(!blocklist.contains("s1"));
		blocklist.insert("s1", Duration::hours(1));
		assert!(blocklist.contains("s1"));
	}

	#[test]
	fn already_expired_entry_is_evicted_on_lookup() {
		let blocklist = Blocklist::new();
		blocklist.insert("s1", Duration::seconds(-1));
		assert!(!blocklist.contains("s1"));
		assert!(blocklist.is_empty());
	}
}
