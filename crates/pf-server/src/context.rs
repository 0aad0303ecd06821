//! Request-context enrichment: every request gets a derived context
//! carrying a named logger's tracked fields, an identity slot the
//! identity-extraction stage fills in, and a [`RequestConfig`] injector
//! plugins use to place per-request shared state (a work-queue handle,
//! for instance) under well-known keys.

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use pf_auth::Identity;
use serde_json::Value;

/// Per-request shared state plugins inject under well-known string keys.
/// Reads/writes are cheap — a short-lived lock, never held across an
/// `await`.
#[derive(Default, Clone)]
pub struct RequestConfig {
	values: Arc<RwLock<std::collections::HashMap<String, Arc<dyn Any + Send + Sync>>>>,
}

impl RequestConfig {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&self, key: impl Into<String>, value: Arc<dyn Any + Send + Sync>) {
		self.values.write().insert(key.into(), value);
	}

	pub fn get<T: Send + Sync + 'static>(&self, key: &str) -> Option<Arc<T>> {
		let values = self.values.read();
		let value = values.get(key)?;
		value.clone().downcast::<T>().ok()
	}
}

/// Structured fields accumulated across the interceptor chain and flushed
/// into one `tracing` event by the logging stage: a per-request field
/// accumulator renamed by full method name.
#[derive(Default, Clone)]
pub struct TrackedFields {
	fields: Arc<RwLock<BTreeMap<String, Value>>>,
}

impl TrackedFields {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
		self.fields.write().insert(key.into(), value.into());
	}

	pub fn snapshot(&self) -> BTreeMap<String, Value> {
		self.fields.read().clone()
	}
}

/// The derived per-request context threaded through the interceptor chain
/// and into the terminal handler.
#[derive(Clone)]
pub struct RequestContext {
	pub method: String,
	pub fields: TrackedFields,
	pub config: RequestConfig,
	identity: Arc<RwLock<Option<Identity>>>,
}

impl RequestContext {
	pub fn new(method: impl Into<String>) -> Self {
		let method = method.into();
		let fields = TrackedFields::new();
		fields.set("method", method.clone());
		Self { method, fields, config: RequestConfig::new(), identity: Arc::new(RwLock::new(None)) }
	}

	/// Set once the identity-extraction stage resolves an identity.
	/// Absence is not an error — only the authorization stage (or a
	/// handler demanding one) treats a missing identity as a failure.
	pub fn set_identity(&self, identity: Identity) {
		self.fields.set("subject", identity.subject.clone());
		*self.identity.write() = Some(identity);
	}

	pub fn identity(&self) -> Option<Identity> {
		self.identity.read().clone()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn tracked_fields_seed_method_name() {
		let ctx = RequestContext::new("/pf.Documents/View");
		assert_eq!(ctx.fields.snapshot().get("method").unwrap(), "/pf.Documents/View");
	}

	#[test]
	fn setting_identity_records_subject_field() {
		let ctx = RequestContext::new("/pf.Documents/View");
		ctx.set_identity(Identity::new("password", "user-1", "session-1"));
		assert_eq!(ctx.fields.snapshot().get("subject").unwrap(), "user-1");
		assert_eq!(ctx.identity().unwrap().subject, "user-1");
	}

	#[test]
	fn request_config_round_trips_typed_values() {
		struct Handle(u32);
		let config = RequestConfig::new();
		config.insert("queue", Arc::new(Handle(7)));
		assert_eq!(config.get::<Handle>("queue").unwrap().0, 7);
		assert!(config.get::<Handle>("missing").is_none());
	}
}
