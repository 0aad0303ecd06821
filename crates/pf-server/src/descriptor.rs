//! RPC method annotations and per-request message field annotations.
//!
//! An application reads these off protobuf method/field options at the
//! transcoding layer, which this crate treats as an external collaborator
//! whose wire format it has no opinion on. Here they are a small
//! declarative registry an
//! application populates at build time, keyed by the gRPC method's full
//! path (`"/package.Service/Method"`) — the same string tonic routes on.

use std::collections::HashMap;

use pf_authz::Effect;

use crate::interceptor::RequestFields;

/// The descriptor-declared side of an authorization check: which
/// object-fetcher key to use (or [`pf_authz::WILDCARD_KEY`]), which action
/// name, and what to do absent any applicable policy rule.
#[derive(Debug, Clone)]
pub struct MethodDescriptor {
	pub object_key: String,
	pub action: String,
	pub default_effect: Effect,
}

impl MethodDescriptor {
	pub fn new(object_key: impl Into<String>, action: impl Into<String>, default_effect: Effect) -> Self {
		Self { object_key: object_key.into(), action: action.into(), default_effect }
	}

	/// Builds a descriptor from the wire-level `"allow" | "deny"` spelling
	/// of `default_effect`, falling back to `Deny` on anything
	/// unrecognized.
	pub fn from_wire(object_key: impl Into<String>, action: impl Into<String>, default_effect: &str) -> Self {
		Self::new(object_key, action, Effect::parse_default(default_effect))
	}

	/// Whether this RPC has no authorization target at all — object fetch
	/// and role-describer keyed lookup are both skipped.
	pub fn is_object_free(&self) -> bool {
		self.object_key == pf_authz::WILDCARD_KEY
	}
}

/// A registry of [`MethodDescriptor`]s keyed by full gRPC method path, as
/// `pf-server` consults per-request to drive the authorization stage.
#[derive(Default, Clone)]
pub struct DescriptorRegistry {
	descriptors: HashMap<String, MethodDescriptor>,
}

impl DescriptorRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(mut self, method: impl Into<String>, descriptor: MethodDescriptor) -> Self {
		self.descriptors.insert(method.into(), descriptor);
		self
	}

	pub fn get(&self, method: &str) -> Option<&MethodDescriptor> {
		self.descriptors.get(method)
	}
}

/// A request message's declared authorization target: the field naming
/// the object ID (required unless the descriptor's `object_key` is `"*"`)
/// and an optional scope/tenant ID. Request message types implement this
/// to participate in authorization.
pub trait ObjectIdentified {
	fn object_id(&self) -> Option<&str> {
		None
	}

	fn scope_id(&self) -> Option<&str> {
		None
	}
}

impl ObjectIdentified for () {}

/// Extracts `(object_id, scope_id)` off a request message for the
/// authorization stage. A thin adapter so [`crate::interceptor::Chain`]
/// can stay generic over the concrete request type.
pub fn request_fields(message: &impl ObjectIdentified) -> RequestFields {
	RequestFields { object_id: message.object_id().map(str::to_string), scope_id: message.scope_id().map(str::to_string) }
}
