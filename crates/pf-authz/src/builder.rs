//! A fluent builder that accumulates policies, role hierarchies,
//! object-fetchers, and role-describers, then produces a [`pf_plugins`]
//! plugin wrapping the built [`AuthorizationEngine`].

use std::collections::HashMap;
use std::sync::Arc;

use crate::effect::Effect;
use crate::engine::{AuthorizationEngine, ObjectFetcher, RoleDescriber};
use crate::plugin::AuthzPlugin;
use crate::policy::{PolicyRule, RoleHierarchy};

#[derive(Default)]
pub struct AuthorizationEngineBuilder {
	policies: Vec<PolicyRule>,
	fetchers: HashMap<String, Arc<dyn ObjectFetcher>>,
	describers: HashMap<String, Arc<dyn RoleDescriber>>,
	hierarchy: RoleHierarchy,
}

impl AuthorizationEngineBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn policy(mut self, effect: Effect, role: impl Into<String>, action: impl Into<String>) -> Self {
		self.policies.push(PolicyRule { effect, role: role.into(), action: action.into() });
		self
	}

	pub fn allow(self, role: impl Into<String>, action: impl Into<String>) -> Self {
		self.policy(Effect::Allow, role, action)
	}

	pub fn deny(self, role: impl Into<String>, action: impl Into<String>) -> Self {
		self.policy(Effect::Deny, role, action)
	}

	pub fn object_fetcher(mut self, key: impl Into<String>, fetcher: Arc<dyn ObjectFetcher>) -> Self {
		self.fetchers.insert(key.into(), fetcher);
		self
	}

	pub fn role_describer(mut self, key: impl Into<String>, describer: Arc<dyn RoleDescriber>) -> Self {
		self.describers.insert(key.into(), describer);
		self
	}

	/// Declares that holding `parent` also grants `child`, transitively.
	pub fn role_hierarchy(mut self, parent: impl Into<String>, child: impl Into<String>) -> Self {
		self.hierarchy.include(parent, child);
		self
	}

	pub fn build(self) -> Arc<AuthorizationEngine> {
		Arc::new(AuthorizationEngine::new(self.policies, self.fetchers, self.describers, self.hierarchy))
	}

	/// Builds the engine and wraps it as a registrable [`AuthzPlugin`].
	pub fn build_plugin(self) -> Arc<AuthzPlugin> {
		Arc::new(AuthzPlugin::new(self.build()))
	}
}
