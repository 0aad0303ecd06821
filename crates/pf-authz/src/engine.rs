//! Object-fetchers, role-describers, and the per-RPC evaluator.
//! Fetchers and role-describers share one key namespace here: the
//! descriptor's `object_key` both selects the fetcher and, doubling as the
//! "object type name" the source keys role-describers by, selects the
//! describer — Rust's type erasure makes deriving a separate runtime type
//! name from the fetched object unreliable, and the descriptor already
//! names the object unambiguously, so collapsing the two namespaces loses
//! nothing (see DESIGN.md).

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use pf_auth::Identity;
use pf_core::{Error, Result};

use crate::effect::{Effect, combine};
use crate::policy::{PolicyRule, RoleHierarchy};

/// Materializes an authorization target from its identifier. Registered
/// under an `object_key` named by RPC method descriptors.
#[async_trait]
pub trait ObjectFetcher: Send + Sync {
	async fn fetch(&self, object_id: &str) -> Result<Arc<dyn Any + Send + Sync>>;
}

/// Enumerates the roles an identity holds relative to a specific object
/// and scope. `identity` is `None` for anonymous requests; `object` is
/// `None` when the descriptor's `object_key` is `"*"` (object-free check).
#[async_trait]
pub trait RoleDescriber: Send + Sync {
	async fn describe(
		&self,
		identity: Option<&Identity>,
		object: Option<&(dyn Any + Send + Sync)>,
		scope: Option<&str>,
	) -> Result<HashSet<String>>;
}

/// Marker object-key meaning "this RPC has no authorization target".
pub const WILDCARD_KEY: &str = "*";

/// The per-RPC inputs the evaluator needs: the descriptor-declared side
/// (`action`, `object_key`, `default_effect`) and the request-declared
/// side (`object_id`, `scope_id`), plus the identity resolved from
/// context.
pub struct EvaluationRequest<'a> {
	pub action: &'a str,
	pub object_key: &'a str,
	pub default_effect: Effect,
	pub object_id: Option<&'a str>,
	pub scope_id: Option<&'a str>,
	pub identity: Option<&'a Identity>,
}

/// The immutable, built authorization engine: a policy multiset plus the
/// object-fetchers and role-describers the descriptors on an RPC surface
/// reference by key.
pub struct AuthorizationEngine {
	policies: Vec<PolicyRule>,
	fetchers: HashMap<String, Arc<dyn ObjectFetcher>>,
	describers: HashMap<String, Arc<dyn RoleDescriber>>,
	hierarchy: RoleHierarchy,
}

impl AuthorizationEngine {
	pub(crate) fn new(
		policies: Vec<PolicyRule>,
		fetchers: HashMap<String, Arc<dyn ObjectFetcher>>,
		describers: HashMap<String, Arc<dyn RoleDescriber>>,
		hierarchy: RoleHierarchy,
	) -> Self {
		Self { policies, fetchers, describers, hierarchy }
	}

	/// Number of accumulated policy rules; mainly useful for tests.
	pub fn policy_count(&self) -> usize {
		self.policies.len()
	}

	/// Runs the full evaluation contract. `Ok(())` means the request is
	/// allowed to proceed to the handler; `Err` carries the appropriate
	/// status-kind error.
	pub async fn evaluate(&self, req: EvaluationRequest<'_>) -> Result<()> {
		tracing::debug!(action = req.action, object_key = req.object_key, "authorization evaluate starting");
		if req.object_key != WILDCARD_KEY && req.object_id.is_none() {
			return Err(Error::internal(format!(
				"authz descriptor for action '{}' names object_key '{}' but the request carries no object_id",
				req.action, req.object_key
			)));
		}

		let object: Option<Arc<dyn Any + Send + Sync>> = if req.object_key == WILDCARD_KEY {
			None
		} else {
			let fetcher = self.fetchers.get(req.object_key).ok_or_else(|| {
				Error::internal(format!("no object fetcher registered for key '{}'", req.object_key))
			})?;
			let object_id = req.object_id.expect("checked above");
			Some(fetcher.fetch(object_id).await.map_err(|e| e.wrap(format!("fetch object '{object_id}'")))?)
		};

		let describer = self.describers.get(req.object_key).or_else(|| self.describers.get(WILDCARD_KEY));
		let roles = match describer {
			Some(describer) => describer.describe(req.identity, object.as_deref(), req.scope_id).await?,
			None => HashSet::new(),
		};
		let roles = self.hierarchy.expand(&roles);

		let effects: Vec<Effect> = self
			.policies
			.iter()
			.filter(|rule| rule.action == req.action && roles.contains(&rule.role))
			.map(|rule| rule.effect)
			.collect();

		match combine(&effects, req.default_effect) {
			Effect::Allow => {
				tracing::debug!(action = req.action, object_key = req.object_key, "authorization allowed");
				Ok(())
			}
			Effect::Deny if req.identity.is_none() => {
				tracing::debug!(action = req.action, object_key = req.object_key, "authorization denied: no identity");
				Err(Error::unauthenticated(format!("action '{}' requires authentication", req.action)))
			}
			Effect::Deny => {
				tracing::info!(action = req.action, object_key = req.object_key, "authorization denied");
				Err(Error::permission_denied(format!("action '{}' denied", req.action))
					.with_public_message("you do not have permission to perform this action"))
			}
		}
	}
}
