//! Wraps a built [`AuthorizationEngine`] as a registrable [`pf_plugins::Plugin`]
//! so server composition can look it up by name and run the per-RPC check.

use std::any::Any;
use std::sync::Arc;

use pf_plugins::Plugin;

use crate::engine::AuthorizationEngine;

pub const PLUGIN_NAME: &str = "authz";

pub struct AuthzPlugin {
	pub engine: Arc<AuthorizationEngine>,
}

impl AuthzPlugin {
	pub fn new(engine: Arc<AuthorizationEngine>) -> Self {
		Self { engine }
	}
}

impl Plugin for AuthzPlugin {
	fn name(&self) -> &str {
		PLUGIN_NAME
	}

	fn as_any(&self) -> &dyn Any {
		self
	}
}
