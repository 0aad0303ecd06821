//! Login providers: the handlers a `Login` RPC dispatches to by name.
//! Every provider implements the same contract so the auth plugin can
//! treat them uniformly, regardless of what credential shape they accept.

mod fake;
mod password;

use std::collections::HashMap;

use async_trait::async_trait;
use pf_core::Result;
use serde_json::Value;

pub use fake::FakeProvider;
pub use password::{Account, AccountFinder, PasswordProvider};

use crate::identity::Identity;

/// A registered login handler. `creds` is the provider-specific JSON
/// payload carried in the `Login` RPC.
#[async_trait]
pub trait LoginProvider: Send + Sync {
	/// Provider name, as dispatched on by the `Login` RPC's `provider` field.
	fn name(&self) -> &str;

	/// Attempts to authenticate `creds`, producing a fresh [`Identity`] on
	/// success.
	async fn authenticate(&self, creds: &Value) -> Result<Identity>;
}

/// Providers keyed by name, as consulted by the `Login` RPC dispatcher.
#[derive(Default)]
pub struct ProviderRegistry {
	providers: HashMap<String, Box<dyn LoginProvider>>,
}

impl ProviderRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(&mut self, provider: Box<dyn LoginProvider>) {
		self.providers.insert(provider.name().to_string(), provider);
	}

	pub fn get(&self, name: &str) -> Option<&dyn LoginProvider> {
		self.providers.get(name).map(|p| p.as_ref())
	}
}
