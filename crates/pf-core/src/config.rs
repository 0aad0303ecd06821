//! Configuration boundary.
//!
//! Loading config files is an external collaborator's job; this module
//! only defines the typed accessor contract and the `PF__`-prefixed
//! environment-variable fallback: double underscore separates namespace
//! levels, single underscores within a segment become camelCase.

use std::collections::HashMap;
use std::env;

/// A namespaced configuration source. Implementations may layer a file
/// loader (external) over [`EnvSettings`] (provided here) however the
/// application sees fit.
pub trait Settings: Send + Sync {
	fn get(&self, key: &str) -> Option<String>;

	fn get_or(&self, key: &str, default: &str) -> String {
		self.get(key).unwrap_or_else(|| default.to_string())
	}
}

/// Reads configuration from `PF__`-prefixed environment variables,
/// converting `auth.signingKey` into `PF__AUTH__SIGNING_KEY` and back.
#[derive(Debug, Default, Clone)]
pub struct EnvSettings {
	prefix: String,
}

impl EnvSettings {
	pub fn new() -> Self {
		Self { prefix: "PF".to_string() }
	}

	pub fn with_prefix(prefix: impl Into<String>) -> Self {
		Self { prefix: prefix.into() }
	}

	fn env_var_name(&self, key: &str) -> String {
		let mut out = self.prefix.clone();
		for segment in key.split('.') {
			out.push_str("__");
			out.push_str(&camel_to_screaming_snake(segment));
		}
		out
	}
}

impl Settings for EnvSettings {
	fn get(&self, key: &str) -> Option<String> {
		env::var(self.env_var_name(key)).ok()
	}
}

fn camel_to_screaming_snake(segment: &str) -> String {
	let mut out = String::with_capacity(segment.len() + 4);
	for (i, ch) in segment.chars().enumerate() {
		if ch.is_uppercase() {
			if i != 0 {
				out.push('_');
			}
			out.extend(ch.to_uppercase());
		} else {
			out.extend(ch.to_uppercase());
		}
	}
	out
}

/// In-memory settings, primarily for tests and for applications that build
/// their configuration map themselves before handing it to the framework.
#[derive(Debug, Default, Clone)]
pub struct MapSettings {
	values: HashMap<String, String>,
}

impl MapSettings {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.values.insert(key.into(), value.into());
		self
	}
}

impl Settings for MapSettings {
	fn get(&self, key: &str) -> Option<String> {
		self.values.get(key).cloned()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn camel_segment_becomes_screaming_snake() {
		let settings = EnvSettings::new();
		assert_eq!(settings.env_var_name("auth.signingKey"), "PF__AUTH__SIGNING_KEY");
		assert_eq!(
			settings.env_var_name("myapp.cacheRefreshInterval"),
			"PF__MYAPP__CACHE_REFRESH_INTERVAL"
		);
	}

	#[test]
	fn map_settings_roundtrip() {
		let settings = MapSettings::new().insert("server.port", "8080");
		assert_eq!(settings.get("server.port"), Some("8080".to_string()));
		assert_eq!(settings.get_or("server.address", "0.0.0.0"), "0.0.0.0");
	}
}
