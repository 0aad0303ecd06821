//! Filters for [`crate::store::Store::list`].
//!
//! Filtering matches on non-zero filter fields; pointer-typed fields
//! match zero values when explicitly set. Rust's
//! `Option` already draws that line for us: a field absent from the
//! filter means "don't care" and a field present — even holding a zero
//! value like `0` or `""` — means "match exactly this", so there is no
//! separate pointer-vs-value distinction to carry over.

use std::collections::BTreeMap;

use serde_json::Value;

/// A set of `field -> exact value` constraints. Built fluently; every
/// field added is matched exactly, including zero values.
#[derive(Debug, Clone, Default)]
pub struct Filter {
	fields: BTreeMap<String, Value>,
}

impl Filter {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
		self.fields.insert(field.into(), value.into());
		self
	}

	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
	}

	/// Whether `candidate` (a record serialized to JSON) satisfies every
	/// constrained field. A record with no object representation never
	/// matches a non-empty filter.
	pub fn matches(&self, candidate: &Value) -> bool {
		if self.fields.is_empty() {
			return true;
		}
		let Some(obj) = candidate.as_object() else {
			return false;
		};
		self.fields.iter().all(|(key, expected)| obj.get(key) == Some(expected))
	}
}
