//! The [`Record`] contract and collection-name derivation: snake_case +
//! pluralize the type's own name, cached per type, overridable by the
//! record itself.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::OnceLock;

use parking_lot::RwLock;
use serde::Serialize;

/// Anything storable through [`crate::store::Store`]. Exposes a primary
/// key; the collection it lives in is derived from the type name unless
/// the implementation overrides [`Record::collection_name`].
pub trait Record: Serialize + Send + Sync + 'static {
	/// The record's primary key. Stable for the record's lifetime.
	fn primary_key(&self) -> String;

	/// The collection this record type lives in. Default: snake_case +
	/// pluralize the type's own (unqualified) name, memoized per type.
	fn collection_name() -> String
	where
		Self: Sized,
	{
		derive_collection_name::<Self>()
	}
}

fn cache() -> &'static RwLock<HashMap<TypeId, String>> {
	static CACHE: OnceLock<RwLock<HashMap<TypeId, String>>> = OnceLock::new();
	CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Derives and caches the default collection name for `T`.
pub fn derive_collection_name<T: 'static>() -> String {
	let type_id = TypeId::of::<T>();
	if let Some(name) = cache().read().get(&type_id) {
		return name.clone();
	}
	let full = std::any::type_name::<T>();
	let short = full.rsplit("::").next().unwrap_or(full);
	let name = pluralize(&to_snake_case(short));
	cache().write().insert(type_id, name.clone());
	name
}

/// `PascalCase`/`camelCase` -> `snake_case`.
pub fn to_snake_case(input: &str) -> String {
	let mut out = String::with_capacity(input.len() + 4);
	let mut prev_lower_or_digit = false;
	for ch in input.chars() {
		if ch.is_uppercase() {
			if prev_lower_or_digit {
				out.push('_');
			}
			out.extend(ch.to_lowercase());
			prev_lower_or_digit = false;
		} else {
			out.push(ch);
			prev_lower_or_digit = ch.is_lowercase() || ch.is_ascii_digit();
		}
	}
	out
}

/// A deliberately simple English pluralizer, sufficient for identifier-
/// shaped type names; it makes no attempt at full linguistic coverage.
pub fn pluralize(word: &str) -> String {
	if word.is_empty() {
		return word.to_string();
	}
	if let Some(stem) = word.strip_suffix('y') {
		if !stem.ends_with(['a', 'e', 'i', 'o', 'u']) {
			return format!("{stem}ies");
		}
	}
	if word.ends_with(['s', 'x', 'z']) || word.ends_with("ch") || word.ends_with("sh") {
		return format!("{word}es");
	}
	format!("{word}s")
}
