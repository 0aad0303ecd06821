//! The narrow CRUUDLE contract and an in-memory reference
//! implementation. Implementations need only satisfy these semantics; a
//! production-grade persistent backend is out of scope here.

use async_trait::async_trait;
use pf_core::{Error, Result};
use serde::de::DeserializeOwned;

use crate::filter::Filter;
use crate::record::Record;

/// Create/Read/Update/Upsert/Delete/List/Exists over [`Record`]-shaped
/// values. One `Store` instance services every record type; the
/// collection a given `T` lives in comes from [`Record::collection_name`].
#[async_trait]
pub trait Store: Send + Sync {
	async fn create<T: Record>(&self, record: &T) -> Result<()>;
	async fn read<T: Record + DeserializeOwned>(&self, id: &str) -> Result<T>;
	async fn update<T: Record>(&self, record: &T) -> Result<()>;
	async fn upsert<T: Record>(&self, record: &T) -> Result<()>;
	async fn delete<T: Record>(&self, id: &str) -> Result<()>;
	async fn list<T: Record + DeserializeOwned>(&self, filter: &Filter) -> Result<Vec<T>>;
	async fn exists<T: Record>(&self, id: &str) -> Result<bool>;
}

pub fn err_not_found(collection: &str, id: &str) -> Error {
	Error::not_found(format!("{collection}: no record with id '{id}'"))
}

pub fn err_already_exists(collection: &str, id: &str) -> Error {
	Error::already_exists(format!("{collection}: record with id '{id}' already exists"))
}

pub fn err_invalid_model(reason: impl Into<String>) -> Error {
	Error::invalid_argument(format!("invalid model: {}", reason.into()))
}

use std::collections::HashMap;

use parking_lot::RwLock;
use serde_json::Value;

/// An in-memory [`Store`], keyed by collection name then primary key.
/// Used as the reference implementation and by the auth blocklist /
/// work-queue test fixtures that want persistence without a real backend.
#[derive(Default)]
pub struct InMemoryStore {
	collections: RwLock<HashMap<String, HashMap<String, Value>>>,
}

impl InMemoryStore {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl Store for InMemoryStore {
	async fn create<T: Record>(&self, record: &T) -> Result<()> {
		let collection = T::collection_name();
		let id = record.primary_key();
		let value = serde_json::to_value(record).map_err(|e| err_invalid_model(e.to_string()))?;
		let mut collections = self.collections.write();
		let table = collections.entry(collection.clone()).or_default();
		if table.contains_key(&id) {
			return Err(err_already_exists(&collection, &id));
		}
		table.insert(id, value);
		Ok(())
	}

	async fn read<T: Record + DeserializeOwned>(&self, id: &str) -> Result<T> {
		let collection = T::collection_name();
		let collections = self.collections.read();
		let value = collections
			.get(&collection)
			.and_then(|table| table.get(id))
			.ok_or_else(|| err_not_found(&collection, id))?;
		serde_json::from_value(value.clone()).map_err(|e| err_invalid_model(e.to_string()))
	}

	async fn update<T: Record>(&self, record: &T) -> Result<()> {
		let collection = T::collection_name();
		let id = record.primary_key();
		let value = serde_json::to_value(record).map_err(|e| err_invalid_model(e.to_string()))?;
		let mut collections = self.collections.write();
		let table = collections.entry(collection.clone()).or_default();
		if !table.contains_key(&id) {
			return Err(err_not_found(&collection, &id));
		}
		table.insert(id, value);
		Ok(())
	}

	async fn upsert<T: Record>(&self, record: &T) -> Result<()> {
		let collection = T::collection_name();
		let id = record.primary_key();
		let value = serde_json::to_value(record).map_err(|e| err_invalid_model(e.to_string()))?;
		self.collections.write().entry(collection).or_default().insert(id, value);
		Ok(())
	}

	async fn delete<T: Record>(&self, id: &str) -> Result<()> {
		let collection = T::collection_name();
		let mut collections = self.collections.write();
		let table = collections.entry(collection.clone()).or_default();
		if table.remove(id).is_none() {
			return Err(err_not_found(&collection, id));
		}
		Ok(())
	}

	async fn list<T: Record + DeserializeOwned>(&self, filter: &Filter) -> Result<Vec<T>> {
		let collection = T::collection_name();
		let collections = self.collections.read();
		let Some(table) = collections.get(&collection) else {
			return Ok(Vec::new());
		};
		table
			.values()
			.filter(|value| filter.matches(value))
			.map(|value| serde_json::from_value(value.clone()).map_err(|e| err_invalid_model(e.to_string())))
			.collect()
	}

	async fn exists<T: Record>(&self, id: &str) -> Result<bool> {
		let collection = T::collection_name();
		let collections = self.collections.read();
		Ok(collections.get(&collection).map(|table| table.contains_key(id)).unwrap_or(false))
	}
}

#[cfg(test)]
mod tests {
	use serde::{Deserialize, Serialize};

	use super::*;

	#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
	struct Widget {
		id: String,
		color: String,
		count: u32,
	}

	impl Record for Widget {
		fn primary_key(&self) -> String {
			self.id.clone()
		}
	}

	#[tokio::test]
	async fn create_then_read_round_trips() {
		let store = InMemoryStore::new();
		let widget = Widget { id: "1".into(), color: "red".into(), count: 3 };
		store.create(&widget).await.unwrap();
		let fetched: Widget = store.read("1").await.unwrap();
		assert_eq!(fetched, widget);
	}

	#[tokio::test]
	async fn create_rejects_duplicate_primary_key() {
		let store = InMemoryStore::new();
		let widget = Widget { id: "1".into(), color: "red".into(), count: 3 };
		store.create(&widget).await.unwrap();
		let err = store.create(&widget).await.unwrap_err();
		assert!(err.is(pf_core::ErrorKind::AlreadyExists));
	}

	#[tokio::test]
	async fn read_missing_is_not_found() {
		let store = InMemoryStore::new();
		let err = store.read::<Widget>("missing").await.unwrap_err();
		assert!(err.is(pf_core::ErrorKind::NotFound));
	}

	#[tokio::test]
	async fn update_requires_existing_record() {
		let store = InMemoryStore::new();
		let widget = Widget { id: "1".into(), color: "red".into(), count: 3 };
		let err = store.update(&widget).await.unwrap_err();
		assert!(err.is(pf_core::ErrorKind::NotFound));

		store.create(&widget).await.unwrap();
		let updated = Widget { color: "blue".into(), ..widget };
		store.update(&updated).await.unwrap();
		let fetched: Widget = store.read("1").await.unwrap();
		assert_eq!(fetched.color, "blue");
	}

	#[tokio::test]
	async fn upsert_creates_or_overwrites() {
		let store = InMemoryStore::new();
		let widget = Widget { id: "1".into(), color: "red".into(), count: 3 };
		store.upsert(&widget).await.unwrap();
		let overwrite = Widget { color: "green".into(), ..widget.clone() };
		store.upsert(&overwrite).await.unwrap();
		let fetched: Widget = store.read("1").await.unwrap();
		assert_eq!(fetched.color, "green");
	}

	#[tokio::test]
	async fn delete_removes_and_exists_reflects_it() {
		let store = InMemoryStore::new();
		let widget = Widget { id: "1".into(), color: "red".into(), count: 3 };
		store.create(&widget).await.unwrap();
		assert!(store.exists::<Widget>("1").await.unwrap());
		store.delete::<Widget>("1").await.unwrap();
		assert!(!store.exists::<Widget>("1").await.unwrap());
		assert!(store.delete::<Widget>("1").await.unwrap_err().is(pf_core::ErrorKind::NotFound));
	}

	#[tokio::test]
	async fn list_applies_filter() {
		let store = InMemoryStore::new();
		store.create(&Widget { id: "1".into(), color: "red".into(), count: 1 }).await.unwrap();
		store.create(&Widget { id: "2".into(), color: "blue".into(), count: 1 }).await.unwrap();
		store.create(&Widget { id: "3".into(), color: "red".into(), count: 2 }).await.unwrap();

		let red: Vec<Widget> = store.list(&Filter::new().with("color", "red")).await.unwrap();
		assert_eq!(red.len(), 2);

		let red_count_two: Vec<Widget> =
			store.list(&Filter::new().with("color", "red").with("count", 2)).await.unwrap();
		assert_eq!(red_count_two, vec![Widget { id: "3".into(), color: "red".into(), count: 2 }]);
	}

	#[test]
	fn collection_name_defaults_from_type_name() {
		assert_eq!(Widget::collection_name(), "widgets");
	}
}
