//! Store trait for model-backed units.
//!
//! This module provides the [`Store`] trait that applications implement to
//! connect their persistence layer to [`Collection`](crate::Collection) and
//! [`Record`](crate::Record) units. The trait is sync-only; for async stores,
//! use `block_on()` internally.
//!
//! # Example
//!
//! ```rust,ignore
//! use tessera_dispatch::{Store, StoreQuery};
//!
//! struct ProductStore {
//!     db: Database,
//! }
//!
//! impl Store for ProductStore {
//!     type Item = Product;
//!     type Id = i64;
//!     type Error = DatabaseError;
//!
//!     fn parse_id(&self, id_str: &str) -> Result<Self::Id, Self::Error> {
//!         id_str.parse().map_err(|_| DatabaseError::BadId(id_str.into()))
//!     }
//!
//!     fn get(&self, id: &Self::Id) -> Result<Option<Self::Item>, Self::Error> {
//!         self.db.find_product(*id)
//!     }
//!
//!     // ...
//! }
//! ```
//!
//! [`MemoryStore`] is a ready-made implementation for prototypes and tests.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::RwLock;

use serde::Serialize;
use thiserror::Error;

/// Pagination for list operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreQuery {
    /// Number of items to skip
    pub offset: usize,
    /// Maximum number of items to return
    pub limit: usize,
}

impl StoreQuery {
    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }
}

/// Trait for persistence backends.
///
/// # Design Notes
///
/// - **Two-stage ID resolution**: `parse_id` validates an ID taken from a
///   request before `get` fetches the item.
/// - **JSON data**: `create` and `update` receive submitted form fields as a
///   JSON object of strings; the store converts them to its own types.
pub trait Store: Send + Sync + 'static {
    /// The stored object type.
    type Item: Serialize + Send + Sync + 'static;

    /// The identifier type.
    type Id: Clone + Display + FromStr + Send + Sync + 'static;

    /// The error type for storage operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Parses an ID string into the store's ID type.
    fn parse_id(&self, id_str: &str) -> Result<Self::Id, Self::Error>;

    /// Retrieves an item by ID, returning `None` if not found.
    fn get(&self, id: &Self::Id) -> Result<Option<Self::Item>, Self::Error>;

    /// Creates an error for when an item is not found.
    fn not_found_error(id: &Self::Id) -> Self::Error;

    /// Retrieves an item by ID, returning an error if not found.
    fn resolve(&self, id: &Self::Id) -> Result<Self::Item, Self::Error> {
        self.get(id)?.ok_or_else(|| Self::not_found_error(id))
    }

    /// Lists one page of items in a stable order.
    fn list(&self, query: &StoreQuery) -> Result<Vec<Self::Item>, Self::Error>;

    /// Total number of items.
    fn count(&self) -> Result<usize, Self::Error>;

    /// Creates a new item from the given data.
    fn create(&self, data: serde_json::Value) -> Result<Self::Item, Self::Error>;

    /// Updates an existing item with the given data.
    ///
    /// The data contains only the fields that should change.
    fn update(&self, id: &Self::Id, data: serde_json::Value) -> Result<Self::Item, Self::Error>;

    /// Deletes an item by ID.
    fn delete(&self, id: &Self::Id) -> Result<(), Self::Error>;

    /// The identifier of a stored item.
    fn item_id(&self, item: &Self::Item) -> Self::Id;
}

/// Error of a [`MemoryStore`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("item {0} not found")]
    NotFound(String),

    #[error("invalid id '{0}'")]
    InvalidId(String),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("store is read-only")]
    ReadOnly,

    #[error("store lock poisoned")]
    Poisoned,
}

/// A record held by a [`MemoryStore`]: an id plus free-form fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryRecord {
    pub id: u64,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// An in-process [`Store`] of JSON records keyed by increasing ids.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
    read_only: bool,
}

#[derive(Debug, Default)]
struct MemoryState {
    records: BTreeMap<u64, serde_json::Map<String, serde_json::Value>>,
    next_id: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose writes all fail, for exercising failure paths.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Adds a record, builder style.
    pub fn with(self, data: serde_json::Value) -> Result<Self, StoreError> {
        self.insert(data)?;
        Ok(self)
    }

    fn insert(&self, data: serde_json::Value) -> Result<MemoryRecord, StoreError> {
        let fields = into_fields(data)?;
        let mut state = self.state.write().map_err(|_| StoreError::Poisoned)?;
        state.next_id += 1;
        let id = state.next_id;
        state.records.insert(id, fields.clone());
        Ok(MemoryRecord { id, fields })
    }

    fn writable(&self) -> Result<(), StoreError> {
        if self.read_only {
            Err(StoreError::ReadOnly)
        } else {
            Ok(())
        }
    }
}

fn into_fields(
    data: serde_json::Value,
) -> Result<serde_json::Map<String, serde_json::Value>, StoreError> {
    match data {
        serde_json::Value::Object(mut map) => {
            map.remove("id");
            Ok(map)
        }
        other => Err(StoreError::InvalidData(format!("expected an object, got {other}"))),
    }
}

impl Store for MemoryStore {
    type Item = MemoryRecord;
    type Id = u64;
    type Error = StoreError;

    fn parse_id(&self, id_str: &str) -> Result<Self::Id, Self::Error> {
        id_str
            .parse()
            .map_err(|_| StoreError::InvalidId(id_str.to_string()))
    }

    fn get(&self, id: &Self::Id) -> Result<Option<Self::Item>, Self::Error> {
        let state = self.state.read().map_err(|_| StoreError::Poisoned)?;
        Ok(state.records.get(id).map(|fields| MemoryRecord {
            id: *id,
            fields: fields.clone(),
        }))
    }

    fn not_found_error(id: &Self::Id) -> Self::Error {
        StoreError::NotFound(id.to_string())
    }

    fn list(&self, query: &StoreQuery) -> Result<Vec<Self::Item>, Self::Error> {
        let state = self.state.read().map_err(|_| StoreError::Poisoned)?;
        Ok(state
            .records
            .iter()
            .skip(query.offset)
            .take(query.limit)
            .map(|(id, fields)| MemoryRecord {
                id: *id,
                fields: fields.clone(),
            })
            .collect())
    }

    fn count(&self) -> Result<usize, Self::Error> {
        Ok(self
            .state
            .read()
            .map_err(|_| StoreError::Poisoned)?
            .records
            .len())
    }

    fn create(&self, data: serde_json::Value) -> Result<Self::Item, Self::Error> {
        self.writable()?;
        self.insert(data)
    }

    fn update(&self, id: &Self::Id, data: serde_json::Value) -> Result<Self::Item, Self::Error> {
        self.writable()?;
        let changes = into_fields(data)?;
        let mut state = self.state.write().map_err(|_| StoreError::Poisoned)?;
        let fields = state
            .records
            .get_mut(id)
            .ok_or_else(|| Self::not_found_error(id))?;
        fields.extend(changes);
        Ok(MemoryRecord {
            id: *id,
            fields: fields.clone(),
        })
    }

    fn delete(&self, id: &Self::Id) -> Result<(), Self::Error> {
        self.writable()?;
        let mut state = self.state.write().map_err(|_| StoreError::Poisoned)?;
        state
            .records
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Self::not_found_error(id))
    }

    fn item_id(&self, item: &Self::Item) -> Self::Id {
        item.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> MemoryStore {
        MemoryStore::new()
            .with(json!({"name": "Lamp", "price": "12"}))
            .unwrap()
            .with(json!({"name": "Desk", "price": "80"}))
            .unwrap()
            .with(json!({"name": "Chair", "price": "45"}))
            .unwrap()
    }

    #[test]
    fn test_ids_increase_from_one() {
        let store = store();
        let ids: Vec<u64> = store
            .list(&StoreQuery::new(0, 10))
            .unwrap()
            .iter()
            .map(|r| store.item_id(r))
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_list_pages() {
        let store = store();
        let page = store.list(&StoreQuery::new(1, 1)).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].fields["name"], json!("Desk"));
        assert_eq!(store.count().unwrap(), 3);
    }

    #[test]
    fn test_update_merges_fields() {
        let store = store();
        let updated = store.update(&1, json!({"price": "10"})).unwrap();
        assert_eq!(updated.fields["name"], json!("Lamp"));
        assert_eq!(updated.fields["price"], json!("10"));
    }

    #[test]
    fn test_delete_and_resolve() {
        let store = store();
        store.delete(&2).unwrap();
        assert_eq!(store.resolve(&2), Err(StoreError::NotFound("2".into())));
        assert_eq!(store.delete(&2), Err(StoreError::NotFound("2".into())));
    }

    #[test]
    fn test_parse_id() {
        let store = store();
        assert_eq!(store.parse_id("3"), Ok(3));
        assert_eq!(store.parse_id("x"), Err(StoreError::InvalidId("x".into())));
    }

    #[test]
    fn test_read_only_rejects_writes() {
        let store = store().read_only();
        assert_eq!(store.delete(&1), Err(StoreError::ReadOnly));
        assert!(store.get(&1).unwrap().is_some());
    }

    #[test]
    fn test_record_serializes_flat() {
        let store = store();
        let record = store.resolve(&1).unwrap();
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({"id": 1, "name": "Lamp", "price": "12"})
        );
    }
}
