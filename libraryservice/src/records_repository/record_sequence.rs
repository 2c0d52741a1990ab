use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::api::{Book, User};

/// Record kept in an ordered sequence and addressed by a string id
pub trait Record: Clone + Serialize + DeserializeOwned {
    fn id(&self) -> &str;
}

impl Record for Book {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for User {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Ordered sequence of records.
/// Id uniqueness is only checked on insert; updates may change ids freely.
#[derive(Debug, Clone)]
pub struct RecordSequence<R> {
    records: Vec<R>,
}

impl<R> Default for RecordSequence<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

impl<R: Record> RecordSequence<R> {
    pub fn new(records: Vec<R>) -> Self {
        Self { records }
    }

    pub fn as_slice(&self) -> &[R] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|record| record.id() == id)
    }

    pub fn find(&self, id: &str) -> Option<&R> {
        self.records.iter().find(|record| record.id() == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut R> {
        self.records.iter_mut().find(|record| record.id() == id)
    }

    /// Appends the record unless one with the same id exists.
    /// Returns false when the id is taken.
    pub fn insert(&mut self, record: R) -> bool {
        if self.find(record.id()).is_some() {
            return false;
        }
        self.records.push(record);
        true
    }

    /// Shallow merges `patch` over the record at `index`: keys in the patch overwrite,
    /// everything else is kept.
    /// The record is left untouched if the merged value does not fit the record shape.
    pub fn merge_at(
        &mut self,
        index: usize,
        patch: Map<String, Value>,
    ) -> Result<(), serde_json::Error> {
        let mut merged = serde_json::to_value(&self.records[index])?;
        if let Value::Object(fields) = &mut merged {
            fields.extend(patch);
        }
        self.records[index] = serde_json::from_value(merged)?;
        Ok(())
    }

    pub fn remove_at(&mut self, index: usize) -> R {
        self.records.remove(index)
    }

    pub fn to_vec(&self) -> Vec<R> {
        self.records.clone()
    }
}
