//! Documents held in memory with a lazy key index.

use std::collections::HashMap;

use libdata_core::doc::{check_index, key_of};
use libdata_core::{DataError, DataResult, Document};

/// A fully loaded document list.
#[derive(Debug, Clone)]
pub struct LoadedDocuments {
    docs: Vec<Document>,
    key_field: String,
    index: Option<HashMap<String, usize>>,
}

impl LoadedDocuments {
    /// Wrap loaded documents; `read(key)` looks `key` up in `key_field`.
    pub fn new(docs: Vec<Document>, key_field: impl Into<String>) -> Self {
        Self {
            docs,
            key_field: key_field.into(),
            index: None,
        }
    }

    /// Number of documents.
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Whether there are no documents.
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Document at `index`.
    pub fn get(&self, index: usize) -> DataResult<Document> {
        check_index(index, self.docs.len())?;
        Ok(self.docs[index].clone())
    }

    /// Document whose key field equals `key`. The first match wins.
    pub fn read(&mut self, key: &str) -> DataResult<Document> {
        let index = self.index.get_or_insert_with(|| {
            let mut index = HashMap::with_capacity(self.docs.len());
            for (i, doc) in self.docs.iter().enumerate() {
                if let Some(k) = key_of(doc, &self.key_field) {
                    index.entry(k).or_insert(i);
                }
            }
            index
        });
        let i = *index
            .get(key)
            .ok_or_else(|| DataError::KeyNotFound(key.to_string()))?;
        Ok(self.docs[i].clone())
    }
}
