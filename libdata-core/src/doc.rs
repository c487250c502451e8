//! Document reader and writer contract.
//!
//! Readers expose a fixed-length, indexable collection of documents with
//! optional lookup by key; writers accept documents one at a time until
//! closed. Both are obtained through registry dispatch.

use serde_json::Value;

use crate::error::{DataError, DataResult};

/// A document: any JSON-compatible value, usually an object.
pub type Document = Value;

/// Read access to an indexable collection of documents.
pub trait DocReader: Send {
    /// Number of documents.
    fn len(&self) -> usize;

    /// Whether the collection is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Document at `index`, in `[0, len)`.
    fn get(&mut self, index: usize) -> DataResult<Document>;

    /// Document identified by `key`.
    fn read(&mut self, key: &str) -> DataResult<Document>;

    /// Release any resources held by the reader.
    fn close(&mut self) -> DataResult<()> {
        Ok(())
    }

    /// Iterate over every document in index order.
    ///
    /// Each call starts a fresh pass from index 0.
    fn iter(&mut self) -> Documents<'_, Self>
    where
        Self: Sized,
    {
        Documents::new(self)
    }
}

impl<R: DocReader + ?Sized> DocReader for Box<R> {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn get(&mut self, index: usize) -> DataResult<Document> {
        (**self).get(index)
    }

    fn read(&mut self, key: &str) -> DataResult<Document> {
        (**self).read(key)
    }

    fn close(&mut self) -> DataResult<()> {
        (**self).close()
    }
}

/// Lazy iterator over a reader's documents.
pub struct Documents<'a, R: DocReader + ?Sized> {
    reader: &'a mut R,
    next: usize,
    len: usize,
}

impl<'a, R: DocReader + ?Sized> Documents<'a, R> {
    /// Start a pass over `reader`.
    pub fn new(reader: &'a mut R) -> Self {
        let len = reader.len();
        Self {
            reader,
            next: 0,
            len,
        }
    }
}

impl<R: DocReader + ?Sized> Iterator for Documents<'_, R> {
    type Item = DataResult<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.len {
            return None;
        }
        let item = self.reader.get(self.next);
        self.next += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.next;
        (remaining, Some(remaining))
    }
}

impl<R: DocReader + ?Sized> ExactSizeIterator for Documents<'_, R> {}

/// Write access to a document sink.
pub trait DocWriter: Send {
    /// Store one document.
    fn write(&mut self, doc: &Document) -> DataResult<()>;

    /// Flush and release resources. Further writes are an error.
    fn close(&mut self) -> DataResult<()>;
}

impl<W: DocWriter + ?Sized> DocWriter for Box<W> {
    fn write(&mut self, doc: &Document) -> DataResult<()> {
        (**self).write(doc)
    }

    fn close(&mut self) -> DataResult<()> {
        (**self).close()
    }
}

/// Standard base64 (with padding) for binary cell values that are not UTF-8.
pub fn encode_base64(data: &[u8]) -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

    let mut result = String::with_capacity(data.len().div_ceil(3) * 4);
    for chunk in data.chunks(3) {
        let b0 = chunk[0];
        let b1 = chunk.get(1).copied().unwrap_or(0);
        let b2 = chunk.get(2).copied().unwrap_or(0);

        result.push(ALPHABET[(b0 >> 2) as usize] as char);
        result.push(ALPHABET[(((b0 & 0x03) << 4) | (b1 >> 4)) as usize] as char);
        if chunk.len() > 1 {
            result.push(ALPHABET[(((b1 & 0x0f) << 2) | (b2 >> 6)) as usize] as char);
        } else {
            result.push('=');
        }
        if chunk.len() > 2 {
            result.push(ALPHABET[(b2 & 0x3f) as usize] as char);
        } else {
            result.push('=');
        }
    }
    result
}

/// Bounds check shared by index-addressed readers.
pub fn check_index(index: usize, len: usize) -> DataResult<()> {
    if index < len {
        Ok(())
    } else {
        Err(DataError::IndexOutOfRange { index, len })
    }
}

/// Look up a field of an object document and render it as a lookup key.
///
/// Strings are used as-is; numbers and booleans use their JSON text.
pub fn key_of(doc: &Document, field: &str) -> Option<String> {
    match doc.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// An in-memory reader, mostly useful in tests and as a building block.
#[derive(Debug, Clone, Default)]
pub struct MemoryReader {
    docs: Vec<Document>,
    key_field: Option<String>,
}

impl MemoryReader {
    /// Reader over `docs`, without key lookup.
    pub fn new(docs: Vec<Document>) -> Self {
        Self {
            docs,
            key_field: None,
        }
    }

    /// Enable `read(key)` lookups on `field`.
    pub fn with_key_field(mut self, field: impl Into<String>) -> Self {
        self.key_field = Some(field.into());
        self
    }
}

impl DocReader for MemoryReader {
    fn len(&self) -> usize {
        self.docs.len()
    }

    fn get(&mut self, index: usize) -> DataResult<Document> {
        check_index(index, self.docs.len())?;
        Ok(self.docs[index].clone())
    }

    fn read(&mut self, key: &str) -> DataResult<Document> {
        let field = self
            .key_field
            .as_deref()
            .ok_or_else(|| DataError::unsupported("memory", "read by key"))?;
        self.docs
            .iter()
            .find(|doc| key_of(doc, field).as_deref() == Some(key))
            .cloned()
            .ok_or_else(|| DataError::KeyNotFound(key.to_string()))
    }
}
