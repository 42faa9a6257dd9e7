//! Document loader: the injected capability used to resolve `@context`
//! references during canonicalization.

use serde_json::Value;
use std::collections::HashMap;

use crate::error::{Error, Result};

/// A context document resolved by a [`DocumentLoader`]
#[derive(Clone, Debug)]
pub struct RemoteDocument {
    /// The resolved JSON-LD context document
    pub document: Value,
    /// The URL the document was ultimately loaded from
    pub document_url: String,
}

/// Resolves `@context` URLs to JSON-LD context definitions.
///
/// Implementations must be deterministic for a fixed URL within a single
/// canonicalization run. Failures surface as
/// [`Error::LoaderResolution`](crate::Error::LoaderResolution); the engine
/// has no retry policy of its own.
pub trait DocumentLoader {
    /// Resolve a context URL
    fn load(&self, url: &str) -> Result<RemoteDocument>;
}

/// An in-memory loader over a fixed URL-to-document map.
///
/// Keeps canonicalization deterministic and offline; used by the test
/// suite and by callers that pin their context documents.
#[derive(Clone, Debug, Default)]
pub struct StaticLoader {
    documents: HashMap<String, Value>,
}

impl StaticLoader {
    /// Create an empty loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a context document for a URL
    pub fn insert(&mut self, url: &str, document: Value) {
        self.documents.insert(url.to_string(), document);
    }

    /// Builder-style variant of [`StaticLoader::insert`]
    pub fn with_document(mut self, url: &str, document: Value) -> Self {
        self.insert(url, document);
        self
    }
}

impl DocumentLoader for StaticLoader {
    fn load(&self, url: &str) -> Result<RemoteDocument> {
        let document = self
            .documents
            .get(url)
            .cloned()
            .ok_or_else(|| Error::LoaderResolution(url.to_string()))?;

        Ok(RemoteDocument {
            document,
            document_url: url.to_string(),
        })
    }
}
