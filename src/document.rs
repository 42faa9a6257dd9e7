//! JSON-LD document wrapper.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::proof::Proof;

/// Represents a JSON-LD document: an arbitrary tree of key/value nodes
/// with an `@context`, plus an optional attached `proof`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Document {
    data: Map<String, Value>,
}

impl Document {
    /// Load a document from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_string(&content)
    }

    /// Create a document from a JSON string
    pub fn from_json_string(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_json_value(value)
    }

    /// Create a document from a JSON Value
    pub fn from_json_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(data) => Ok(Self { data }),
            _ => Err(Error::InvalidDocument(
                "document root must be a JSON object".to_string(),
            )),
        }
    }

    /// Save the document to a file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = self.to_json_string()?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Convert the document to a pretty-printed JSON string
    pub fn to_json_string(&self) -> Result<String> {
        let json = serde_json::to_string_pretty(&Value::Object(self.data.clone()))?;
        Ok(json)
    }

    /// The document as a JSON Value
    pub fn to_value(&self) -> Value {
        Value::Object(self.data.clone())
    }

    /// Access the raw JSON fields
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// The document's `@context`, if it has one
    pub fn context(&self) -> Option<&Value> {
        self.data.get("@context")
    }

    /// The raw `proof` value, if present (not yet validated)
    pub fn raw_proof(&self) -> Option<&Value> {
        self.data.get("proof")
    }

    /// Get the proof from the document if it exists and parses
    pub fn get_proof(&self) -> Option<Proof> {
        self.data
            .get("proof")
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Create a new document with the proof removed
    pub fn without_proof(&self) -> Self {
        let mut data = self.data.clone();
        data.remove("proof");
        Self { data }
    }

    /// Create a new document with the given proof attached
    pub fn with_proof(&self, proof: &Proof) -> Result<Self> {
        let mut data = self.data.clone();
        data.insert("proof".to_string(), serde_json::to_value(proof)?);
        Ok(Self { data })
    }
}
