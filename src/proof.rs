//! Data Integrity proof envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::document::Document;

/// The fixed proof envelope type tag
pub const PROOF_TYPE: &str = "DataIntegrityProof";

/// Represents a cryptographic proof attached to a document.
///
/// The split between [`ProofInner`] and `proof_value` mirrors how proofs
/// are built: everything in the inner part is canonicalized and signed,
/// and the resulting signature becomes the proof value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    #[serde(flatten)]
    pub(crate) inner: ProofInner,

    /// Proof value (multibase-encoded signature bytes)
    pub proof_value: String,
}

impl Proof {
    /// The proof type tag
    pub fn type_(&self) -> &str {
        &self.inner.type_
    }

    /// The cryptosuite that produced this proof
    pub fn cryptosuite(&self) -> &str {
        &self.inner.cryptosuite
    }

    /// The verification method reference
    pub fn verification_method(&self) -> &str {
        &self.inner.verification_method
    }

    /// When the proof was created
    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.inner.created
    }
}

/// The proof's own metadata, minus the proof value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofInner {
    /// Optional identifier for the proof
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Type of proof; [`PROOF_TYPE`] for proofs produced by this crate
    #[serde(rename = "type")]
    pub type_: String,

    /// Cryptographic suite used for the proof
    pub cryptosuite: String,

    /// Verification method that can be used to verify the proof
    pub verification_method: String,

    /// Purpose of the proof, carried verbatim (policy evaluation is the
    /// caller's concern)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_purpose: Option<String>,

    /// When the proof was created (RFC 3339 dateTime)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,

    /// When the proof expires (RFC 3339 dateTime)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,

    /// Security domain for the proof
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    /// Challenge to prevent replay attacks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,

    /// Random value to increase privacy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    /// JSON-LD context the proof was canonicalized under
    #[serde(rename = "@context", skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,

    /// Any additional proof properties, carried through verbatim so the
    /// signed configuration survives the round trip
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Options for creating a proof
#[derive(Debug, Clone, Default)]
pub struct ProofOptions {
    /// Key-value pairs of proof options
    pub options: HashMap<String, Value>,
}

impl ProofOptions {
    /// Create a new empty set of proof options
    pub fn new() -> Self {
        Self {
            options: HashMap::new(),
        }
    }

    /// Set the proof type (default is "DataIntegrityProof")
    pub fn with_type(mut self, type_: &str) -> Self {
        self.options
            .insert("type".to_string(), Value::String(type_.to_string()));
        self
    }

    /// Set the verification method
    pub fn with_verification_method(mut self, method: &str) -> Self {
        self.options.insert(
            "verificationMethod".to_string(),
            Value::String(method.to_string()),
        );
        self
    }

    /// Set the proof purpose
    pub fn with_proof_purpose(mut self, purpose: &str) -> Self {
        self.options.insert(
            "proofPurpose".to_string(),
            Value::String(purpose.to_string()),
        );
        self
    }

    /// Set the creation date
    pub fn with_created(mut self, created: &str) -> Self {
        self.options
            .insert("created".to_string(), Value::String(created.to_string()));
        self
    }

    /// Set the security domain
    pub fn with_domain(mut self, domain: &str) -> Self {
        self.options
            .insert("domain".to_string(), Value::String(domain.to_string()));
        self
    }

    /// Set the challenge
    pub fn with_challenge(mut self, challenge: &str) -> Self {
        self.options.insert(
            "challenge".to_string(),
            Value::String(challenge.to_string()),
        );
        self
    }

    /// Set an arbitrary proof property
    pub fn with_property(mut self, key: &str, value: Value) -> Self {
        self.options.insert(key.to_string(), value);
        self
    }
}

/// Result of verifying a proof
#[derive(Debug, Clone)]
pub struct VerificationResult {
    /// Whether the proof is valid
    pub verified: bool,

    /// The unsecured document (if verification succeeded)
    pub verified_document: Option<Document>,
}
