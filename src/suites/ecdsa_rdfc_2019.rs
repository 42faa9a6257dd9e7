//! The `ecdsa-2019` cryptosuite: RDF dataset canonicalization with ECDSA
//! signatures over the NIST prime curves.

use serde_json::Value;

use crate::canonicalize::{self, CanonizeOptions};
use crate::cryptosuite::CryptoSuite;
use crate::error::Result;
use crate::key::Curve;

/// ECDSA cryptographic suite over canonical N-Quads.
///
/// A conformant `ecdsa-2019` instance requires P-256; companion
/// instances over the remaining curves are created with
/// [`EcdsaRdfc2019Suite::with_curves`].
#[derive(Debug)]
pub struct EcdsaRdfc2019Suite {
    curves: Vec<Curve>,
}

impl EcdsaRdfc2019Suite {
    /// The cryptosuite name carried in proofs
    pub const NAME: &'static str = "ecdsa-2019";

    /// Create the suite with its required curve, P-256
    pub fn new() -> Self {
        Self {
            curves: vec![Curve::P256],
        }
    }

    /// Create a companion suite instance accepting a wider closed set of
    /// curves
    pub fn with_curves(curves: &[Curve]) -> Self {
        Self {
            curves: curves.to_vec(),
        }
    }

    /// Canonicalize a document to sorted N-Quads without signing;
    /// exposed for callers that only need the canonical bytes
    pub fn canonize(&self, document: &Value, options: &CanonizeOptions<'_>) -> Result<String> {
        canonicalize::canonize(document, options)
    }
}

impl Default for EcdsaRdfc2019Suite {
    fn default() -> Self {
        Self::new()
    }
}

impl CryptoSuite for EcdsaRdfc2019Suite {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn required_curves(&self) -> &[Curve] {
        &self.curves
    }

    fn transform(&self, data: &Value, options: &CanonizeOptions<'_>) -> Result<Vec<u8>> {
        Ok(canonicalize::canonize(data, options)?.into_bytes())
    }
}
