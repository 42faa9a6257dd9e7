//! The `ecdsa-jcs-2019` companion cryptosuite: JSON Canonicalization
//! Scheme instead of RDF canonicalization, same ECDSA signing.

use serde_json::Value;

use crate::canonicalize::CanonizeOptions;
use crate::cryptosuite::CryptoSuite;
use crate::error::Result;
use crate::key::Curve;

/// ECDSA cryptographic suite over JCS-canonicalized JSON
#[derive(Debug)]
pub struct EcdsaJcs2019Suite {
    curves: Vec<Curve>,
}

impl EcdsaJcs2019Suite {
    /// The cryptosuite name carried in proofs
    pub const NAME: &'static str = "ecdsa-jcs-2019";

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
}

impl Default for EcdsaJcs2019Suite {
    fn default() -> Self {
        Self::new()
    }
}

impl CryptoSuite for EcdsaJcs2019Suite {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn required_curves(&self) -> &[Curve] {
        &self.curves
    }

    fn transform(&self, data: &Value, _options: &CanonizeOptions<'_>) -> Result<Vec<u8>> {
        let canonical = serde_jcs::to_string(data)?;
        Ok(canonical.into_bytes())
    }
}
