//! The cryptosuite engine interface.
//!
//! A suite pairs a document transformation (RDF canonicalization or JCS)
//! with ECDSA signing over the curve-associated digest. The pipeline
//! (configure proof, transform, hash, serialize, verify) is shared;
//! concrete suites supply their name, required curves, and transform.

use serde_json::{Map, Value};
use tracing::debug;

use crate::canonicalize::{is_absolute_iri, CanonizeOptions};
use crate::document::Document;
use crate::error::{Error, Result};
use crate::key::{Curve, Signer, Verifier};
use crate::proof::{Proof, ProofOptions, VerificationResult, PROOF_TYPE};
use crate::suites::utils::{multibase_decode, multibase_encode, now_rfc3339};
use crate::verification::VerificationMethod;

/// Trait defining the main interface for cryptographic suites
pub trait CryptoSuite: std::fmt::Debug {
    /// Name of the cryptographic suite
    fn name(&self) -> &'static str;

    /// The closed set of curves this suite instance accepts
    fn required_curves(&self) -> &[Curve];

    /// Transform a document (or proof configuration) into the byte
    /// sequence that gets hashed
    fn transform(&self, data: &Value, options: &CanonizeOptions<'_>) -> Result<Vec<u8>>;

    /// Check a key's curve against the suite's required set
    fn check_curve(&self, curve: Curve) -> Result<()> {
        if self.required_curves().contains(&curve) {
            return Ok(());
        }
        let supported: Vec<&str> = self.required_curves().iter().map(|c| c.name()).collect();
        Err(Error::AlgorithmMismatch(format!(
            "{} requires {}, got {curve}",
            self.name(),
            supported.join(" or ")
        )))
    }

    /// Create a verifier bound to a verification method's public key.
    ///
    /// Key normalization failures ([`Error::UnsupportedKeyType`],
    /// [`Error::MalformedKeyEncoding`]) propagate unchanged.
    fn create_verifier(&self, method: &VerificationMethod) -> Result<Verifier> {
        let key_pair = method.key_pair()?;
        self.check_curve(key_pair.curve())?;
        Verifier::new(&method.id, &key_pair.public_key)
    }

    /// Create a signer bound to a verification method's private key
    fn create_signer(&self, method: &VerificationMethod) -> Result<Signer> {
        let key_pair = method.key_pair()?;
        self.check_curve(key_pair.curve())?;
        Signer::new(&method.id, &key_pair)
    }

    /// Combine the transformed document and proof configuration into the
    /// data that gets signed: `digest(config) || digest(document)` with
    /// the curve's associated digest
    fn hash(&self, curve: Curve, transformed: &[u8], proof_config: &[u8]) -> Vec<u8> {
        let mut data = curve.digest(proof_config);
        data.extend(curve.digest(transformed));
        data
    }

    /// Create a proof for a document with the given options, and return
    /// the document with the proof attached
    fn create_proof(
        &self,
        document: &Document,
        options: &ProofOptions,
        signer: &Signer,
        canonize_options: &CanonizeOptions<'_>,
    ) -> Result<Document> {
        self.check_curve(signer.curve())?;

        let mut proof_options = options.options.clone();

        // Ensure required fields are present
        proof_options
            .entry("type".to_string())
            .or_insert_with(|| Value::String(PROOF_TYPE.to_string()));
        match proof_options.get("type") {
            Some(Value::String(type_)) if type_ == PROOF_TYPE || is_absolute_iri(type_) => {}
            Some(Value::String(type_)) => return Err(Error::RelativeUrl(type_.clone())),
            _ => {
                return Err(Error::InvalidDocument(
                    "proof type must be a string".to_string(),
                ))
            }
        }

        proof_options
            .entry("cryptosuite".to_string())
            .or_insert_with(|| Value::String(self.name().to_string()));
        proof_options
            .entry("created".to_string())
            .or_insert_with(|| Value::String(now_rfc3339()));
        proof_options
            .entry("verificationMethod".to_string())
            .or_insert_with(|| Value::String(signer.id().to_string()));

        // The proof configuration is canonicalized under the document's
        // context.
        if let Some(context) = document.context() {
            proof_options
                .entry("@context".to_string())
                .or_insert_with(|| context.clone());
        }

        let proof_config = Value::Object(Map::from_iter(proof_options.clone()));
        let config_bytes = self.transform(&proof_config, canonize_options)?;

        let unsecured = document.without_proof();
        let document_bytes = self.transform(&unsecured.to_value(), canonize_options)?;

        let hash_data = self.hash(signer.curve(), &document_bytes, &config_bytes);
        let signature = signer.sign(&hash_data)?;
        debug!(suite = self.name(), curve = %signer.curve(), "created proof");

        proof_options.insert(
            "proofValue".to_string(),
            Value::String(multibase_encode(&signature)),
        );
        let proof: Proof = serde_json::from_value(Value::Object(Map::from_iter(proof_options)))?;

        document.with_proof(&proof)
    }

    /// Verify the proof attached to a document.
    ///
    /// A cryptographically invalid signature is not an error: it yields
    /// `verified: false`. Structural problems (bad proof value, wrong
    /// proof type) do error.
    fn verify_proof(
        &self,
        document: &Document,
        verifier: &Verifier,
        canonize_options: &CanonizeOptions<'_>,
    ) -> Result<VerificationResult> {
        let proof = document.raw_proof().ok_or_else(|| {
            Error::InvalidDocument("document does not contain a proof".to_string())
        })?;
        let Value::Object(proof_map) = proof else {
            return Err(Error::InvalidDocument(
                "proof must be a JSON object".to_string(),
            ));
        };

        match proof_map.get("type") {
            Some(Value::String(type_)) if type_ == PROOF_TYPE => {}
            Some(Value::String(type_)) => return Err(Error::InvalidProofType(type_.clone())),
            _ => {
                return Err(Error::InvalidProofType(
                    "proof has no type".to_string(),
                ))
            }
        }

        match proof_map.get("cryptosuite") {
            Some(Value::String(suite)) if suite == self.name() => {}
            Some(Value::String(suite)) => {
                return Err(Error::UnsupportedCryptoSuite(suite.clone()))
            }
            _ => {
                return Err(Error::UnsupportedCryptoSuite(
                    "proof has no cryptosuite".to_string(),
                ))
            }
        }

        let signature = match proof_map.get("proofValue") {
            Some(Value::String(encoded)) => {
                if !encoded.starts_with('z') {
                    return Err(Error::InvalidProofValue(
                        "\"proofValue\" must be multibase base58-btc encoded (leading 'z')"
                            .to_string(),
                    ));
                }
                multibase_decode(encoded)?
            }
            Some(_) => {
                return Err(Error::InvalidProofValue(
                    "\"proofValue\" must be a string".to_string(),
                ))
            }
            None => {
                return Err(Error::InvalidProofValue(
                    "proof is missing \"proofValue\"".to_string(),
                ))
            }
        };
        if signature.len() != verifier.curve().signature_size() {
            return Err(Error::InvalidProofValue(format!(
                "expected {} signature bytes for {}, got {}",
                verifier.curve().signature_size(),
                verifier.curve(),
                signature.len()
            )));
        }

        // Reconstruct the signed bytes: the proof configuration is the
        // proof minus its value, under the document's context.
        let mut proof_config = proof_map.clone();
        proof_config.remove("proofValue");
        if !proof_config.contains_key("@context") {
            if let Some(context) = document.context() {
                proof_config.insert("@context".to_string(), context.clone());
            }
        }
        let config_bytes = self.transform(&Value::Object(proof_config), canonize_options)?;

        let unsecured = document.without_proof();
        let document_bytes = self.transform(&unsecured.to_value(), canonize_options)?;

        let hash_data = self.hash(verifier.curve(), &document_bytes, &config_bytes);
        let verified = verifier.verify(&hash_data, &signature);
        debug!(suite = self.name(), verified, "verified proof");

        Ok(VerificationResult {
            verified_document: verified.then(|| unsecured),
            verified,
        })
    }
}

/// Factory function to instantiate a cryptosuite by name
pub fn instantiate_cryptosuite(cryptosuite: &str) -> Result<Box<dyn CryptoSuite>> {
    match cryptosuite {
        "ecdsa-2019" => {
            use crate::suites::ecdsa_rdfc_2019::EcdsaRdfc2019Suite;
            Ok(Box::new(EcdsaRdfc2019Suite::new()))
        }
        "ecdsa-jcs-2019" => {
            use crate::suites::ecdsa_jcs_2019::EcdsaJcs2019Suite;
            Ok(Box::new(EcdsaJcs2019Suite::new()))
        }
        _ => Err(Error::UnsupportedCryptoSuite(cryptosuite.to_string())),
    }
}
