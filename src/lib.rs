//! # ECDSA Data Integrity
//!
//! This crate implements the Data Integrity ECDSA Cryptographic Suites,
//! providing functionality to create and verify cryptographic proofs for
//! JSON-LD documents using ECDSA signatures over the NIST prime curves
//! (P-256, P-384, P-521).
//!
//! Two cryptographic suites are supported:
//! - `ecdsa-2019`: Uses RDF Dataset Canonicalization
//! - `ecdsa-jcs-2019`: Uses JSON Canonicalization Scheme
//!
//! ## Example
//! ```rust,no_run
//! use ecdsa_2019_cryptosuite::{CryptoSuite, Document, ProofOptions};
//! use ecdsa_2019_cryptosuite::{CanonizeOptions, StaticLoader, VerificationMethod};
//! use ecdsa_2019_cryptosuite::suites::ecdsa_rdfc_2019::EcdsaRdfc2019Suite;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let method: VerificationMethod = todo!();
//! // Load a document and pin its contexts
//! let document = Document::from_file("path/to/credential.json")?;
//! let loader = StaticLoader::new();
//! let canonize_options = CanonizeOptions { document_loader: &loader };
//!
//! // Create proof options
//! let options = ProofOptions::new()
//!     .with_proof_purpose("assertionMethod")
//!     .with_created("2023-03-10T15:00:00Z");
//!
//! // Create a cryptographic suite and bind a signer to a key
//! let suite = EcdsaRdfc2019Suite::new();
//! let signer = suite.create_signer(&method)?;
//!
//! // Create a proof for the document
//! let secured = suite.create_proof(&document, &options, &signer, &canonize_options)?;
//!
//! // Later, verify the proof
//! let verifier = suite.create_verifier(&method)?;
//! let result = suite.verify_proof(&secured, &verifier, &canonize_options)?;
//! assert!(result.verified);
//! # Ok(())
//! # }
//! ```

pub mod canonicalize;
pub mod cryptosuite;
pub mod document;
pub mod error;
pub mod key;
pub mod loader;
pub mod proof;
pub mod suites;
pub mod verification;

// Re-exports of key components
pub use canonicalize::{canonize, CanonizeOptions};
pub use cryptosuite::{instantiate_cryptosuite, CryptoSuite};
pub use document::Document;
pub use error::Error;
pub use key::{Curve, KeyPair, PublicKey, SecretKey, Signer, Verifier};
pub use loader::{DocumentLoader, RemoteDocument, StaticLoader};
pub use proof::{Proof, ProofOptions, VerificationResult, PROOF_TYPE};
pub use verification::{KeyFormat, VerificationMethod, VerificationMethodResolver};

#[cfg(test)]
mod tests;
