/// ECDSA JCS cryptosuite implementation
pub mod ecdsa_jcs_2019;

/// ECDSA RDF-canonicalization cryptosuite implementation
pub mod ecdsa_rdfc_2019;

/// Shared utilities for cryptosuites
pub mod utils;
