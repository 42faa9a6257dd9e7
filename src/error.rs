use onlyerror::Error;
use std::io;

#[derive(Error, Debug)]
pub enum Error {
    /// Error during document I/O operations
    #[error("Document I/O error")]
    DocumentIo(#[from] io::Error),

    /// Error parsing JSON document
    #[error("JSON parse error")]
    JsonParse(#[from] serde_json::Error),

    /// Verification method type tag is not one of the supported encodings
    #[error("Unsupported key type: {0}")]
    UnsupportedKeyType(String),

    /// Key bytes do not match the expected encoding for the declared variant
    #[error("Malformed key encoding: {0}")]
    MalformedKeyEncoding(String),

    /// Verification method carries no private key material
    #[error("Verification method has no private key material")]
    MissingPrivateKey,

    /// Document loader could not resolve a referenced context
    #[error("Could not resolve context: {0}")]
    LoaderResolution(String),

    /// Document cannot be expanded to an RDF dataset
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Property term is not resolvable under the active context
    #[error("Undefined term: {0}")]
    UndefinedTerm(String),

    /// Proof type is a relative URL
    #[error("Relative URL: {0}")]
    RelativeUrl(String),

    /// Key curve is outside the suite's required algorithm set
    #[error("Algorithm mismatch: {0}")]
    AlgorithmMismatch(String),

    /// Proof value is absent, not a string, or not base58-btc multibase
    #[error("Invalid proof value: {0}")]
    InvalidProofValue(String),

    /// Proof type is not DataIntegrityProof
    #[error("Invalid proof type: {0}")]
    InvalidProofType(String),

    /// Unsupported cryptographic suite
    #[error("Unsupported cryptographic suite: {0}")]
    UnsupportedCryptoSuite(String),

    /// Error inside the signature backend
    #[error("Signing error: {0}")]
    Signing(String),
}

/// Result type for this crate
pub type Result<T> = std::result::Result<T, Error>;
