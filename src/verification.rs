//! Verification methods and the key-format adapter.
//!
//! A verification method arrives in one of a closed set of encodings,
//! identified by its `type` tag: the current Multikey format, or one of
//! the legacy per-curve 2019 formats. [`VerificationMethod::key_pair`]
//! normalizes any of them into the internal [`KeyPair`] representation.

use base58::FromBase58;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::key::{Curve, KeyPair, PublicKey, SecretKey};

/// The supported key-encoding formats, dispatched on the verification
/// method's `type` tag
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyFormat {
    /// Multicodec-prefixed multibase encoding; the curve is carried by the
    /// codec prefix
    Multikey,
    /// Legacy bare base58 encoding, fixed to P-256
    EcdsaSecp256r1VerificationKey2019,
    /// Legacy bare base58 encoding, fixed to P-384
    EcdsaSecp384r1VerificationKey2019,
    /// Legacy bare base58 encoding, fixed to P-521
    EcdsaSecp521r1VerificationKey2019,
}

impl KeyFormat {
    /// Look up a format from a verification method `type` tag
    pub fn from_type_tag(tag: &str) -> Option<Self> {
        match tag {
            "Multikey" => Some(Self::Multikey),
            "EcdsaSecp256r1VerificationKey2019" => Some(Self::EcdsaSecp256r1VerificationKey2019),
            "EcdsaSecp384r1VerificationKey2019" => Some(Self::EcdsaSecp384r1VerificationKey2019),
            "EcdsaSecp521r1VerificationKey2019" => Some(Self::EcdsaSecp521r1VerificationKey2019),
            _ => None,
        }
    }

    /// The `type` tag for this format
    pub const fn type_tag(self) -> &'static str {
        match self {
            Self::Multikey => "Multikey",
            Self::EcdsaSecp256r1VerificationKey2019 => "EcdsaSecp256r1VerificationKey2019",
            Self::EcdsaSecp384r1VerificationKey2019 => "EcdsaSecp384r1VerificationKey2019",
            Self::EcdsaSecp521r1VerificationKey2019 => "EcdsaSecp521r1VerificationKey2019",
        }
    }

    /// The fixed curve association of a legacy format; `None` for Multikey,
    /// which carries its curve in the multicodec prefix
    pub const fn fixed_curve(self) -> Option<Curve> {
        match self {
            Self::Multikey => None,
            Self::EcdsaSecp256r1VerificationKey2019 => Some(Curve::P256),
            Self::EcdsaSecp384r1VerificationKey2019 => Some(Curve::P384),
            Self::EcdsaSecp521r1VerificationKey2019 => Some(Curve::P521),
        }
    }
}

/// Represents a verification method for cryptographic proofs
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    /// Identifier for the verification method
    pub id: String,

    /// The raw `type` tag; kept verbatim so unsupported tags can be
    /// reported exactly as received
    #[serde(rename = "type")]
    pub type_: String,

    /// The controller of this verification method
    pub controller: String,

    /// Public key in Multikey format (Multikey type)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_multibase: Option<String>,

    /// Secret key in Multikey format (Multikey type)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_key_multibase: Option<String>,

    /// Public key in bare base58 (legacy 2019 types)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_base58: Option<String>,

    /// Private key in bare base58 (legacy 2019 types)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key_base58: Option<String>,
}

impl VerificationMethod {
    /// Create a Multikey verification method for a key pair
    pub fn new(id: &str, controller: &str, key_pair: &KeyPair) -> Self {
        Self {
            id: id.to_string(),
            type_: KeyFormat::Multikey.type_tag().to_string(),
            controller: controller.to_string(),
            public_key_multibase: Some(key_pair.public_key.to_multikey()),
            secret_key_multibase: key_pair.secret_key.as_ref().map(SecretKey::to_multikey),
            public_key_base58: None,
            private_key_base58: None,
        }
    }

    /// Normalize this verification method into the internal key
    /// representation.
    ///
    /// Dispatches on the `type` tag; an unrecognized tag fails with
    /// [`Error::UnsupportedKeyType`] carrying the tag verbatim, and key
    /// bytes that do not match the declared encoding fail with
    /// [`Error::MalformedKeyEncoding`].
    pub fn key_pair(&self) -> Result<KeyPair> {
        let format = KeyFormat::from_type_tag(&self.type_)
            .ok_or_else(|| Error::UnsupportedKeyType(self.type_.clone()))?;

        match format {
            KeyFormat::Multikey => self.multikey_pair(),
            _ => self.legacy_pair(format),
        }
    }

    fn multikey_pair(&self) -> Result<KeyPair> {
        let encoded = self.public_key_multibase.as_deref().ok_or_else(|| {
            Error::MalformedKeyEncoding(
                "Multikey verification method has no publicKeyMultibase".to_string(),
            )
        })?;
        let public_key = PublicKey::from_multikey(encoded)?;

        let secret_key = match self.secret_key_multibase.as_deref() {
            Some(encoded) => {
                let secret = SecretKey::from_multikey(encoded)?;
                if secret.curve() != public_key.curve() {
                    return Err(Error::MalformedKeyEncoding(format!(
                        "secret key curve {} does not match public key curve {}",
                        secret.curve(),
                        public_key.curve()
                    )));
                }
                Some(secret)
            }
            None => None,
        };

        Ok(KeyPair {
            public_key,
            secret_key,
        })
    }

    fn legacy_pair(&self, format: KeyFormat) -> Result<KeyPair> {
        // Legacy formats always name their curve in the type tag.
        let curve = match format.fixed_curve() {
            Some(curve) => curve,
            None => return Err(Error::UnsupportedKeyType(self.type_.clone())),
        };

        let encoded = self.public_key_base58.as_deref().ok_or_else(|| {
            Error::MalformedKeyEncoding(format!(
                "{} verification method has no publicKeyBase58",
                format.type_tag()
            ))
        })?;
        let bytes = encoded.from_base58().map_err(|e| {
            Error::MalformedKeyEncoding(format!("failed to decode base58: {e:?}"))
        })?;
        let public_key = PublicKey::from_bytes(curve, &bytes)?;

        let secret_key = match self.private_key_base58.as_deref() {
            Some(encoded) => {
                let bytes = encoded.from_base58().map_err(|e| {
                    Error::MalformedKeyEncoding(format!("failed to decode base58: {e:?}"))
                })?;
                Some(SecretKey::from_bytes(curve, &bytes)?)
            }
            None => None,
        };

        Ok(KeyPair {
            public_key,
            secret_key,
        })
    }
}

/// Trait for resolving verification methods by id
pub trait VerificationMethodResolver {
    /// Resolve a verification method by id
    fn resolve(&self, id: &str) -> Result<VerificationMethod>;
}

/// In-memory verification method resolver, useful in tests and anywhere
/// the controller documents are known up front
#[derive(Debug, Default)]
pub struct StaticVerificationMethodResolver {
    methods: Vec<VerificationMethod>,
}

impl StaticVerificationMethodResolver {
    /// Create a new empty resolver
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a verification method to the resolver
    pub fn add_method(&mut self, method: VerificationMethod) {
        self.methods.push(method);
    }
}

impl VerificationMethodResolver for StaticVerificationMethodResolver {
    fn resolve(&self, id: &str) -> Result<VerificationMethod> {
        self.methods
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| Error::UnsupportedKeyType(format!("no verification method: {id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn multikey_method(public: &str, secret: Option<&str>) -> VerificationMethod {
        VerificationMethod {
            id: "https://example.edu/issuers/565049#key-1".to_string(),
            type_: "Multikey".to_string(),
            controller: "https://example.edu/issuers/565049".to_string(),
            public_key_multibase: Some(public.to_string()),
            secret_key_multibase: secret.map(ToString::to_string),
            public_key_base58: None,
            private_key_base58: None,
        }
    }

    #[test]
    fn unsupported_type_tag_is_reported_verbatim() {
        let mut method = multikey_method("zDnaeqarma38o3bN4T4W17ZjUgExppDkRzMY6EAxMo7UbnLiK", None);
        method.type_ = "BadKeyType".to_string();

        let err = method.key_pair().unwrap_err();
        assert!(matches!(err, Error::UnsupportedKeyType(_)));
        assert!(err.to_string().contains("BadKeyType"));
    }

    #[test]
    fn multikey_without_public_key_is_malformed() {
        let mut method = multikey_method("z", None);
        method.public_key_multibase = None;

        let err = method.key_pair().unwrap_err();
        assert!(matches!(err, Error::MalformedKeyEncoding(_)));
    }

    #[test]
    fn legacy_format_decodes_with_fixed_curve() {
        let method = VerificationMethod {
            id: "https://example.edu/issuers/565049#key-2".to_string(),
            type_: "EcdsaSecp256r1VerificationKey2019".to_string(),
            controller: "https://example.edu/issuers/565049".to_string(),
            public_key_multibase: None,
            secret_key_multibase: None,
            public_key_base58: Some("22cXTw1K8K7pbpuBMF3d71vYamQdJDz1xHKevEHtgQZfD".to_string()),
            private_key_base58: None,
        };

        let pair = method.key_pair().expect("normalize");
        assert_eq!(pair.curve(), Curve::P256);
        assert!(pair.secret_key.is_none());
    }

    #[test]
    fn legacy_format_rejects_wrong_length_bytes() {
        let method = VerificationMethod {
            id: "https://example.edu/issuers/565049#key-2".to_string(),
            type_: "EcdsaSecp384r1VerificationKey2019".to_string(),
            controller: "https://example.edu/issuers/565049".to_string(),
            public_key_multibase: None,
            secret_key_multibase: None,
            // P-256 sized key under a P-384 type tag
            public_key_base58: Some("22cXTw1K8K7pbpuBMF3d71vYamQdJDz1xHKevEHtgQZfD".to_string()),
            private_key_base58: None,
        };

        let err = method.key_pair().unwrap_err();
        assert!(matches!(err, Error::MalformedKeyEncoding(_)));
    }

    #[test]
    fn resolver_finds_methods_by_id() {
        let mut resolver = StaticVerificationMethodResolver::new();
        resolver.add_method(multikey_method(
            "zDnaeqarma38o3bN4T4W17ZjUgExppDkRzMY6EAxMo7UbnLiK",
            None,
        ));

        assert!(resolver
            .resolve("https://example.edu/issuers/565049#key-1")
            .is_ok());
        assert!(resolver.resolve("https://example.edu/issuers/565049#nope").is_err());
    }
}
