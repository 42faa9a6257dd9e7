//! ECDSA key material over the NIST prime curves.
//!
//! Keys are held as raw encoded bytes (compressed SEC1 points for public
//! keys, big-endian scalars for secret keys) together with their curve
//! identifier, and are only turned into backend signing/verifying keys when
//! a [`Signer`] or [`Verifier`] is constructed.

use multibase::Base;
use p256::ecdsa::signature::{Signer as _, Verifier as _};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256, Sha384, Sha512};
use std::fmt;

use crate::error::{Error, Result};

/// Multicodec prefix for a P-256 compressed public key (varint of 0x1200).
const P256_PUB_PREFIX: [u8; 2] = [0x80, 0x24];
/// Multicodec prefix for a P-384 compressed public key (varint of 0x1201).
const P384_PUB_PREFIX: [u8; 2] = [0x81, 0x24];
/// Multicodec prefix for a P-521 compressed public key (varint of 0x1202).
const P521_PUB_PREFIX: [u8; 2] = [0x82, 0x24];

/// Multicodec prefix for a P-256 secret scalar (varint of 0x1306).
const P256_SECRET_PREFIX: [u8; 2] = [0x86, 0x26];
/// Multicodec prefix for a P-384 secret scalar (varint of 0x1307).
const P384_SECRET_PREFIX: [u8; 2] = [0x87, 0x26];
/// Multicodec prefix for a P-521 secret scalar (varint of 0x1308).
const P521_SECRET_PREFIX: [u8; 2] = [0x88, 0x26];

/// The fixed algorithm identifier carried by every [`Signer`] and
/// [`Verifier`] produced by this crate.
pub const ALGORITHM: &str = "ECDSA";

/// The closed set of curves supported by the ECDSA cryptosuites.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Curve {
    /// NIST P-256 (secp256r1), signatures over SHA-256
    P256,
    /// NIST P-384 (secp384r1), signatures over SHA-384
    P384,
    /// NIST P-521 (secp521r1), signatures over SHA-512
    P521,
}

impl Curve {
    /// Canonical curve name as it appears in key formats and error messages
    pub const fn name(self) -> &'static str {
        match self {
            Self::P256 => "P-256",
            Self::P384 => "P-384",
            Self::P521 => "P-521",
        }
    }

    /// Length of a compressed SEC1 public key for this curve
    pub const fn public_key_size(self) -> usize {
        match self {
            Self::P256 => 33,
            Self::P384 => 49,
            Self::P521 => 67,
        }
    }

    /// Length of a big-endian secret scalar for this curve
    pub const fn secret_key_size(self) -> usize {
        match self {
            Self::P256 => 32,
            Self::P384 => 48,
            Self::P521 => 66,
        }
    }

    /// Length of a raw `r || s` signature for this curve
    pub const fn signature_size(self) -> usize {
        match self {
            Self::P256 => 64,
            Self::P384 => 96,
            Self::P521 => 132,
        }
    }

    pub(crate) const fn public_key_prefix(self) -> [u8; 2] {
        match self {
            Self::P256 => P256_PUB_PREFIX,
            Self::P384 => P384_PUB_PREFIX,
            Self::P521 => P521_PUB_PREFIX,
        }
    }

    pub(crate) const fn secret_key_prefix(self) -> [u8; 2] {
        match self {
            Self::P256 => P256_SECRET_PREFIX,
            Self::P384 => P384_SECRET_PREFIX,
            Self::P521 => P521_SECRET_PREFIX,
        }
    }

    pub(crate) fn from_public_key_prefix(prefix: &[u8]) -> Option<Self> {
        match prefix {
            p if p == P256_PUB_PREFIX.as_slice() => Some(Self::P256),
            p if p == P384_PUB_PREFIX.as_slice() => Some(Self::P384),
            p if p == P521_PUB_PREFIX.as_slice() => Some(Self::P521),
            _ => None,
        }
    }

    pub(crate) fn from_secret_key_prefix(prefix: &[u8]) -> Option<Self> {
        match prefix {
            p if p == P256_SECRET_PREFIX.as_slice() => Some(Self::P256),
            p if p == P384_SECRET_PREFIX.as_slice() => Some(Self::P384),
            p if p == P521_SECRET_PREFIX.as_slice() => Some(Self::P521),
            _ => None,
        }
    }

    /// Digest associated with this curve: SHA-256 for P-256, SHA-384 for
    /// P-384, SHA-512 for P-521.
    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::P256 => Sha256::digest(data).to_vec(),
            Self::P384 => Sha384::digest(data).to_vec(),
            Self::P521 => Sha512::digest(data).to_vec(),
        }
    }
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Represents a public key: a compressed SEC1 point on one of the
/// supported curves
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    curve: Curve,
    bytes: Vec<u8>,
}

impl PublicKey {
    /// Create a public key from compressed SEC1 bytes, checking that the
    /// bytes decode to a point on the declared curve
    pub fn from_bytes(curve: Curve, bytes: &[u8]) -> Result<Self> {
        if bytes.len() != curve.public_key_size() {
            return Err(Error::MalformedKeyEncoding(format!(
                "expected {} byte public key for {curve}, got {}",
                curve.public_key_size(),
                bytes.len()
            )));
        }

        let on_curve = match curve {
            Curve::P256 => p256::ecdsa::VerifyingKey::from_sec1_bytes(bytes).is_ok(),
            Curve::P384 => p384::ecdsa::VerifyingKey::from_sec1_bytes(bytes).is_ok(),
            Curve::P521 => p521::ecdsa::VerifyingKey::from_sec1_bytes(bytes).is_ok(),
        };
        if !on_curve {
            return Err(Error::MalformedKeyEncoding(format!(
                "public key bytes are not a valid {curve} point"
            )));
        }

        Ok(Self {
            curve,
            bytes: bytes.to_vec(),
        })
    }

    /// Create a public key from a Multikey, determining the curve from the
    /// multicodec prefix
    pub fn from_multikey(multikey: &str) -> Result<Self> {
        let data = decode_multikey(multikey)?;
        let curve = Curve::from_public_key_prefix(&data[..2]).ok_or_else(|| {
            Error::MalformedKeyEncoding(format!(
                "unrecognized public key multicodec prefix 0x{}",
                hex::encode(&data[..2])
            ))
        })?;
        Self::from_bytes(curve, &data[2..])
    }

    /// Encode the public key as a Multikey (base58-btc multibase over the
    /// multicodec-prefixed bytes)
    pub fn to_multikey(&self) -> String {
        let mut data = Vec::with_capacity(2 + self.bytes.len());
        data.extend_from_slice(&self.curve.public_key_prefix());
        data.extend_from_slice(&self.bytes);
        multibase::encode(Base::Base58Btc, data)
    }

    /// The curve this key belongs to
    pub fn curve(&self) -> Curve {
        self.curve
    }

    /// The compressed SEC1 bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_multikey())
    }
}

/// Represents a secret key: a scalar on one of the supported curves
#[derive(Clone)]
pub struct SecretKey {
    curve: Curve,
    bytes: Vec<u8>,
}

impl SecretKey {
    /// Create a secret key from big-endian scalar bytes, checking the
    /// scalar is valid for the declared curve
    pub fn from_bytes(curve: Curve, bytes: &[u8]) -> Result<Self> {
        if bytes.len() != curve.secret_key_size() {
            return Err(Error::MalformedKeyEncoding(format!(
                "expected {} byte secret key for {curve}, got {}",
                curve.secret_key_size(),
                bytes.len()
            )));
        }

        let valid = match curve {
            Curve::P256 => p256::ecdsa::SigningKey::from_slice(bytes).is_ok(),
            Curve::P384 => p384::ecdsa::SigningKey::from_slice(bytes).is_ok(),
            Curve::P521 => p521::ecdsa::SigningKey::from_slice(bytes).is_ok(),
        };
        if !valid {
            return Err(Error::MalformedKeyEncoding(format!(
                "secret key bytes are not a valid {curve} scalar"
            )));
        }

        Ok(Self {
            curve,
            bytes: bytes.to_vec(),
        })
    }

    /// Create a secret key from a Multikey, determining the curve from the
    /// multicodec prefix
    pub fn from_multikey(multikey: &str) -> Result<Self> {
        let data = decode_multikey(multikey)?;
        let curve = Curve::from_secret_key_prefix(&data[..2]).ok_or_else(|| {
            Error::MalformedKeyEncoding(format!(
                "unrecognized secret key multicodec prefix 0x{}",
                hex::encode(&data[..2])
            ))
        })?;
        Self::from_bytes(curve, &data[2..])
    }

    /// Encode the secret key as a Multikey
    pub fn to_multikey(&self) -> String {
        let mut data = Vec::with_capacity(2 + self.bytes.len());
        data.extend_from_slice(&self.curve.secret_key_prefix());
        data.extend_from_slice(&self.bytes);
        multibase::encode(Base::Base58Btc, data)
    }

    /// The curve this key belongs to
    pub fn curve(&self) -> Curve {
        self.curve
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey(<redacted>)")
    }
}

/// The normalized key representation handed to the cryptosuite engine:
/// one curve, public key bytes, optional private key bytes
#[derive(Clone, Debug)]
pub struct KeyPair {
    /// The public key
    pub public_key: PublicKey,
    /// The secret key, when private material was supplied
    pub secret_key: Option<SecretKey>,
}

impl KeyPair {
    /// Derive a key pair (public key included) from a secret key
    pub fn from_secret_key(secret_key: SecretKey) -> Result<Self> {
        let public = match secret_key.curve {
            Curve::P256 => p256::ecdsa::SigningKey::from_slice(&secret_key.bytes)
                .map(|key| key.verifying_key().to_encoded_point(true).as_bytes().to_vec()),
            Curve::P384 => p384::ecdsa::SigningKey::from_slice(&secret_key.bytes)
                .map(|key| key.verifying_key().to_encoded_point(true).as_bytes().to_vec()),
            Curve::P521 => p521::ecdsa::SigningKey::from_slice(&secret_key.bytes).map(|key| {
                p521::ecdsa::VerifyingKey::from(&key)
                    .to_encoded_point(true)
                    .as_bytes()
                    .to_vec()
            }),
        }
        .map_err(|e| Error::Signing(format!("failed to derive public key: {e}")))?;

        Ok(Self {
            public_key: PublicKey {
                curve: secret_key.curve,
                bytes: public,
            },
            secret_key: Some(secret_key),
        })
    }

    /// Generate a new random key pair on the given curve
    pub fn generate(curve: Curve) -> Result<Self> {
        let bytes = match curve {
            Curve::P256 => p256::ecdsa::SigningKey::random(&mut OsRng).to_bytes().to_vec(),
            Curve::P384 => p384::ecdsa::SigningKey::random(&mut OsRng).to_bytes().to_vec(),
            Curve::P521 => p521::ecdsa::SigningKey::random(&mut OsRng).to_bytes().to_vec(),
        };
        Self::from_secret_key(SecretKey::from_bytes(curve, &bytes)?)
    }

    /// The curve both halves of the pair belong to
    pub fn curve(&self) -> Curve {
        self.public_key.curve
    }
}

enum SigningKeyInner {
    P256(p256::ecdsa::SigningKey),
    P384(p384::ecdsa::SigningKey),
    P521(p521::ecdsa::SigningKey),
}

/// Signing capability bound to exactly one key pair and curve.
///
/// Signatures are deterministic ECDSA (RFC 6979) over the curve's
/// associated digest, serialized as fixed-width `r || s`.
pub struct Signer {
    id: String,
    /// Always [`ALGORITHM`]
    pub algorithm: &'static str,
    curve: Curve,
    key: SigningKeyInner,
}

impl Signer {
    pub(crate) fn new(id: &str, key_pair: &KeyPair) -> Result<Self> {
        let secret = key_pair.secret_key.as_ref().ok_or(Error::MissingPrivateKey)?;
        let key = match secret.curve {
            Curve::P256 => p256::ecdsa::SigningKey::from_slice(secret.as_bytes())
                .map(SigningKeyInner::P256),
            Curve::P384 => p384::ecdsa::SigningKey::from_slice(secret.as_bytes())
                .map(SigningKeyInner::P384),
            Curve::P521 => p521::ecdsa::SigningKey::from_slice(secret.as_bytes())
                .map(SigningKeyInner::P521),
        }
        .map_err(|e| Error::Signing(format!("failed to load signing key: {e}")))?;

        Ok(Self {
            id: id.to_string(),
            algorithm: ALGORITHM,
            curve: secret.curve,
            key,
        })
    }

    /// Sign `data`, returning the raw `r || s` signature bytes
    pub fn sign(&self, data: &[u8]) -> Result<Vec<u8>> {
        let signature = match &self.key {
            SigningKeyInner::P256(key) => key
                .try_sign(data)
                .map(|sig: p256::ecdsa::Signature| sig.to_bytes().to_vec()),
            SigningKeyInner::P384(key) => key
                .try_sign(data)
                .map(|sig: p384::ecdsa::Signature| sig.to_bytes().to_vec()),
            SigningKeyInner::P521(key) => key
                .try_sign(data)
                .map(|sig: p521::ecdsa::Signature| sig.to_bytes().to_vec()),
        }
        .map_err(|e| Error::Signing(format!("ECDSA signing failed: {e}")))?;
        Ok(signature)
    }

    /// The verification method id this signer is bound to
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The curve this signer is bound to
    pub fn curve(&self) -> Curve {
        self.curve
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signer({}, {}, <redacted>)", self.id, self.curve)
    }
}

enum VerifyingKeyInner {
    P256(p256::ecdsa::VerifyingKey),
    P384(p384::ecdsa::VerifyingKey),
    P521(p521::ecdsa::VerifyingKey),
}

/// Verifying capability bound to exactly one public key and curve
pub struct Verifier {
    id: String,
    /// Always [`ALGORITHM`]
    pub algorithm: &'static str,
    curve: Curve,
    key: VerifyingKeyInner,
}

impl Verifier {
    pub(crate) fn new(id: &str, public_key: &PublicKey) -> Result<Self> {
        let key = match public_key.curve {
            Curve::P256 => p256::ecdsa::VerifyingKey::from_sec1_bytes(public_key.as_bytes())
                .map(VerifyingKeyInner::P256),
            Curve::P384 => p384::ecdsa::VerifyingKey::from_sec1_bytes(public_key.as_bytes())
                .map(VerifyingKeyInner::P384),
            Curve::P521 => p521::ecdsa::VerifyingKey::from_sec1_bytes(public_key.as_bytes())
                .map(VerifyingKeyInner::P521),
        }
        .map_err(|e| Error::Signing(format!("failed to load verifying key: {e}")))?;

        Ok(Self {
            id: id.to_string(),
            algorithm: ALGORITHM,
            curve: public_key.curve,
            key,
        })
    }

    /// Check a raw `r || s` signature over `data`.
    ///
    /// A signature that fails to parse or fails the curve equation checks
    /// is simply not valid; this never errors.
    pub fn verify(&self, data: &[u8], signature: &[u8]) -> bool {
        match &self.key {
            VerifyingKeyInner::P256(key) => p256::ecdsa::Signature::from_slice(signature)
                .map(|sig| key.verify(data, &sig).is_ok())
                .unwrap_or(false),
            VerifyingKeyInner::P384(key) => p384::ecdsa::Signature::from_slice(signature)
                .map(|sig| key.verify(data, &sig).is_ok())
                .unwrap_or(false),
            VerifyingKeyInner::P521(key) => p521::ecdsa::Signature::from_slice(signature)
                .map(|sig| key.verify(data, &sig).is_ok())
                .unwrap_or(false),
        }
    }

    /// The verification method id this verifier is bound to
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The curve this verifier is bound to
    pub fn curve(&self) -> Curve {
        self.curve
    }
}

impl fmt::Debug for Verifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Verifier({}, {})", self.id, self.curve)
    }
}

/// Decode a base58-btc multibase string and check it carries at least a
/// two-byte multicodec prefix
fn decode_multikey(multikey: &str) -> Result<Vec<u8>> {
    if !multikey.starts_with('z') {
        return Err(Error::MalformedKeyEncoding(
            "Multikey must start with 'z' (base58-btc)".to_string(),
        ));
    }

    let (_, data) = multibase::decode(multikey)
        .map_err(|e| Error::MalformedKeyEncoding(format!("failed to decode multibase: {e}")))?;

    if data.len() < 2 {
        return Err(Error::MalformedKeyEncoding(
            "Multikey is too short to carry a multicodec prefix".to_string(),
        ));
    }

    Ok(data)
}
