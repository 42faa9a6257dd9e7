use chrono::{SecondsFormat, Utc};
use multibase::Base;

use crate::error::{Error, Result};

/// Encode binary data using Multibase (base58-btc)
pub fn multibase_encode(data: &[u8]) -> String {
    multibase::encode(Base::Base58Btc, data)
}

/// Decode a multibase encoded proof value, enforcing base58-btc
pub fn multibase_decode(encoded: &str) -> Result<Vec<u8>> {
    let (base, bytes) = multibase::decode(encoded)
        .map_err(|e| Error::InvalidProofValue(format!("failed to decode multibase: {e}")))?;
    if base != Base::Base58Btc {
        return Err(Error::InvalidProofValue(
            "proof value must be base58-btc encoded".to_string(),
        ));
    }
    Ok(bytes)
}

/// The current time as a whole-second RFC 3339 timestamp
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
