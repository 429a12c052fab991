//! Local inspection of bearer tokens.
//!
//! The client only reads the `exp` claim from the payload segment; the
//! signature is never verified here, that is the backend's job. Any
//! decode failure is treated as "no usable token".

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

/// Read the `exp` claim (seconds since epoch) from a three-segment token.
///
/// Returns `None` for anything that is not a well-formed token carrying
/// a numeric `exp` claim.
#[must_use]
pub fn decode_expiry(token: &str) -> Option<i64> {
    let mut segments = token.split('.');
    let _header = segments.next()?;
    let payload = segments.next()?;
    let _signature = segments.next()?;
    if segments.next().is_some() {
        return None;
    }

    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    claims.get("exp")?.as_i64()
}

/// Whether `token` carries an `exp` claim strictly in the future.
///
/// `now_ms` is the current time in milliseconds since epoch; the claim
/// is expressed in seconds, so the comparison happens in whole seconds
/// to stay overflow-free for any `exp` an i64 can hold. Malformed
/// tokens are simply invalid.
#[must_use]
pub fn is_token_valid(token: &str, now_ms: i64) -> bool {
    decode_expiry(token).is_some_and(|exp| exp > now_ms / 1000)
}
