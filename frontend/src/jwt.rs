//! Local liveness check for bearer tokens.
//!
//! The signature is not verified: the backend does that on every request.
//! This only avoids calling `/user` with a token that is obviously dead.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use log::warn;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default)]
    exp: Option<serde_json::Value>,
}

/// Current wall-clock time in Unix seconds.
pub fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Splits `token` into its three segments, or `None` if it is not JWT-shaped.
fn segments(token: &str) -> Option<[&str; 3]> {
    let mut parts = token.split('.');
    let (header, payload, signature) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() || payload.is_empty() {
        return None;
    }
    Some([header, payload, signature])
}

/// Expiry claim of `token`, if it decodes.
pub fn expiry(token: &str) -> Option<f64> {
    let [_, payload, _] = segments(token)?;

    let bytes = match URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("failed to decode token payload: {e}");
            return None;
        }
    };
    let claims: Claims = match serde_json::from_slice(&bytes) {
        Ok(claims) => claims,
        Err(e) => {
            warn!("failed to parse token claims: {e}");
            return None;
        }
    };

    claims.exp.as_ref().and_then(serde_json::Value::as_f64)
}

/// `true` iff `token` is JWT-shaped and its `exp` lies strictly after `now`.
pub fn is_valid_at(token: Option<&str>, now: i64) -> bool {
    let Some(token) = token.filter(|t| !t.is_empty()) else {
        return false;
    };
    if segments(token).is_none() {
        warn!("invalid token format (missing parts)");
        return false;
    }
    expiry(token).is_some_and(|exp| exp > now as f64)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    const NOW: i64 = 1_750_000_000;

    /// Unsigned test token carrying `claims`.
    pub(crate) fn token_with(claims: serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{header}.{payload}.c2lnbmF0dXJl")
    }

    #[test]
    fn missing_or_empty_tokens_are_invalid() {
        assert!(!is_valid_at(None, NOW));
        assert!(!is_valid_at(Some(""), NOW));
    }

    #[test]
    fn fewer_than_three_segments_is_invalid() {
        let full = token_with(json!({ "exp": NOW + 60 }));
        let two: Vec<&str> = full.splitn(3, '.').take(2).collect();

        for candidate in ["abc", "abc.def", two.join(".").as_str(), "..", "a..c"] {
            assert!(!is_valid_at(Some(candidate), NOW), "{candidate:?}");
        }
        assert!(!is_valid_at(Some(&format!("{full}.extra")), NOW));
    }

    #[test]
    fn expiry_boundary_is_strict() {
        assert!(!is_valid_at(Some(&token_with(json!({ "exp": NOW - 1 }))), NOW));
        assert!(!is_valid_at(Some(&token_with(json!({ "exp": NOW }))), NOW));
        assert!(is_valid_at(Some(&token_with(json!({ "exp": NOW + 1 }))), NOW));
    }

    #[test]
    fn claims_without_numeric_exp_are_invalid() {
        assert!(!is_valid_at(Some(&token_with(json!({ "sub": 1 }))), NOW));
        assert!(!is_valid_at(Some(&token_with(json!({ "exp": "tomorrow" }))), NOW));
    }

    #[test]
    fn undecodable_payload_is_invalid_without_panicking() {
        assert!(!is_valid_at(Some("aGVhZGVy.!!!not-base64!!!.sig"), NOW));
        let not_json = URL_SAFE_NO_PAD.encode("not json");
        assert!(!is_valid_at(Some(&format!("aGVhZGVy.{not_json}.sig")), NOW));
    }

    #[test]
    fn only_the_payload_segment_must_be_filled() {
        let payload = URL_SAFE_NO_PAD.encode(json!({ "exp": NOW + 60 }).to_string());
        assert!(is_valid_at(Some(&format!(".{payload}.sig")), NOW));
        assert!(is_valid_at(Some(&format!("aGVhZGVy.{payload}.")), NOW));
        assert!(is_valid_at(Some(&format!(".{payload}.")), NOW));
    }

    #[test]
    fn padded_payload_is_tolerated() {
        let payload = base64::engine::general_purpose::URL_SAFE.encode(json!({ "exp": NOW + 5 }).to_string());
        let token = format!("aGVhZGVy.{payload}.sig");
        assert!(is_valid_at(Some(&token), NOW));
    }
}
