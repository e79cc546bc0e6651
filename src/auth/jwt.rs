//! Minimal JWT claim reading for token expiry.
//!
//! Signatures are not verified; the claim is only used to decide when a
//! cached token should be re-acquired.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};

/// `exp` claim of a JWT access token, if the token is a JWT and carries one
pub fn expiry(token: &str) -> Option<DateTime<Utc>> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    let exp = claims.get("exp")?.as_i64()?;
    DateTime::from_timestamp(exp, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt_with(claims: &str) -> String {
        format!(
            "{}.{}.sig",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"none"}"#),
            URL_SAFE_NO_PAD.encode(claims)
        )
    }

    #[test]
    fn test_reads_exp_claim() {
        let token = jwt_with(r#"{"aud":"https://contoso.example.com","exp":1700000000}"#);
        assert_eq!(expiry(&token), DateTime::from_timestamp(1_700_000_000, 0));
    }

    #[test]
    fn test_opaque_tokens_have_no_expiry() {
        assert_eq!(expiry("opaque-token"), None);
        assert_eq!(expiry(&jwt_with(r#"{"aud":"x"}"#)), None);
        assert_eq!(expiry("a.!!!.c"), None);
    }
}
