//! The access/refresh credential pair.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The `{access token, refresh token}` tuple.
///
/// Both tokens are opaque to the client. The pair is atomic: it is only ever
/// committed or cleared as a whole, together with the [`Identity`] it was
/// issued for.
///
/// `Debug` never prints token material.
///
/// [`Identity`]: crate::Identity
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl CredentialPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }

    /// Best-effort expiry of the access token.
    ///
    /// When the access token happens to be a JWT, its payload segment is
    /// decoded (without signature verification; the backend remains the
    /// authority) to read the `exp` claim. Anything that does not decode is
    /// treated as an opaque token with unknown expiry.
    pub fn access_expires_at(&self) -> Option<DateTime<Utc>> {
        let payload = self.access_token.split('.').nth(1)?;
        let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
        let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
        let exp = claims.get("exp")?.as_i64()?;
        DateTime::from_timestamp(exp, 0)
    }

    /// Whether the access token is known to be expired at `now`.
    ///
    /// Unknown expiry reads as "not expired" — the 401/refresh path decides.
    pub fn is_access_expired(&self, now: DateTime<Utc>) -> bool {
        self.access_expires_at().is_some_and(|exp| now >= exp)
    }
}

impl core::fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CredentialPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn jwt_with_exp(exp: i64) -> String {
        let payload = URL_SAFE_NO_PAD.encode(serde_json::json!({ "exp": exp }).to_string());
        format!("eyJhbGciOiJIUzI1NiJ9.{payload}.sig")
    }

    #[test]
    fn wire_form_is_camel_case() {
        let pair: CredentialPair =
            serde_json::from_str(r#"{"accessToken":"a","refreshToken":"r"}"#).unwrap();
        assert_eq!(pair.access_token, "a");
        assert_eq!(pair.refresh_token, "r");
    }

    #[test]
    fn reads_exp_claim_without_verification() {
        let exp = Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap();
        let pair = CredentialPair::new(jwt_with_exp(exp.timestamp()), "r");
        assert_eq!(pair.access_expires_at(), Some(exp));
        assert!(pair.is_access_expired(exp + chrono::Duration::seconds(1)));
        assert!(!pair.is_access_expired(exp - chrono::Duration::seconds(1)));
    }

    #[test]
    fn opaque_tokens_have_unknown_expiry() {
        let pair = CredentialPair::new("not-a-jwt", "r");
        assert_eq!(pair.access_expires_at(), None);
        assert!(!pair.is_access_expired(Utc::now()));
    }

    #[test]
    fn debug_redacts_token_material() {
        let pair = CredentialPair::new("secret-access", "secret-refresh");
        let rendered = format!("{pair:?}");
        assert!(!rendered.contains("secret-access"));
        assert!(!rendered.contains("secret-refresh"));
    }
}
