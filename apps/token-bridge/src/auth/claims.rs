//! Claim types on both sides of the exchange.
//!
//! `InboundClaims` is a lenient, type-checked view of the identity provider's
//! token: wrongly typed or blank values become `None` instead of failing the
//! whole decode. `SanitizedClaims` is the exact claim set placed on session
//! tokens; nothing outside its fields is ever forwarded.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use unicode_normalization::UnicodeNormalization;

use crate::auth::subject::LocalSubjectId;
use crate::state::security_config::AUTHENTICATED;

/// Claims read from a verified inbound token. Unknown claims are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundClaims {
    #[serde(default, deserialize_with = "lenient_string")]
    pub sub: Option<String>,
    /// Fallback subject some provider tokens carry instead of `sub`
    #[serde(default, deserialize_with = "lenient_string")]
    pub nameid: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub given_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub family_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub exp: Option<u64>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub nbf: Option<u64>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub iat: Option<u64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub iss: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub jti: Option<String>,
}

impl InboundClaims {
    /// External subject: `sub`, falling back to `nameid`.
    pub fn external_subject(&self) -> Option<&str> {
        self.sub.as_deref().or(self.nameid.as_deref())
    }

    /// Email normalized for storage and comparison (trimmed, NFKC, lowercase).
    pub fn normalized_email(&self) -> Option<String> {
        self.email
            .as_deref()
            .map(normalize_email)
            .filter(|e| !e.is_empty())
    }
}

/// Profile fields carried under `user_metadata`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMetadata {
    /// Subject id as issued by the identity provider
    pub outseta_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

/// The complete claim set of a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizedClaims {
    pub aud: String,
    pub iss: String,
    pub sub: String,
    pub email: String,
    pub role: String,
    pub iat: u64,
    pub exp: u64,
    pub user_metadata: UserMetadata,
}

impl SanitizedClaims {
    /// Project verified inbound claims onto the allow-list.
    ///
    /// `external_subject`, `email` and `exp` are passed already resolved so
    /// that absence has been reported as a typed error by the caller.
    pub fn project(
        inbound: &InboundClaims,
        local_subject: &LocalSubjectId,
        external_subject: &str,
        email: String,
        issuer: &str,
        iat: u64,
        exp: u64,
    ) -> Self {
        Self {
            aud: AUTHENTICATED.to_string(),
            iss: issuer.to_string(),
            sub: local_subject.to_string(),
            email,
            role: AUTHENTICATED.to_string(),
            iat,
            exp,
            user_metadata: UserMetadata {
                outseta_id: external_subject.to_string(),
                full_name: inbound.name.clone(),
                first_name: inbound.given_name.clone(),
                last_name: inbound.family_name.clone(),
            },
        }
    }
}

/// Normalize an email address (trim, NFKC, lowercase).
pub fn normalize_email(email: &str) -> String {
    email.trim().nfkc().collect::<String>().to_lowercase()
}

/// Blank strings and non-string values read as absent. Non-blank values are
/// kept byte for byte, so `" u1 "` and `"u1"` stay distinct subjects.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        _ => None,
    })
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::auth::subject::SubjectMapping;

    use super::*;

    #[test]
    fn malformed_claims_are_dropped_not_fatal() {
        let claims: InboundClaims = serde_json::from_value(json!({
            "sub": "user-123",
            "email": "A@B.com",
            "given_name": 42,
            "family_name": {"nested": true},
            "name": "",
            "exp": 1700000000.0,
            "iat": "1699990000",
            "outseta:accountUid": "acc-1",
            "outseta:isPrimary": "1"
        }))
        .unwrap();

        assert_eq!(claims.sub.as_deref(), Some("user-123"));
        assert_eq!(claims.given_name, None);
        assert_eq!(claims.family_name, None);
        assert_eq!(claims.name, None);
        assert_eq!(claims.exp, Some(1_700_000_000));
        assert_eq!(claims.iat, Some(1_699_990_000));
    }

    #[test]
    fn subject_falls_back_to_nameid() {
        let claims: InboundClaims =
            serde_json::from_value(json!({"nameid": "person-7", "sub": ""})).unwrap();
        assert_eq!(claims.external_subject(), Some("person-7"));

        let both: InboundClaims =
            serde_json::from_value(json!({"nameid": "person-7", "sub": "person-8"})).unwrap();
        assert_eq!(both.external_subject(), Some("person-8"));

        let neither: InboundClaims = serde_json::from_value(json!({})).unwrap();
        assert_eq!(neither.external_subject(), None);
    }

    #[test]
    fn padded_subject_is_not_collapsed() {
        let plain: InboundClaims = serde_json::from_value(json!({"sub": "user-123"})).unwrap();
        let padded: InboundClaims = serde_json::from_value(json!({"sub": " user-123 "})).unwrap();
        assert_eq!(padded.external_subject(), Some(" user-123 "));

        let mapping = SubjectMapping::default();
        assert_ne!(
            mapping.local_subject_id(plain.external_subject().unwrap()).unwrap(),
            mapping.local_subject_id(padded.external_subject().unwrap()).unwrap()
        );

        let blank: InboundClaims = serde_json::from_value(json!({"sub": "   "})).unwrap();
        assert_eq!(blank.external_subject(), None);
    }

    #[test]
    fn email_is_normalized() {
        let claims: InboundClaims =
            serde_json::from_value(json!({"email": "  Jane.Doe@Example.COM "})).unwrap();
        assert_eq!(
            claims.normalized_email().as_deref(),
            Some("jane.doe@example.com")
        );
    }

    #[test]
    fn user_metadata_omits_absent_profile_fields() {
        let metadata = UserMetadata {
            outseta_id: "ext".to_string(),
            full_name: None,
            first_name: Some("Ada".to_string()),
            last_name: None,
        };
        let value = serde_json::to_value(&metadata).unwrap();
        assert_eq!(value, json!({"outseta_id": "ext", "first_name": "Ada"}));
    }
}
