//! A fake identity provider for tests.
//!
//! Two fixed RSA-2048 keys stand in for the provider's current and rotated
//! signing keys. Tokens are minted with RS256 and the matching public halves
//! are published as a JWKS.

use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};

const PRIMARY_PEM: &str = include_str!("../fixtures/issuer_primary.pem");
const ROTATED_PEM: &str = include_str!("../fixtures/issuer_rotated.pem");

const PRIMARY_N: &str = "v-1nEO8XcR33q9BFFbVOb-80f6v6JX5O48v4XVFMfAz9s9Lvg25eYLf4fg4-skAdLuUc4UUm-d2qX2gm7KsZ8NMhXzuQybyUY10-n7i5IwywlXnWyhRNSVEG-cbk7A6ufQLgmfomQf52yxO_rcdu_0ASuzfw2T_YgTQqUn9KcSYmgQq1R6sCIoLnzbMEe9KG3pCz7d3utLay4c8z-XXqkORepGW6cm63oiRr9w9-JACJB28nVa54-cRSLUOSe4_A1D-TXzF4peVkmDSaMlA92rmnqrr4nxiIetaRkSLFW2eupPL_aViV8gWyvh1_DNUuXANxyuw5qyLfALeZWu98hQ";
const ROTATED_N: &str = "pN4zbKDp87MQMnpgR-jBQ3FXanhapswkYgmk_NCJP5ENaTYr_cmc_NQmDSpL3JJDieP8IWnbjkLXUMlokI8aqlZwZbCSKOlCoFSCqtsnBQcXNUxO5sRpv_QO2MFluHuF0618yPKkkgvD34mtOscxJTd8D-pydRlqaknwKSHs-0-XNqypdnRoW0vMmC01zOVtgrYEOJTWquY5UO4tddmAhlNtG0mEHzH-gzoGP4JxkzViZU-Gr0vR6Ue3KA8x0QkKbvoBDKPtkY9RVLef6XuCdCJC18DGsC35ym_FII9c0dZ40ifHdmdunO1gvLlLkJLQuaVjaoARBTWCvjIHaA7cIw";
const EXPONENT: &str = "AQAB";

#[derive(Debug, Clone)]
pub struct TestIssuer {
    pem: &'static str,
    modulus: &'static str,
    kid: String,
}

impl TestIssuer {
    pub const PRIMARY_KID: &'static str = "primary-2024";
    pub const ROTATED_KID: &'static str = "rotated-2025";

    pub fn primary() -> Self {
        Self {
            pem: PRIMARY_PEM,
            modulus: PRIMARY_N,
            kid: Self::PRIMARY_KID.to_string(),
        }
    }

    pub fn rotated() -> Self {
        Self {
            pem: ROTATED_PEM,
            modulus: ROTATED_N,
            kid: Self::ROTATED_KID.to_string(),
        }
    }

    /// Same key, different `kid` in minted headers and the published JWK.
    pub fn with_kid(mut self, kid: impl Into<String>) -> Self {
        self.kid = kid.into();
        self
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// Public JWK for this key.
    pub fn jwk_json(&self) -> Value {
        json!({
            "kty": "RSA",
            "kid": self.kid,
            "use": "sig",
            "alg": "RS256",
            "n": self.modulus,
            "e": EXPONENT,
        })
    }

    /// JWKS document publishing only this key.
    pub fn jwks_json(&self) -> Value {
        jwks_json(&[self])
    }

    pub fn jwk_set(&self) -> JwkSet {
        jwk_set(&[self])
    }

    /// RS256 token with this issuer's `kid`.
    pub fn mint(&self, claims: &Value) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.kid.clone());
        self.sign(header, claims)
    }

    pub fn mint_without_kid(&self, claims: &Value) -> String {
        self.sign(Header::new(Algorithm::RS256), claims)
    }

    fn sign(&self, header: Header, claims: &Value) -> String {
        let key = EncodingKey::from_rsa_pem(self.pem.as_bytes()).expect("fixture key is valid PEM");
        encode(&header, claims, &key).expect("fixture key signs")
    }

    /// HS256 token keyed with the primary key's public modulus, as in an
    /// algorithm-confusion attack.
    pub fn forge_hs256(kid: &str, claims: &Value) -> String {
        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some(kid.to_string());
        encode(
            &header,
            claims,
            &EncodingKey::from_secret(PRIMARY_N.as_bytes()),
        )
        .expect("HMAC signing cannot fail")
    }
}

pub fn jwks_json(issuers: &[&TestIssuer]) -> Value {
    json!({ "keys": issuers.iter().map(|i| i.jwk_json()).collect::<Vec<_>>() })
}

pub fn jwk_set(issuers: &[&TestIssuer]) -> JwkSet {
    serde_json::from_value(jwks_json(issuers)).expect("fixture JWKS parses")
}

/// Replace the payload of `token` with an attacker-chosen one, keeping the
/// original header and signature.
pub fn tamper_payload(token: &str) -> String {
    let donor = TestIssuer::rotated().mint(&json!({
        "sub": "attacker",
        "email": "attacker@evil.test",
        "exp": 4_102_444_800u64,
    }));

    let original: Vec<&str> = token.split('.').collect();
    let forged: Vec<&str> = donor.split('.').collect();
    assert_eq!(original.len(), 3, "token must be a compact JWS");

    format!("{}.{}.{}", original[0], forged[1], original[2])
}
