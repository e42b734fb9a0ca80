//! Token claims and token-pair types.
//!
//! A minted token carries the claim set defined here in its payload part.
//! The claim set is self-contained: a verifier needs nothing beyond the
//! signing-key registry to interpret it.

use std::{collections::BTreeMap, fmt, time::Duration};

use serde::{Deserialize, Serialize};

/// Token type, carried in the `"type"` claim.
///
/// The type determines the default lifetime at mint time and is enforced
/// by [`refresh`](crate::token::TokenService::refresh), which only accepts
/// refresh tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Short-lived token presented on each authenticated request.
    Access,
    /// Long-lived token exchanged for a fresh token pair.
    Refresh,
}

impl TokenType {
    /// Returns the wire name of this token type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claim set carried by a minted token.
///
/// Tokens are immutable bearer credentials: once minted a claim set is never
/// mutated, only verified or allowed to expire.
///
/// ```json
/// {
///   "sub": "user:8412",
///   "iat": 1234567800,
///   "exp": 1234569600,
///   "type": "access",
///   "jti": "Zk3mPq1Tt9w",
///   "role": "operator"
/// }
/// ```
///
/// Fields beyond the fixed five land in [`custom`](Self::custom) via serde
/// flattening; values are restricted to JSON scalars by convention, not by
/// the type system.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject - the identity this token was minted for.
    pub sub: String,
    /// Issued at (seconds since epoch).
    pub iat: u64,
    /// Expiration time (seconds since epoch).
    pub exp: u64,
    /// Token type (access or refresh).
    #[serde(rename = "type")]
    pub token_type: TokenType,
    /// Token ID - random per mint, consumed by single-use refresh rotation.
    pub jti: String,
    /// Caller-supplied claims (open extension point).
    #[serde(flatten)]
    pub custom: BTreeMap<String, serde_json::Value>,
}

impl TokenClaims {
    /// Returns a custom claim by name, if present.
    #[must_use]
    pub fn custom_claim(&self, name: &str) -> Option<&serde_json::Value> {
        self.custom.get(name)
    }

    /// Remaining lifetime relative to `now` (seconds since epoch).
    ///
    /// Returns [`Duration::ZERO`] for tokens at or past expiry.
    #[must_use]
    pub fn expires_in(&self, now: u64) -> Duration {
        Duration::from_secs(self.exp.saturating_sub(now))
    }
}

/// Access/refresh token pair returned at login and on refresh.
///
/// # JSON Format
///
/// ```json
/// {
///   "access_token": "eyJhbGciOiJIUzI1NiIs...",
///   "refresh_token": "eyJhbGciOiJIUzI1NiIs..."
/// }
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived access token.
    pub access_token: String,
    /// Long-lived refresh token.
    pub refresh_token: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample_claims() -> TokenClaims {
        TokenClaims {
            sub: "user:8412".into(),
            iat: 1_700_000_000,
            exp: 1_700_001_800,
            token_type: TokenType::Access,
            jti: "jti-sample".into(),
            custom: BTreeMap::from([("role".to_string(), json!("operator"))]),
        }
    }

    #[test]
    fn test_token_type_wire_names() {
        assert_eq!(TokenType::Access.as_str(), "access");
        assert_eq!(TokenType::Refresh.as_str(), "refresh");
        assert_eq!(TokenType::Refresh.to_string(), "refresh");
    }

    #[test]
    fn test_type_claim_serialized_as_type() {
        let json = serde_json::to_value(sample_claims()).unwrap();
        assert_eq!(json.get("type"), Some(&json!("access")));
        // The Rust field name must not leak onto the wire
        assert!(json.get("token_type").is_none());
    }

    #[test]
    fn test_custom_claims_flattened() {
        let json = serde_json::to_value(sample_claims()).unwrap();
        assert_eq!(json.get("role"), Some(&json!("operator")));
    }

    #[test]
    fn test_custom_claim_accessor() {
        let claims = sample_claims();
        assert_eq!(claims.custom_claim("role"), Some(&json!("operator")));
        assert!(claims.custom_claim("absent").is_none());
    }

    #[test]
    fn test_expires_in() {
        let claims = sample_claims();
        assert_eq!(claims.expires_in(1_700_000_000), Duration::from_secs(1800));
        assert_eq!(claims.expires_in(claims.exp), Duration::ZERO);
        assert_eq!(claims.expires_in(claims.exp + 100), Duration::ZERO);
    }

    #[test]
    fn test_deserialize_from_known_json() {
        let json = r#"{
            "sub": "svc:billing",
            "iat": 1700000000,
            "exp": 1700604800,
            "type": "refresh",
            "jti": "abc123",
            "tenant": "acme",
            "admin": true
        }"#;

        let claims: TokenClaims = serde_json::from_str(json).unwrap();
        assert_eq!(claims.sub, "svc:billing");
        assert_eq!(claims.token_type, TokenType::Refresh);
        assert_eq!(claims.custom_claim("tenant"), Some(&json!("acme")));
        assert_eq!(claims.custom_claim("admin"), Some(&json!(true)));
    }

    mod proptests {
        use proptest::prelude::*;

        use super::*;

        /// Strategy for generating valid `TokenClaims` with arbitrary
        /// scalar custom claims.
        fn arb_token_claims() -> impl Strategy<Value = TokenClaims> {
            (
                "[a-zA-Z0-9:_-]{1,64}",                             // sub
                1_000_000_000u64..2_000_000_000u64,                 // iat
                1_000_000_000u64..2_000_000_000u64,                 // exp
                prop_oneof![Just(TokenType::Access), Just(TokenType::Refresh)],
                "[a-zA-Z0-9_-]{1,32}",                              // jti
                proptest::collection::btree_map(
                    // Custom claim names must not collide with the fixed
                    // claims, which flattening would silently shadow.
                    "[a-z]{1,12}".prop_filter("reserved claim name", |k| {
                        !matches!(k.as_str(), "sub" | "iat" | "exp" | "type" | "jti")
                    }),
                    prop_oneof![
                        "[a-zA-Z0-9 ]{0,24}".prop_map(serde_json::Value::from),
                        any::<i64>().prop_map(serde_json::Value::from),
                        any::<bool>().prop_map(serde_json::Value::from),
                    ],
                    0..4,
                ),
            )
                .prop_map(|(sub, iat, exp, token_type, jti, custom)| TokenClaims {
                    sub,
                    iat,
                    exp,
                    token_type,
                    jti,
                    custom,
                })
        }

        proptest! {
            /// Serializing then deserializing any valid claim set must
            /// produce an identical struct.
            #[test]
            fn claims_serde_round_trip(claims in arb_token_claims()) {
                let json = serde_json::to_string(&claims).expect("serialize should succeed");
                let deserialized: TokenClaims =
                    serde_json::from_str(&json).expect("deserialize should succeed");
                prop_assert_eq!(deserialized, claims);
            }

            /// The fixed claims must always be present in the JSON output.
            #[test]
            fn claims_serialize_fixed_fields_present(claims in arb_token_claims()) {
                let json = serde_json::to_string(&claims).expect("serialize should succeed");
                let parsed: serde_json::Value =
                    serde_json::from_str(&json).expect("output must be valid JSON");
                prop_assert!(parsed.get("sub").is_some());
                prop_assert!(parsed.get("iat").is_some());
                prop_assert!(parsed.get("exp").is_some());
                prop_assert!(parsed.get("type").is_some());
                prop_assert!(parsed.get("jti").is_some());
            }
        }
    }
}
