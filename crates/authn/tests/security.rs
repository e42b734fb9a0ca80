//! Security-focused token service tests.
//!
//! These tests verify the token pipeline's resistance to common attack
//! vectors: algorithm substitution, header/claims/signature tampering,
//! expired tokens, forged key ids, key rotation during active use, and
//! malformed token structures.
#![allow(clippy::expect_used, clippy::panic)]

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use gravity_common_authn::{
    assert_auth_error,
    claims::TokenType,
    error::AuthError,
    keyring::SigningKey,
    refresh::InMemoryRefreshLog,
    testutil::{craft_raw_token, test_token_service},
    token::TokenService,
};
use serde_json::json;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Mint an access token carrying one custom claim.
fn mint_access(service: &TokenService) -> String {
    let custom = BTreeMap::from([("role".to_string(), json!("operator"))]);
    service.mint("user:8412", TokenType::Access, custom, None).expect("mint should succeed")
}

/// Flip one character of a token, staying inside the base64url alphabet so
/// the change survives decoding and must be caught by the signature check.
fn flip_char(token: &str, index: usize) -> String {
    let mut bytes = token.as_bytes().to_vec();
    bytes[index] = if bytes[index] == b'A' { b'B' } else { b'A' };
    String::from_utf8(bytes).expect("flip stays ASCII")
}

/// Byte ranges of the three token parts within the full token string.
fn part_ranges(token: &str) -> [std::ops::Range<usize>; 3] {
    let first_dot = token.find('.').expect("token has two dots");
    let second_dot = token[first_dot + 1..].find('.').expect("token has two dots") + first_dot + 1;
    [0..first_dot, first_dot + 1..second_dot, second_dot + 1..token.len()]
}

// ===========================================================================
// 1. Round-trip: claims survive mint → verify unchanged
// ===========================================================================

#[test]
fn test_round_trip_preserves_subject_and_custom_claims() {
    let service = test_token_service("rt-key");
    let custom = BTreeMap::from([
        ("role".to_string(), json!("operator")),
        ("tenant".to_string(), json!("acme")),
        ("quota".to_string(), json!(250)),
    ]);

    let token =
        service.mint("user:8412", TokenType::Access, custom.clone(), None).expect("mint");
    let claims = service.verify(&token).expect("verify before expiry");

    assert_eq!(claims.sub, "user:8412");
    assert_eq!(claims.token_type, TokenType::Access);
    assert_eq!(claims.custom, custom);
}

// ===========================================================================
// 2. Tamper sensitivity: every single-character change is rejected
// ===========================================================================

#[test]
fn test_signature_tampering_rejected_at_every_position() {
    let service = test_token_service("sig-key");
    let token = mint_access(&service);
    let [_, _, sig] = part_ranges(&token);

    for index in sig.clone() {
        let tampered = flip_char(&token, index);
        let result = service.verify(&tampered);

        if index < sig.end - 1 {
            assert!(
                matches!(result, Err(AuthError::InvalidSignature)),
                "flip at {index} should fail signature check, got: {result:?}"
            );
        } else {
            // The final character carries base64 trailing bits; a flip there
            // may be rejected as non-canonical encoding before the HMAC
            // comparison runs. Either rejection path is fine.
            assert!(
                matches!(
                    result,
                    Err(AuthError::InvalidSignature) | Err(AuthError::InvalidTokenFormat { .. })
                ),
                "flip at {index} should be rejected, got: {result:?}"
            );
        }
    }
}

#[test]
fn test_claims_tampering_rejected_at_every_position() {
    let service = test_token_service("claims-key");
    let token = mint_access(&service);
    let [_, payload, _] = part_ranges(&token);

    // The signature covers the encoded payload text, so any change fails
    // the signature comparison before claims are even decoded.
    for index in payload {
        let tampered = flip_char(&token, index);
        let result = service.verify(&tampered);
        assert!(
            matches!(result, Err(AuthError::InvalidSignature)),
            "flip at {index} should fail signature check, got: {result:?}"
        );
    }
}

#[test]
fn test_claims_substitution_rejected() {
    // Swap the payload wholesale for one claiming a different subject,
    // keeping the original header and signature.
    let service = test_token_service("subst-key");
    let token = mint_access(&service);
    let parts: Vec<&str> = token.split('.').collect();

    let payload_bytes = URL_SAFE_NO_PAD.decode(parts[1]).expect("payload decodes");
    let mut payload: serde_json::Value =
        serde_json::from_slice(&payload_bytes).expect("payload parses");
    payload["sub"] = json!("user:admin");

    let forged_payload =
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(&payload).expect("payload re-encodes"));
    let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

    let result = service.verify(&forged);
    assert_auth_error!(result, InvalidSignature);
}

#[test]
fn test_header_tampering_rejected_at_every_position() {
    let service = test_token_service("hdr-key");
    let token = mint_access(&service);
    let [header, _, _] = part_ranges(&token);

    for index in header {
        let tampered = flip_char(&token, index);
        assert!(
            service.verify(&tampered).is_err(),
            "header flip at {index} must not be accepted"
        );
    }
}

// ===========================================================================
// 3. Expiry boundary: zero-TTL token fails from issued_at onward
// ===========================================================================

#[test]
fn test_zero_ttl_token_rejected_at_issue_time() {
    let service = test_token_service("exp-key");

    let token = service
        .mint("user:8412", TokenType::Access, BTreeMap::new(), Some(Duration::ZERO))
        .expect("mint");

    let result = service.verify(&token);
    assert_auth_error!(result, TokenExpired);
}

#[test]
fn test_expired_token_distinguished_from_tampered() {
    let service = test_token_service("exp-key-2");

    let expired = service
        .mint("u", TokenType::Access, BTreeMap::new(), Some(Duration::ZERO))
        .expect("mint");
    let valid = mint_access(&service);
    let tampered = {
        let [_, _, sig] = part_ranges(&valid);
        flip_char(&valid, sig.start)
    };

    assert_auth_error!(service.verify(&expired), TokenExpired);
    assert_auth_error!(service.verify(&tampered), InvalidSignature);
}

// ===========================================================================
// 4. Key rotation: old tokens survive rotation, die on purge
// ===========================================================================

#[test]
fn test_rotation_keeps_outstanding_tokens_valid() {
    let service = test_token_service("key-a");
    let token = mint_access(&service);

    service.rotate(SigningKey::generate("key-b")).expect("rotate");

    let claims = service.verify(&token).expect("token under retired key still verifies");
    assert_eq!(claims.sub, "user:8412");
}

#[test]
fn test_purged_key_fails_outstanding_tokens() {
    let service = test_token_service("key-a");
    let token = mint_access(&service);

    service.rotate(SigningKey::generate("key-b")).expect("rotate");
    service.key_ring().purge("key-a").expect("purge");

    let result = service.verify(&token);
    assert_auth_error!(result, KeyNotFound, "purged key must surface as unknown");
}

#[test]
fn test_forged_kid_rejected() {
    let service = test_token_service("real-key");
    let now = Utc::now().timestamp() as u64;

    let header = json!({"typ": "JWT", "alg": "HS256", "kid": "forged-key"});
    let payload = json!({
        "sub": "user:8412",
        "iat": now,
        "exp": now + 3600,
        "type": "access",
        "jti": "forged",
    });
    let token = craft_raw_token(&header, &payload);

    let result = service.verify(&token);
    assert_auth_error!(result, KeyNotFound);
}

#[test]
fn test_concurrent_verification_during_rotation() {
    use std::thread;

    let service = Arc::new(test_token_service("key-0"));
    // Long-lived token minted under the initial key; rotation must never
    // make it fail before the key is purged.
    let token = mint_access(&service);

    let verifiers: Vec<_> = (0..4)
        .map(|_| {
            let service = Arc::clone(&service);
            let token = token.clone();
            thread::spawn(move || {
                for _ in 0..200 {
                    service.verify(&token).expect("rotation must not break verification");
                }
            })
        })
        .collect();

    for i in 1..=8 {
        service.rotate(SigningKey::generate(&format!("key-{i}"))).expect("rotate");
    }

    for handle in verifiers {
        handle.join().expect("verifier thread");
    }
}

// ===========================================================================
// 5. Algorithm substitution and confusion
// ===========================================================================

#[test]
fn test_algorithm_none_rejected() {
    let service = test_token_service("none-key");
    let now = Utc::now().timestamp() as u64;

    let header = json!({"typ": "JWT", "alg": "none", "kid": "none-key"});
    let payload = json!({
        "sub": "user:8412",
        "iat": now,
        "exp": now + 3600,
        "type": "access",
        "jti": "none-jti",
    });
    let token = craft_raw_token(&header, &payload);

    // `jsonwebtoken` has no `none` variant, so the header fails to parse;
    // the security property is that the token never reaches verification.
    let result = service.verify(&token);
    assert!(
        matches!(
            result,
            Err(AuthError::UnsupportedAlgorithm { .. })
                | Err(AuthError::InvalidTokenFormat { .. })
        ),
        "alg 'none' must be rejected, got: {result:?}"
    );
}

#[test]
fn test_asymmetric_algorithm_rejected_before_key_lookup() {
    let service = test_token_service("asym-key");
    let now = Utc::now().timestamp() as u64;

    // kid intentionally references a key that does not exist: the rejection
    // must come from the algorithm allow-list, not from key lookup.
    let header = json!({"typ": "JWT", "alg": "EdDSA", "kid": "missing-key"});
    let payload = json!({
        "sub": "user:8412",
        "iat": now,
        "exp": now + 3600,
        "type": "access",
        "jti": "eddsa-jti",
    });
    let token = craft_raw_token(&header, &payload);

    let result = service.verify(&token);
    assert_auth_error!(result, UnsupportedAlgorithm);
}

#[test]
fn test_hmac_family_downgrade_rejected() {
    // Re-sign with HS384 using the service's own HS256 secret: the kid
    // resolves, but verification pins the algorithm recorded on the key.
    let service = test_token_service("family-key");
    let snapshot = service.key_ring().snapshot();
    let key = snapshot.active().expect("active key");

    let now = Utc::now().timestamp() as u64;
    let claims = json!({
        "sub": "user:8412",
        "iat": now,
        "exp": now + 3600,
        "type": "access",
        "jti": "hs384-jti",
    });
    let mut header = jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS384);
    header.kid = Some(key.kid.clone());
    let encoding_key = jsonwebtoken::EncodingKey::from_secret(&key.secret);
    let token = jsonwebtoken::encode(&header, &claims, &encoding_key).expect("encode");

    let result = service.verify(&token);
    assert_auth_error!(result, UnsupportedAlgorithm);
}

#[test]
fn test_path_traversal_kid_rejected_before_lookup() {
    let service = test_token_service("kid-key");
    let now = Utc::now().timestamp() as u64;

    let header = json!({"typ": "JWT", "alg": "HS256", "kid": "../../../etc/passwd"});
    let payload = json!({
        "sub": "x",
        "iat": now,
        "exp": now + 3600,
        "type": "access",
        "jti": "x",
    });
    let token = craft_raw_token(&header, &payload);

    let result = service.verify(&token);
    assert_auth_error!(result, InvalidTokenFormat);
}

// ===========================================================================
// 6. Refresh flow: type enforcement and single-use rotation
// ===========================================================================

#[test]
fn test_access_token_rejected_by_refresh() {
    let service = test_token_service("type-key");
    let token = mint_access(&service);

    let result = service.refresh(&token);
    assert_auth_error!(result, WrongTokenType);
}

#[test]
fn test_refresh_token_rotation_is_single_use() {
    let service = {
        let base = test_token_service("su-key");
        base.with_refresh_log(Arc::new(InMemoryRefreshLog::new(1000)))
    };

    let pair = service.issue_pair("user:8412", BTreeMap::new()).expect("issue pair");

    let new_pair = service.refresh(&pair.refresh_token).expect("first exchange");
    service.verify(&new_pair.access_token).expect("new access token verifies");

    let result = service.refresh(&pair.refresh_token);
    assert_auth_error!(result, RefreshReused, "second exchange must be rejected");

    // The replacement refresh token is unaffected
    service.refresh(&new_pair.refresh_token).expect("replacement token exchanges");
}

// ===========================================================================
// 7. Malformed token structures must never panic
// ===========================================================================

#[test]
fn test_malformed_tokens_rejected_without_panic() {
    let service = test_token_service("fuzz-key");

    let inputs = [
        "",
        ".",
        "..",
        "...",
        "not-a-token",
        "!!!.!!!.!!!",
        "a]]]].b.c",
        "eyJhbGciOiJIUzI1NiJ9\n.eyJzdWIiOiJ4In0\n.",
    ];
    for input in inputs {
        let result = service.verify(input);
        assert!(result.is_err(), "input {input:?} must be rejected");
    }
}

#[test]
fn test_oversized_payload_rejected_without_panic() {
    let service = test_token_service("big-key");
    let now = Utc::now().timestamp() as u64;

    let big_sub = "A".repeat(100_000);
    let header = json!({"typ": "JWT", "alg": "HS256", "kid": "big-key"});
    let payload = json!({
        "sub": big_sub,
        "iat": now,
        "exp": now + 3600,
        "type": "access",
        "jti": "big",
    });
    let token = craft_raw_token(&header, &payload);

    // Signature is empty, so this must fail; the point is no panic on size.
    assert!(service.verify(&token).is_err());
}

#[test]
fn test_extreme_timestamps_rejected_without_panic() {
    let service = test_token_service("ts-key");

    let header = json!({"typ": "JWT", "alg": "HS256", "kid": "ts-key"});
    let payload = json!({
        "sub": "x",
        "iat": u64::MAX,
        "exp": u64::MAX,
        "type": "access",
        "jti": "x",
    });
    let token = craft_raw_token(&header, &payload);
    assert!(service.verify(&token).is_err());

    let payload = json!({
        "sub": "x",
        "iat": 0,
        "exp": 0,
        "type": "access",
        "jti": "x",
    });
    let token = craft_raw_token(&header, &payload);
    assert!(service.verify(&token).is_err());
}
