//! Security attack scenario tests
//!
//! Forged and downgraded tokens must fail at the signature stage, before
//! any claim content is looked at. Tests cover:
//! - Unsecured JWTs (`alg: none`, any letter case)
//! - HMAC confusion (public key used as an HS256 secret)
//! - Algorithm/key family mismatch (including EdDSA against RSA)
//! - Payload tampering and signature stripping
//! - Tokens signed by a different issuer key
//! - Valid signature with the wrong issuer
//!
//! # Security Standards
//! - RFC 8725: JSON Web Token Best Current Practice

mod common;

use common::*;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use oidc_token::{TokenErrorKind, TokenValidationEngine};
use serde_json::json;

fn access_kind(engine: &TokenValidationEngine, jwt: &str, cert_pem: &str) -> TokenErrorKind {
    engine
        .build_access_token(jwt, cert_pem, ISSUER, RESOURCE_SERVER, 0)
        .expect_err("attack token must be rejected")
        .kind()
}

/// Attack: strip the signature and declare `alg: none`
/// Defense: `none` is never an acceptable algorithm
#[test]
fn test_reject_none_algorithm_attack() {
    for alg in ["none", "None", "NONE"] {
        // GIVEN: An unsecured JWT with otherwise perfect claims
        let jwt = unsigned_jwt(alg, &scenario_claims());

        // WHEN: Built as an access token
        let kind = access_kind(&engine_at(1500), &jwt, &ES256_ISSUER.certificate_pem);

        // THEN: Rejected as an invalid signature, not as a claim problem
        assert_eq!(kind, TokenErrorKind::InvalidSignature, "alg {alg}");
    }
}

/// Attack: sign with HS256 using the public certificate as the secret
/// Defense: symmetric algorithms are refused outright
#[test]
fn test_reject_hmac_key_confusion() {
    // GIVEN: A token MACed with the trust certificate bytes
    let secret = ES256_ISSUER.certificate_pem.as_bytes();
    let jwt = encode(
        &Header::new(Algorithm::HS256),
        &scenario_claims(),
        &EncodingKey::from_secret(secret),
    )
    .unwrap();

    // WHEN / THEN: Refused, even with HS256 explicitly allowed
    let engine = engine_at(1500).with_algorithms(vec![Algorithm::HS256, Algorithm::ES256]);
    assert_eq!(
        access_kind(&engine, &jwt, &ES256_ISSUER.certificate_pem),
        TokenErrorKind::InvalidSignature
    );
}

/// Attack: relabel an ES256 token as RS256 against an EC certificate
/// Defense: the header algorithm must match the certificate key family
#[test]
fn test_reject_algorithm_key_mismatch() {
    let jwt = ES256_ISSUER.sign(&scenario_claims());
    let relabeled = with_header(&jwt, &json!({"alg": "RS256", "typ": "JWT"}));

    assert_eq!(
        access_kind(&engine_at(1500), &relabeled, &ES256_ISSUER.certificate_pem),
        TokenErrorKind::InvalidSignature
    );
}

/// Attack: present a genuine EdDSA token against an RSA trust certificate
/// Defense: an Ed25519 signature is never checked with an RSA key
#[test]
fn test_reject_eddsa_against_rsa_certificate() {
    let jwt = ED25519_ISSUER.sign(&scenario_claims());

    assert_eq!(
        access_kind(&engine_at(1500), &jwt, &RS256_ISSUER.certificate_pem),
        TokenErrorKind::InvalidSignature
    );
}

/// Attack: alter the payload (e.g. raise `exp`) and keep the signature
#[test]
fn test_reject_tampered_payload() {
    // GIVEN: A valid token whose exp is pushed far into the future
    let jwt = ES256_ISSUER.sign(&scenario_claims());
    let mut forged = scenario_claims();
    forged["exp"] = json!(9_999_999_999_i64);
    let tampered = with_payload(&jwt, &forged);

    // WHEN: Verified after the real expiry
    let kind = access_kind(&engine_at(5000), &tampered, &ES256_ISSUER.certificate_pem);

    // THEN: The signature no longer matches
    assert_eq!(kind, TokenErrorKind::InvalidSignature);
}

#[test]
fn test_reject_stripped_signature() {
    let jwt = ES256_ISSUER.sign(&scenario_claims());
    let (unsigned, _) = jwt.rsplit_once('.').unwrap();
    let stripped = format!("{unsigned}.");

    assert_eq!(
        access_kind(&engine_at(1500), &stripped, &ES256_ISSUER.certificate_pem),
        TokenErrorKind::InvalidSignature
    );
}

/// Attack: token minted by a different key for the same issuer name
#[test]
fn test_reject_foreign_signing_key() {
    // GIVEN: A token from an attacker-controlled ES256 key
    let attacker = TestIssuer::es256();
    let jwt = attacker.sign(&scenario_claims());

    // WHEN: Verified against the genuine issuer certificate
    let kind = access_kind(&engine_at(1500), &jwt, &ES256_ISSUER.certificate_pem);

    // THEN: Rejected
    assert_eq!(kind, TokenErrorKind::InvalidSignature);
}

/// A real signature does not vouch for the wrong issuer
#[test]
fn test_reject_valid_signature_wrong_issuer() {
    let mut claims = scenario_claims();
    claims["iss"] = json!("https://evil.example");
    let jwt = ES256_ISSUER.sign(&claims);

    assert_eq!(
        access_kind(&engine_at(1500), &jwt, &ES256_ISSUER.certificate_pem),
        TokenErrorKind::IssuerMismatch
    );
}

/// Algorithms outside the allow-list fail even with a valid signature
#[test]
fn test_reject_algorithm_outside_allow_list() {
    let jwt = RS256_ISSUER.sign(&scenario_claims());
    let engine = engine_at(1500).with_algorithms(vec![Algorithm::ES256]);

    assert_eq!(
        access_kind(&engine, &jwt, &RS256_ISSUER.certificate_pem),
        TokenErrorKind::InvalidSignature
    );
}

/// Claim errors never leak for unsigned payloads
#[test]
fn test_forged_claims_report_signature_not_claims() {
    // GIVEN: An unsigned token missing every required claim
    let jwt = unsigned_jwt("none", &json!({"aud": "rs1"}));

    // WHEN / THEN: The signature failure wins over MissingClaim
    assert_eq!(
        access_kind(&engine_at(1500), &jwt, &ES256_ISSUER.certificate_pem),
        TokenErrorKind::InvalidSignature
    );
}

#[test]
fn test_structural_garbage_is_malformed() {
    for jwt in ["abc", "a.b", "a.b.c.d", "!!!.e30.", "e30.!!!.", "bnVsbA.e30."] {
        assert_eq!(
            access_kind(&engine_at(1500), jwt, &ES256_ISSUER.certificate_pem),
            TokenErrorKind::MalformedToken,
            "{jwt}"
        );
    }
}
