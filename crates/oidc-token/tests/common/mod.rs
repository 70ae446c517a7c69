//! Common test utilities for integration tests
//!
//! Mints throwaway issuers (key pair + self-signed trust certificate) and
//! signs JWT fixtures with them. Key generation is slow, so each issuer
//! kind is created once per test binary.

#![allow(dead_code)]

use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use once_cell::sync::Lazy;
use oidc_token::{FixedClock, TokenValidationEngine};
use serde_json::{Value, json};

pub const ISSUER: &str = "https://idp.example";
pub const RESOURCE_SERVER: &str = "rs1";

/// A signing key and the trust certificate for its public half
pub struct TestIssuer {
    pub algorithm: Algorithm,
    pub private_key_pem: String,
    pub certificate_pem: String,
}

impl TestIssuer {
    /// Issuer signing with ECDSA P-256 (ES256)
    pub fn es256() -> Self {
        let key_pair = rcgen::KeyPair::generate_for(&rcgen::PKCS_ECDSA_P256_SHA256)
            .expect("Failed to generate P-256 key");
        Self::from_key_pair(Algorithm::ES256, &key_pair)
    }

    /// Issuer signing with ECDSA P-384 (ES384)
    pub fn es384() -> Self {
        let key_pair = rcgen::KeyPair::generate_for(&rcgen::PKCS_ECDSA_P384_SHA384)
            .expect("Failed to generate P-384 key");
        Self::from_key_pair(Algorithm::ES384, &key_pair)
    }

    /// Issuer signing with RSA-2048 (RS256)
    pub fn rs256() -> Self {
        use rsa::RsaPrivateKey;
        use rsa::pkcs8::{EncodePrivateKey, LineEnding};

        let mut rng = rand::thread_rng();
        let private_key = RsaPrivateKey::new(&mut rng, 2048).expect("Failed to generate RSA key");
        let pem = private_key
            .to_pkcs8_pem(LineEnding::LF)
            .expect("Failed to encode RSA key");
        let key_pair = rcgen::KeyPair::from_pem(&pem).expect("rcgen rejected RSA key");
        Self::from_key_pair(Algorithm::RS256, &key_pair)
    }

    /// Issuer signing with Ed25519 (EdDSA)
    pub fn ed25519() -> Self {
        let key_pair = rcgen::KeyPair::generate_for(&rcgen::PKCS_ED25519)
            .expect("Failed to generate Ed25519 key");
        Self::from_key_pair(Algorithm::EdDSA, &key_pair)
    }

    fn from_key_pair(algorithm: Algorithm, key_pair: &rcgen::KeyPair) -> Self {
        let certificate_pem = rcgen::CertificateParams::new(vec!["idp.example".to_string()])
            .expect("Invalid certificate params")
            .self_signed(key_pair)
            .expect("Failed to self-sign certificate")
            .pem();
        Self {
            algorithm,
            private_key_pem: key_pair.serialize_pem(),
            certificate_pem,
        }
    }

    fn encoding_key(&self) -> EncodingKey {
        let pem = self.private_key_pem.as_bytes();
        match self.algorithm {
            Algorithm::ES256 | Algorithm::ES384 => {
                EncodingKey::from_ec_pem(pem).expect("Invalid EC key")
            }
            Algorithm::EdDSA => EncodingKey::from_ed_pem(pem).expect("Invalid Ed25519 key"),
            _ => EncodingKey::from_rsa_pem(pem).expect("Invalid RSA key"),
        }
    }

    /// Sign `claims` with this issuer's own algorithm
    pub fn sign(&self, claims: &Value) -> String {
        self.sign_with(self.algorithm, claims)
    }

    /// Sign `claims`, writing `algorithm` into the header
    pub fn sign_with(&self, algorithm: Algorithm, claims: &Value) -> String {
        encode(&Header::new(algorithm), claims, &self.encoding_key()).expect("Failed to sign JWT")
    }
}

pub static ES256_ISSUER: Lazy<TestIssuer> = Lazy::new(TestIssuer::es256);
pub static ES384_ISSUER: Lazy<TestIssuer> = Lazy::new(TestIssuer::es384);
pub static RS256_ISSUER: Lazy<TestIssuer> = Lazy::new(TestIssuer::rs256);
pub static ED25519_ISSUER: Lazy<TestIssuer> = Lazy::new(TestIssuer::ed25519);

/// Claims of the reference scenario: valid between 1000 and 2000
pub fn scenario_claims() -> Value {
    json!({
        "iss": ISSUER,
        "sub": "u1",
        "aud": [RESOURCE_SERVER],
        "iat": 1000,
        "exp": 2000,
    })
}

/// Engine pinned at `now`
pub fn engine_at(now: i64) -> TokenValidationEngine {
    TokenValidationEngine::new().with_clock(Arc::new(FixedClock::at(now)))
}

/// Unsecured JWT: `alg` as given, empty signature segment
pub fn unsigned_jwt(alg: &str, claims: &Value) -> String {
    format!(
        "{}.{}.",
        URL_SAFE_NO_PAD.encode(json!({"alg": alg, "typ": "JWT"}).to_string()),
        URL_SAFE_NO_PAD.encode(claims.to_string()),
    )
}

/// Replace the payload of a signed JWT, keeping header and signature
pub fn with_payload(jwt: &str, claims: &Value) -> String {
    let mut segments = jwt.split('.');
    let header = segments.next().expect("header segment");
    let _payload = segments.next().expect("payload segment");
    let signature = segments.next().expect("signature segment");
    format!(
        "{header}.{}.{signature}",
        URL_SAFE_NO_PAD.encode(claims.to_string())
    )
}

/// Replace the header of a signed JWT, keeping payload and signature
pub fn with_header(jwt: &str, header: &Value) -> String {
    let (_, rest) = jwt.split_once('.').expect("header segment");
    format!("{}.{rest}", URL_SAFE_NO_PAD.encode(header.to_string()))
}
