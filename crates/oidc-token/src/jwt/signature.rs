//! Signature verification against a trust certificate
//!
//! The algorithm comes from the (untrusted) JWT header, so it is checked
//! three ways before any cryptography runs:
//! - `none` and unknown names are rejected outright
//! - it must be on the caller's allow-list (asymmetric only)
//! - it must match the family of the certificate's key
//!
//! Only then is the primitive check delegated to `jsonwebtoken`.

use std::str::FromStr;

use jsonwebtoken::Algorithm;
use tracing::debug;

use super::ParsedJwt;
use crate::certificate::TrustCertificate;
use crate::{Result, TokenError};

/// Every asymmetric JWS algorithm a trust certificate can verify
pub const ASYMMETRIC_ALGORITHMS: &[Algorithm] = &[
    Algorithm::RS256,
    Algorithm::RS384,
    Algorithm::RS512,
    Algorithm::PS256,
    Algorithm::PS384,
    Algorithm::PS512,
    Algorithm::ES256,
    Algorithm::ES384,
    Algorithm::EdDSA,
];

/// Whether `algorithm` is asymmetric (verifiable with a public key)
pub fn is_asymmetric(algorithm: Algorithm) -> bool {
    ASYMMETRIC_ALGORITHMS.contains(&algorithm)
}

/// Map a header `alg` value onto a supported algorithm
///
/// # Errors
///
/// Returns [`TokenError::InvalidSignature`] for `none` (in any letter case),
/// for unknown names, and for symmetric (HMAC) algorithms.
pub fn resolve_algorithm(name: &str) -> Result<Algorithm> {
    if name.eq_ignore_ascii_case("none") {
        return Err(TokenError::signature("unsecured JWT (alg \"none\") rejected"));
    }
    let algorithm = Algorithm::from_str(name)
        .map_err(|_| TokenError::signature(format!("unsupported algorithm '{name}'")))?;
    if !is_asymmetric(algorithm) {
        return Err(TokenError::signature(format!(
            "symmetric algorithm {algorithm:?} cannot be verified with a certificate"
        )));
    }
    Ok(algorithm)
}

/// Verifies JWS signatures with a fixed algorithm allow-list
#[derive(Debug, Clone, Copy)]
pub struct SignatureVerifier<'a> {
    allowed_algorithms: &'a [Algorithm],
}

impl Default for SignatureVerifier<'static> {
    fn default() -> Self {
        Self::new(ASYMMETRIC_ALGORITHMS)
    }
}

impl<'a> SignatureVerifier<'a> {
    /// Verifier accepting only `allowed_algorithms`
    pub fn new(allowed_algorithms: &'a [Algorithm]) -> Self {
        Self { allowed_algorithms }
    }

    /// Check `jwt`'s signature with the key from `certificate`
    ///
    /// Returns the algorithm that verified the signature.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidSignature`] if the algorithm is `none`,
    /// unknown, symmetric, not allowed, or incompatible with the key, if the
    /// signature is empty, or if it does not verify.
    pub fn verify(&self, jwt: &ParsedJwt<'_>, certificate: &TrustCertificate) -> Result<Algorithm> {
        let algorithm = resolve_algorithm(&jwt.header().alg)?;

        if !self.allowed_algorithms.contains(&algorithm) {
            return Err(TokenError::signature(format!(
                "algorithm {algorithm:?} not allowed"
            )));
        }

        let family = certificate.key_family();
        if !family.supports(algorithm) {
            return Err(TokenError::signature(format!(
                "algorithm {algorithm:?} does not match {family:?} trust certificate key"
            )));
        }

        if jwt.signature().is_empty() {
            return Err(TokenError::signature("empty signature"));
        }

        let valid = jsonwebtoken::crypto::verify(
            jwt.encoded_signature(),
            jwt.signing_input().as_bytes(),
            certificate.decoding_key(),
            algorithm,
        )
        .map_err(|e| TokenError::signature(format!("verification error: {e}")))?;

        if !valid {
            return Err(TokenError::signature("signature does not match"));
        }

        debug!(algorithm = ?algorithm, key = ?family, "JWT signature verified");
        Ok(algorithm)
    }
}
