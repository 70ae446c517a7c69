//! Trust certificate decoding
//!
//! Turns a PEM-armoured X.509 certificate into the public key the signature
//! stage verifies against. Only the SubjectPublicKeyInfo is used: chain
//! building and validity-period checks belong to whoever hands us the
//! certificate.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, DecodingKey};
use x509_parser::oid_registry::{OID_EC_P256, OID_NIST_EC_P384, OID_SIG_ED25519};
use x509_parser::x509::AlgorithmIdentifier;
use x509_parser::pem::parse_x509_pem;
use x509_parser::public_key::PublicKey;

use crate::{Result, TokenError};

const PEM_CERTIFICATE_LABEL: &str = "CERTIFICATE";
const ED25519_SPKI_LEN: usize = 44;

/// Public key family carried by a trust certificate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFamily {
    /// RSA (RS256/384/512, PS256/384/512)
    Rsa,
    /// ECDSA over NIST P-256 (ES256)
    EcP256,
    /// ECDSA over NIST P-384 (ES384)
    EcP384,
    /// Ed25519 (EdDSA)
    Ed25519,
}

impl KeyFamily {
    /// Whether a JWS algorithm can be verified with a key of this family
    pub fn supports(self, algorithm: Algorithm) -> bool {
        matches!(
            (self, algorithm),
            (
                Self::Rsa,
                Algorithm::RS256
                    | Algorithm::RS384
                    | Algorithm::RS512
                    | Algorithm::PS256
                    | Algorithm::PS384
                    | Algorithm::PS512
            ) | (Self::EcP256, Algorithm::ES256)
                | (Self::EcP384, Algorithm::ES384)
                | (Self::Ed25519, Algorithm::EdDSA)
        )
    }
}

/// Public key extracted from a trust certificate
#[derive(Clone)]
pub struct TrustCertificate {
    family: KeyFamily,
    key: DecodingKey,
    subject: String,
}

// DecodingKey holds raw key material; keep it out of Debug output
impl std::fmt::Debug for TrustCertificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrustCertificate")
            .field("family", &self.family)
            .field("subject", &self.subject)
            .finish_non_exhaustive()
    }
}

impl TrustCertificate {
    /// Decode a PEM `CERTIFICATE` block
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidCertificate`] if the input is not a PEM
    /// certificate, the DER does not parse as X.509, or the public key is not
    /// RSA, EC P-256, EC P-384 or Ed25519.
    pub fn from_pem(pem: &str) -> Result<Self> {
        let (_, block) = parse_x509_pem(pem.as_bytes())
            .map_err(|e| TokenError::certificate(format!("invalid PEM: {e}")))?;
        if block.label != PEM_CERTIFICATE_LABEL {
            return Err(TokenError::certificate(format!(
                "expected a {PEM_CERTIFICATE_LABEL} block, found '{}'",
                block.label
            )));
        }

        let cert = block
            .parse_x509()
            .map_err(|e| TokenError::certificate(format!("invalid X.509 certificate: {e}")))?;
        let subject = cert.subject().to_string();
        let spki = cert.public_key();

        if spki.algorithm.algorithm == OID_SIG_ED25519 {
            // SPKI is a fixed 12-byte DER prefix followed by the 32-byte key
            if spki.raw.len() != ED25519_SPKI_LEN {
                return Err(TokenError::certificate("malformed Ed25519 public key"));
            }
            let raw = URL_SAFE_NO_PAD.encode(&spki.raw[ED25519_SPKI_LEN - 32..]);
            let key = DecodingKey::from_ed_components(&raw)
                .map_err(|e| TokenError::certificate(format!("invalid Ed25519 key: {e}")))?;
            return Ok(Self {
                family: KeyFamily::Ed25519,
                key,
                subject,
            });
        }

        let parsed = spki
            .parsed()
            .map_err(|e| TokenError::certificate(format!("unreadable public key: {e}")))?;

        let (family, key) = match parsed {
            PublicKey::RSA(rsa) => {
                let modulus = trim_leading_zeros(rsa.modulus);
                let exponent = trim_leading_zeros(rsa.exponent);
                if modulus.is_empty() || exponent.is_empty() {
                    return Err(TokenError::certificate("RSA key with empty modulus or exponent"));
                }
                (
                    KeyFamily::Rsa,
                    DecodingKey::from_rsa_raw_components(modulus, exponent),
                )
            }
            PublicKey::EC(point) => ec_key(&spki.algorithm, point.data())?,
            _ => {
                return Err(TokenError::certificate(
                    "unsupported public key type (expected RSA, EC P-256/P-384 or Ed25519)",
                ));
            }
        };

        Ok(Self {
            family,
            key,
            subject,
        })
    }

    /// Key family of the certificate's public key
    pub fn key_family(&self) -> KeyFamily {
        self.family
    }

    /// Verification key
    pub fn decoding_key(&self) -> &DecodingKey {
        &self.key
    }

    /// Certificate subject distinguished name
    pub fn subject(&self) -> &str {
        &self.subject
    }
}

/// Named curve from the SPKI parameters plus an uncompressed SEC1 point
/// (`0x04 || X || Y`) → EC decoding key
fn ec_key(algorithm: &AlgorithmIdentifier<'_>, point: &[u8]) -> Result<(KeyFamily, DecodingKey)> {
    let curve = algorithm
        .parameters
        .as_ref()
        .and_then(|params| params.as_oid().ok())
        .ok_or_else(|| TokenError::certificate("EC public key without a named curve"))?;
    let (family, point_len) = if curve == OID_EC_P256 {
        (KeyFamily::EcP256, 65)
    } else if curve == OID_NIST_EC_P384 {
        (KeyFamily::EcP384, 97)
    } else {
        return Err(TokenError::certificate(format!(
            "unsupported EC curve {curve} (only P-256/P-384)"
        )));
    };
    if point.len() != point_len {
        return Err(TokenError::certificate(format!(
            "unsupported EC point length {} (only uncompressed points)",
            point.len()
        )));
    }
    if point[0] != 0x04 {
        return Err(TokenError::certificate("compressed EC points are not supported"));
    }

    let coordinate_len = (point.len() - 1) / 2;
    let x = URL_SAFE_NO_PAD.encode(&point[1..=coordinate_len]);
    let y = URL_SAFE_NO_PAD.encode(&point[1 + coordinate_len..]);
    let key = DecodingKey::from_ec_components(&x, &y)
        .map_err(|e| TokenError::certificate(format!("invalid EC key: {e}")))?;
    Ok((family, key))
}

fn trim_leading_zeros(bytes: &[u8]) -> &[u8] {
    let first = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    &bytes[first..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TokenErrorKind;

    fn self_signed_pem(alg: &'static rcgen::SignatureAlgorithm) -> String {
        let key_pair = rcgen::KeyPair::generate_for(alg).unwrap();
        let params = rcgen::CertificateParams::new(vec!["idp.example".to_string()]).unwrap();
        params.self_signed(&key_pair).unwrap().pem()
    }

    #[test]
    fn test_p256_certificate() {
        let cert = TrustCertificate::from_pem(&self_signed_pem(&rcgen::PKCS_ECDSA_P256_SHA256))
            .unwrap();
        assert_eq!(cert.key_family(), KeyFamily::EcP256);
        assert!(cert.key_family().supports(Algorithm::ES256));
        assert!(!cert.key_family().supports(Algorithm::RS256));
    }

    #[test]
    fn test_p384_certificate() {
        let cert = TrustCertificate::from_pem(&self_signed_pem(&rcgen::PKCS_ECDSA_P384_SHA384))
            .unwrap();
        assert_eq!(cert.key_family(), KeyFamily::EcP384);
        assert!(cert.key_family().supports(Algorithm::ES384));
        assert!(!cert.key_family().supports(Algorithm::ES256));
    }

    #[test]
    fn test_ed25519_certificate() {
        let cert =
            TrustCertificate::from_pem(&self_signed_pem(&rcgen::PKCS_ED25519)).unwrap();
        assert_eq!(cert.key_family(), KeyFamily::Ed25519);
        assert!(cert.key_family().supports(Algorithm::EdDSA));
    }

    #[test]
    fn test_other_named_curves_are_rejected() {
        use base64::engine::general_purpose::STANDARD;

        // prime256v1 (1.2.840.10045.3.1.7) → prime192v1 (1.2.840.10045.3.1.1)
        const P256_OID: [u8; 10] = [0x06, 0x08, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x03, 0x01, 0x07];

        let pem = self_signed_pem(&rcgen::PKCS_ECDSA_P256_SHA256);
        let (_, block) = parse_x509_pem(pem.as_bytes()).unwrap();
        let mut der = block.contents;
        let at = der
            .windows(P256_OID.len())
            .position(|window| window == P256_OID)
            .unwrap();
        der[at + P256_OID.len() - 1] = 0x01;

        let pem = format!(
            "-----BEGIN CERTIFICATE-----\n{}\n-----END CERTIFICATE-----\n",
            STANDARD.encode(&der)
        );
        let err = TrustCertificate::from_pem(&pem).unwrap_err();
        assert_eq!(err.kind(), TokenErrorKind::InvalidCertificate);
        assert!(err.to_string().contains("unsupported EC curve"), "{err}");
    }

    #[test]
    fn test_symmetric_algorithms_never_supported() {
        for family in [
            KeyFamily::Rsa,
            KeyFamily::EcP256,
            KeyFamily::EcP384,
            KeyFamily::Ed25519,
        ] {
            for alg in [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512] {
                assert!(!family.supports(alg), "{family:?} must not accept {alg:?}");
            }
        }
    }

    #[test]
    fn test_garbage_is_rejected() {
        for input in ["not a certificate", "-----BEGIN CERTIFICATE-----\nAAAA\n-----END CERTIFICATE-----\n"] {
            let err = TrustCertificate::from_pem(input).unwrap_err();
            assert_eq!(err.kind(), TokenErrorKind::InvalidCertificate, "{input}");
        }
    }

    #[test]
    fn test_private_key_pem_is_not_a_certificate() {
        let key_pair = rcgen::KeyPair::generate().unwrap();
        let err = TrustCertificate::from_pem(&key_pair.serialize_pem()).unwrap_err();
        assert_eq!(err.kind(), TokenErrorKind::InvalidCertificate);
    }

    #[test]
    fn test_trim_leading_zeros() {
        assert_eq!(trim_leading_zeros(&[0, 0, 1, 2]), &[1, 2]);
        assert_eq!(trim_leading_zeros(&[5]), &[5]);
        assert!(trim_leading_zeros(&[0, 0]).is_empty());
    }
}
