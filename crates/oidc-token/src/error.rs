//! Error types for token verification
//!
//! Every failure of the build pipeline maps to exactly one [`TokenError`]
//! variant. The variants are ordered the way the pipeline reports them:
//! argument checks, structure, certificate, signature, then claim content.

use thiserror::Error;

/// Token verification errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Malformed or missing mandatory input to a build operation
    #[error("Invalid argument: {reason}")]
    InvalidArgument {
        /// What was wrong with the input
        reason: String,
    },

    /// The JWT does not parse structurally
    #[error("Malformed token: {reason}")]
    MalformedToken {
        /// Parsing failure details
        reason: String,
    },

    /// The trust certificate does not decode to a usable public key
    #[error("Invalid trust certificate: {reason}")]
    InvalidCertificate {
        /// Decoding failure details
        reason: String,
    },

    /// The signature does not verify or the algorithm is disallowed
    #[error("Invalid signature: {reason}")]
    InvalidSignature {
        /// Why verification was refused or failed
        reason: String,
    },

    /// A mandatory claim is absent
    #[error("Missing required claim: {claim}")]
    MissingClaim {
        /// Claim name (`iss`, `sub`, `exp` or `iat`)
        claim: &'static str,
    },

    /// The `iss` claim does not equal the expected issuer
    #[error("Issuer mismatch: expected '{expected}', token has '{actual}'")]
    IssuerMismatch {
        /// Issuer the caller expects
        expected: String,
        /// Issuer found in the token
        actual: String,
    },

    /// The token was issued in the future beyond the clock tolerance
    #[error("Token not yet valid: issued at {issued_at}, now {now} (tolerance {tolerance_secs}s)")]
    TokenNotYetValid {
        /// `iat` claim, Unix seconds
        issued_at: i64,
        /// Verification instant, Unix seconds
        now: i64,
        /// Clock tolerance applied
        tolerance_secs: i64,
    },

    /// The token expired before now minus the clock tolerance
    #[error("Token expired at {expires_at}, now {now} (tolerance {tolerance_secs}s)")]
    TokenExpired {
        /// `exp` claim, Unix seconds
        expires_at: i64,
        /// Verification instant, Unix seconds
        now: i64,
        /// Clock tolerance applied
        tolerance_secs: i64,
    },

    /// The expected resource server is not in the audience list
    #[error("Audience mismatch: '{expected}' not in {audience:?}")]
    AudienceMismatch {
        /// Resource server the caller expects
        expected: String,
        /// Audience found in the token
        audience: Vec<String>,
    },

    /// The `token_class` claim names the other token variant
    #[error("Token class mismatch: expected '{expected}', token has '{actual}'")]
    TokenClassMismatch {
        /// Class required by the build operation
        expected: &'static str,
        /// Class found in the token
        actual: String,
    },
}

/// Fieldless discriminant of [`TokenError`], convenient for metrics labels
/// and log fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenErrorKind {
    /// See [`TokenError::InvalidArgument`]
    InvalidArgument,
    /// See [`TokenError::MalformedToken`]
    MalformedToken,
    /// See [`TokenError::InvalidCertificate`]
    InvalidCertificate,
    /// See [`TokenError::InvalidSignature`]
    InvalidSignature,
    /// See [`TokenError::MissingClaim`]
    MissingClaim,
    /// See [`TokenError::IssuerMismatch`]
    IssuerMismatch,
    /// See [`TokenError::TokenNotYetValid`]
    TokenNotYetValid,
    /// See [`TokenError::TokenExpired`]
    TokenExpired,
    /// See [`TokenError::AudienceMismatch`]
    AudienceMismatch,
    /// See [`TokenError::TokenClassMismatch`]
    TokenClassMismatch,
}

impl TokenErrorKind {
    /// Stable snake_case name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidArgument => "invalid_argument",
            Self::MalformedToken => "malformed_token",
            Self::InvalidCertificate => "invalid_certificate",
            Self::InvalidSignature => "invalid_signature",
            Self::MissingClaim => "missing_claim",
            Self::IssuerMismatch => "issuer_mismatch",
            Self::TokenNotYetValid => "token_not_yet_valid",
            Self::TokenExpired => "token_expired",
            Self::AudienceMismatch => "audience_mismatch",
            Self::TokenClassMismatch => "token_class_mismatch",
        }
    }
}

impl std::fmt::Display for TokenErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TokenError {
    /// Discriminant of this error
    pub fn kind(&self) -> TokenErrorKind {
        match self {
            Self::InvalidArgument { .. } => TokenErrorKind::InvalidArgument,
            Self::MalformedToken { .. } => TokenErrorKind::MalformedToken,
            Self::InvalidCertificate { .. } => TokenErrorKind::InvalidCertificate,
            Self::InvalidSignature { .. } => TokenErrorKind::InvalidSignature,
            Self::MissingClaim { .. } => TokenErrorKind::MissingClaim,
            Self::IssuerMismatch { .. } => TokenErrorKind::IssuerMismatch,
            Self::TokenNotYetValid { .. } => TokenErrorKind::TokenNotYetValid,
            Self::TokenExpired { .. } => TokenErrorKind::TokenExpired,
            Self::AudienceMismatch { .. } => TokenErrorKind::AudienceMismatch,
            Self::TokenClassMismatch { .. } => TokenErrorKind::TokenClassMismatch,
        }
    }

    pub(crate) fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedToken {
            reason: reason.into(),
        }
    }

    pub(crate) fn certificate(reason: impl Into<String>) -> Self {
        Self::InvalidCertificate {
            reason: reason.into(),
        }
    }

    pub(crate) fn signature(reason: impl Into<String>) -> Self {
        Self::InvalidSignature {
            reason: reason.into(),
        }
    }
}
