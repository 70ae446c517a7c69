//! Token validation engine
//!
//! Entry point for both token variants. A build runs the stages in order
//! and the first failure wins:
//!
//! ```text
//! arguments ─► parse ─► trust certificate ─► signature ─► claims ─► token
//! ```
//!
//! Nothing from the payload is inspected or logged before the signature has
//! verified. The engine holds no per-call state, so one instance can serve
//! any number of concurrent builds.

use std::sync::Arc;

use jsonwebtoken::Algorithm;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::certificate::TrustCertificate;
use crate::claims::ClaimsValidator;
use crate::clock::{Clock, SystemClock};
use crate::jwt::{self, ASYMMETRIC_ALGORITHMS, ParsedJwt, SignatureVerifier};
use crate::token::{AccessToken, IdToken, TokenType};
use crate::{Result, TokenError};

/// Builds verified [`AccessToken`]s and [`IdToken`]s
///
/// # Example
///
/// ```rust,no_run
/// use oidc_token::TokenValidationEngine;
///
/// # fn run(jwt: &str, trust_cert_pem: &str) -> oidc_token::Result<()> {
/// let engine = TokenValidationEngine::new();
/// let token = engine.build_access_token(
///     jwt,
///     trust_cert_pem,
///     "https://idp.example",
///     "rs1",
///     30,
/// )?;
/// println!("subject: {}", token.subject());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TokenValidationEngine {
    clock: Arc<dyn Clock>,
    allowed_algorithms: Vec<Algorithm>,
}

impl Default for TokenValidationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenValidationEngine {
    /// Engine on the system clock, accepting every asymmetric algorithm
    pub fn new() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            allowed_algorithms: ASYMMETRIC_ALGORITHMS.to_vec(),
        }
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Restrict the accepted signature algorithms
    ///
    /// Symmetric algorithms in the list are ignored: a certificate can never
    /// verify them.
    pub fn with_algorithms(mut self, algorithms: Vec<Algorithm>) -> Self {
        self.allowed_algorithms = algorithms;
        self
    }

    /// Algorithms this engine accepts
    pub fn allowed_algorithms(&self) -> &[Algorithm] {
        &self.allowed_algorithms
    }

    /// Verify `jwt` as an access token for `resource_server`
    ///
    /// # Errors
    ///
    /// [`TokenError::InvalidArgument`] for an empty `jwt`, certificate,
    /// issuer or resource server, or a negative tolerance; otherwise the
    /// error of the first failing pipeline stage.
    pub fn build_access_token(
        &self,
        jwt: &str,
        trust_cert_pem: &str,
        issuer: &str,
        resource_server: &str,
        clock_tolerance_secs: i64,
    ) -> Result<AccessToken> {
        check_arguments(jwt, issuer, clock_tolerance_secs)
            .and_then(|()| require("resource server", resource_server))
            .and_then(|()| require("trust certificate", trust_cert_pem))
            .and_then(|()| jwt::parse(jwt))
            .and_then(|parsed| {
                let certificate = TrustCertificate::from_pem(trust_cert_pem)?;
                self.access_token_from(parsed, &certificate, issuer, resource_server, clock_tolerance_secs)
            })
            .inspect_err(|e| log_rejection(TokenType::Access, e))
    }

    /// Verify `jwt` as an ID token
    ///
    /// # Errors
    ///
    /// As [`build_access_token`](Self::build_access_token), without the
    /// resource-server argument and audience check.
    pub fn build_id_token(
        &self,
        jwt: &str,
        trust_cert_pem: &str,
        issuer: &str,
        clock_tolerance_secs: i64,
    ) -> Result<IdToken> {
        check_arguments(jwt, issuer, clock_tolerance_secs)
            .and_then(|()| require("trust certificate", trust_cert_pem))
            .and_then(|()| jwt::parse(jwt))
            .and_then(|parsed| {
                let certificate = TrustCertificate::from_pem(trust_cert_pem)?;
                self.id_token_from(parsed, &certificate, issuer, clock_tolerance_secs)
            })
            .inspect_err(|e| log_rejection(TokenType::Id, e))
    }

    /// Access-token pipeline from the signature stage on
    pub(crate) fn access_token_from(
        &self,
        parsed: ParsedJwt<'_>,
        certificate: &TrustCertificate,
        issuer: &str,
        resource_server: &str,
        clock_tolerance_secs: i64,
    ) -> Result<AccessToken> {
        let (claims, algorithm) = self.verified_claims(parsed, certificate)?;
        let body = ClaimsValidator::new(issuer, self.clock.now(), clock_tolerance_secs)
            .validate_access(claims, resource_server)?;
        let token = AccessToken::from_body(body);
        log_accepted(TokenType::Access, token.issuer(), token.subject(), algorithm);
        Ok(token)
    }

    /// ID-token pipeline from the signature stage on
    pub(crate) fn id_token_from(
        &self,
        parsed: ParsedJwt<'_>,
        certificate: &TrustCertificate,
        issuer: &str,
        clock_tolerance_secs: i64,
    ) -> Result<IdToken> {
        let (claims, algorithm) = self.verified_claims(parsed, certificate)?;
        let body = ClaimsValidator::new(issuer, self.clock.now(), clock_tolerance_secs)
            .validate_id(claims)?;
        let token = IdToken::from_body(body);
        log_accepted(TokenType::Id, token.issuer(), token.subject(), algorithm);
        Ok(token)
    }

    fn verified_claims(
        &self,
        parsed: ParsedJwt<'_>,
        certificate: &TrustCertificate,
    ) -> Result<(Map<String, Value>, Algorithm)> {
        let algorithm =
            SignatureVerifier::new(&self.allowed_algorithms).verify(&parsed, certificate)?;
        Ok((parsed.into_claims(), algorithm))
    }
}

/// Verify `jwt` as an access token using the system clock
///
/// Shorthand for [`TokenValidationEngine::build_access_token`] on a default
/// engine.
///
/// # Errors
///
/// See [`TokenValidationEngine::build_access_token`].
pub fn build_access_token(
    jwt: &str,
    trust_cert_pem: &str,
    issuer: &str,
    resource_server: &str,
    clock_tolerance_secs: i64,
) -> Result<AccessToken> {
    TokenValidationEngine::new().build_access_token(
        jwt,
        trust_cert_pem,
        issuer,
        resource_server,
        clock_tolerance_secs,
    )
}

/// Verify `jwt` as an ID token using the system clock
///
/// # Errors
///
/// See [`TokenValidationEngine::build_id_token`].
pub fn build_id_token(
    jwt: &str,
    trust_cert_pem: &str,
    issuer: &str,
    clock_tolerance_secs: i64,
) -> Result<IdToken> {
    TokenValidationEngine::new().build_id_token(jwt, trust_cert_pem, issuer, clock_tolerance_secs)
}

pub(crate) fn check_arguments(jwt: &str, issuer: &str, clock_tolerance_secs: i64) -> Result<()> {
    require("JWT", jwt)?;
    require("issuer", issuer)?;
    check_tolerance(clock_tolerance_secs)
}

pub(crate) fn check_tolerance(clock_tolerance_secs: i64) -> Result<()> {
    if clock_tolerance_secs < 0 {
        return Err(TokenError::invalid_argument(format!(
            "clock tolerance must not be negative, got {clock_tolerance_secs}"
        )));
    }
    Ok(())
}

pub(crate) fn require(what: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(TokenError::invalid_argument(format!("{what} is empty")));
    }
    Ok(())
}

// Only the kind is logged: on failure the payload is untrusted
pub(crate) fn log_rejection(token_type: TokenType, err: &TokenError) {
    warn!(token_type = %token_type, kind = %err.kind(), "Token rejected");
}

fn log_accepted(token_type: TokenType, issuer: &str, subject: &str, algorithm: Algorithm) {
    debug!(
        token_type = %token_type,
        issuer = issuer,
        subject = subject,
        algorithm = ?algorithm,
        "Token verified"
    );
}
