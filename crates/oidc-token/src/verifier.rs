//! Reusable verifiers bound to one issuer and trust certificate
//!
//! [`TokenValidationEngine`] takes every input per call. A relying party
//! usually has fixed inputs, so these wrappers decode the trust certificate
//! and validate the config once, then verify any number of tokens.

use std::sync::Arc;

use jsonwebtoken::Algorithm;

use crate::certificate::TrustCertificate;
use crate::clock::Clock;
use crate::config::VerifierConfig;
use crate::engine::{TokenValidationEngine, check_tolerance, log_rejection, require};
use crate::jwt;
use crate::token::{AccessToken, IdToken, TokenType};
use crate::Result;

/// Verifies access tokens for one resource server
///
/// # Example
///
/// ```rust,no_run
/// use oidc_token::{AccessTokenVerifier, VerifierConfig};
///
/// # fn run(trust_cert_pem: &str, jwt: &str) -> oidc_token::Result<()> {
/// let config = VerifierConfig::for_resource_server("https://idp.example", "rs1")
///     .with_clock_tolerance(60);
/// let verifier = AccessTokenVerifier::new(config, trust_cert_pem)?;
///
/// let token = verifier.verify(jwt)?;
/// println!("groups: {:?}", token.groups());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AccessTokenVerifier {
    config: VerifierConfig,
    resource_server: String,
    certificate: TrustCertificate,
    engine: TokenValidationEngine,
}

impl AccessTokenVerifier {
    /// Bind `config` to a PEM trust certificate
    ///
    /// # Errors
    ///
    /// [`TokenError::InvalidArgument`](crate::TokenError::InvalidArgument) if
    /// the config is invalid or has no resource server;
    /// [`TokenError::InvalidCertificate`](crate::TokenError::InvalidCertificate)
    /// if the certificate does not decode.
    pub fn new(config: VerifierConfig, trust_cert_pem: &str) -> Result<Self> {
        config.validate()?;
        let resource_server = config.required_resource_server()?.to_string();
        require("trust certificate", trust_cert_pem)?;
        let certificate = TrustCertificate::from_pem(trust_cert_pem)?;
        let engine = TokenValidationEngine::new().with_algorithms(config.allowed_algorithms.clone());
        Ok(Self {
            config,
            resource_server,
            certificate,
            engine,
        })
    }

    /// Override the clock tolerance
    ///
    /// # Errors
    ///
    /// [`TokenError::InvalidArgument`](crate::TokenError::InvalidArgument)
    /// for a negative tolerance.
    pub fn with_clock_tolerance(mut self, secs: i64) -> Result<Self> {
        check_tolerance(secs)?;
        self.config.clock_tolerance_secs = secs;
        Ok(self)
    }

    /// Override the algorithm allow-list
    pub fn with_algorithms(mut self, algorithms: Vec<Algorithm>) -> Self {
        self.engine = self.engine.with_algorithms(algorithms.clone());
        self.config.allowed_algorithms = algorithms;
        self
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.engine = self.engine.with_clock(clock);
        self
    }

    /// Effective configuration
    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Trust certificate tokens are verified against
    pub fn certificate(&self) -> &TrustCertificate {
        &self.certificate
    }

    /// Verify one access token
    ///
    /// # Errors
    ///
    /// Same as
    /// [`TokenValidationEngine::build_access_token`](crate::TokenValidationEngine::build_access_token).
    pub fn verify(&self, token: &str) -> Result<AccessToken> {
        require("JWT", token)
            .and_then(|()| jwt::parse(token))
            .and_then(|parsed| {
                self.engine.access_token_from(
                    parsed,
                    &self.certificate,
                    &self.config.issuer,
                    &self.resource_server,
                    self.config.clock_tolerance_secs,
                )
            })
            .inspect_err(|e| log_rejection(TokenType::Access, e))
    }
}

/// Verifies ID tokens from one issuer
#[derive(Debug, Clone)]
pub struct IdTokenVerifier {
    config: VerifierConfig,
    certificate: TrustCertificate,
    engine: TokenValidationEngine,
}

impl IdTokenVerifier {
    /// Bind `config` to a PEM trust certificate
    ///
    /// A configured resource server is ignored: ID tokens are scoped to the
    /// client.
    ///
    /// # Errors
    ///
    /// As [`AccessTokenVerifier::new`], except that no resource server is
    /// required.
    pub fn new(config: VerifierConfig, trust_cert_pem: &str) -> Result<Self> {
        config.validate()?;
        require("trust certificate", trust_cert_pem)?;
        let certificate = TrustCertificate::from_pem(trust_cert_pem)?;
        let engine = TokenValidationEngine::new().with_algorithms(config.allowed_algorithms.clone());
        Ok(Self {
            config,
            certificate,
            engine,
        })
    }

    /// Override the clock tolerance
    ///
    /// # Errors
    ///
    /// [`TokenError::InvalidArgument`](crate::TokenError::InvalidArgument)
    /// for a negative tolerance.
    pub fn with_clock_tolerance(mut self, secs: i64) -> Result<Self> {
        check_tolerance(secs)?;
        self.config.clock_tolerance_secs = secs;
        Ok(self)
    }

    /// Override the algorithm allow-list
    pub fn with_algorithms(mut self, algorithms: Vec<Algorithm>) -> Self {
        self.engine = self.engine.with_algorithms(algorithms.clone());
        self.config.allowed_algorithms = algorithms;
        self
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.engine = self.engine.with_clock(clock);
        self
    }

    /// Effective configuration
    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Trust certificate tokens are verified against
    pub fn certificate(&self) -> &TrustCertificate {
        &self.certificate
    }

    /// Verify one ID token
    ///
    /// # Errors
    ///
    /// Same as
    /// [`TokenValidationEngine::build_id_token`](crate::TokenValidationEngine::build_id_token).
    pub fn verify(&self, token: &str) -> Result<IdToken> {
        require("JWT", token)
            .and_then(|()| jwt::parse(token))
            .and_then(|parsed| {
                self.engine.id_token_from(
                    parsed,
                    &self.certificate,
                    &self.config.issuer,
                    self.config.clock_tolerance_secs,
                )
            })
            .inspect_err(|e| log_rejection(TokenType::Id, e))
    }
}
