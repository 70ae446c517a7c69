//! Verifier configuration
//!
//! Holds the relying party's fixed verification inputs so they can be
//! loaded from a config file instead of threaded through every call.

use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};

use crate::engine::{check_tolerance, require};
use crate::jwt::signature::is_asymmetric;
use crate::jwt::ASYMMETRIC_ALGORITHMS;
use crate::{Result, TokenError};

/// Expected issuer, audience and tolerance for a verifier
///
/// ```rust
/// use oidc_token::VerifierConfig;
///
/// let config: VerifierConfig = serde_json::from_str(r#"{
///     "issuer": "https://idp.example",
///     "resource_server": "rs1",
///     "clock_tolerance_secs": 30
/// }"#).unwrap();
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Expected `iss` claim, compared exactly
    pub issuer: String,
    /// Expected resource server; required for access tokens, unused for
    /// ID tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_server: Option<String>,
    /// Clock skew tolerance in seconds, applied to both `iat` and `exp`
    #[serde(default)]
    pub clock_tolerance_secs: i64,
    /// Accepted signature algorithms (default: every asymmetric algorithm)
    #[serde(default = "default_algorithms")]
    pub allowed_algorithms: Vec<Algorithm>,
}

fn default_algorithms() -> Vec<Algorithm> {
    ASYMMETRIC_ALGORITHMS.to_vec()
}

impl VerifierConfig {
    /// Config for ID tokens from `issuer`
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            resource_server: None,
            clock_tolerance_secs: 0,
            allowed_algorithms: default_algorithms(),
        }
    }

    /// Config for access tokens from `issuer` scoped to `resource_server`
    pub fn for_resource_server(issuer: impl Into<String>, resource_server: impl Into<String>) -> Self {
        Self {
            resource_server: Some(resource_server.into()),
            ..Self::new(issuer)
        }
    }

    /// Set the clock tolerance
    pub fn with_clock_tolerance(mut self, secs: i64) -> Self {
        self.clock_tolerance_secs = secs;
        self
    }

    /// Set the algorithm allow-list
    pub fn with_algorithms(mut self, algorithms: Vec<Algorithm>) -> Self {
        self.allowed_algorithms = algorithms;
        self
    }

    /// Check the config the same way a build checks its arguments
    ///
    /// # Errors
    ///
    /// [`TokenError::InvalidArgument`] for an empty issuer, an empty (but
    /// present) resource server, a negative tolerance, or an allow-list with
    /// no asymmetric algorithm in it.
    pub fn validate(&self) -> Result<()> {
        require("issuer", &self.issuer)?;
        if let Some(resource_server) = &self.resource_server {
            require("resource server", resource_server)?;
        }
        check_tolerance(self.clock_tolerance_secs)?;
        if !self.allowed_algorithms.iter().copied().any(is_asymmetric) {
            return Err(TokenError::invalid_argument(
                "allowed algorithms contain no asymmetric algorithm",
            ));
        }
        Ok(())
    }

    /// Resource server, which access-token verification requires
    pub(crate) fn required_resource_server(&self) -> Result<&str> {
        self.resource_server
            .as_deref()
            .ok_or_else(|| TokenError::invalid_argument("resource server is not configured"))
    }
}
