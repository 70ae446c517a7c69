//! # OIDC Token - Access and ID token verification
//!
//! Verifies OAuth2 access tokens and OpenID Connect ID tokens issued as
//! signed JWTs, and exposes their claims through read-only views.
//!
//! A token is trusted only once it is:
//! - a structurally valid JWS compact serialization
//! - signed with an asymmetric algorithm, verifiable with the public key of
//!   a caller-supplied trust certificate
//! - issued by the expected issuer
//! - inside its `iat`..`exp` window, widened by a clock tolerance
//! - (access tokens) addressed to the expected resource server
//!
//! ## Architecture
//!
//! - [`jwt`] - compact-serialization parsing and signature verification
//! - [`certificate`] - PEM trust certificate to public key
//! - [`claims`] - ordered claim checks and optional-claim extraction
//! - [`engine`] - the build pipeline ([`TokenValidationEngine`])
//! - [`verifier`] - verifiers bound to a [`VerifierConfig`] and certificate
//! - [`token`] - [`AccessToken`] / [`IdToken`] views
//! - [`clock`] - injectable time source
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use oidc_token::build_access_token;
//!
//! # fn run(jwt: &str, trust_cert_pem: &str) -> oidc_token::Result<()> {
//! let mut token = build_access_token(jwt, trust_cert_pem, "https://idp.example", "rs1", 60)?;
//!
//! assert!(token.audience().iter().any(|aud| aud == "rs1"));
//! if let Some(email) = token.string_claim("email") {
//!     println!("{} <{email}>", token.subject());
//! }
//! token.close();
//! # Ok(())
//! # }
//! ```
//!
//! ## Logging
//!
//! Verification emits `tracing` events: `debug` on success, `warn` with the
//! error kind on rejection. No subscriber is installed.

pub mod certificate;
pub mod claims;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod jwt;
pub mod token;
pub mod verifier;

pub use certificate::{KeyFamily, TrustCertificate};
pub use claims::REQUIRED_CLAIMS;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::VerifierConfig;
pub use engine::{TokenValidationEngine, build_access_token, build_id_token};
pub use error::{TokenError, TokenErrorKind};
pub use token::{AccessToken, IdToken, Token, TokenBinding, TokenType};
pub use verifier::{AccessTokenVerifier, IdTokenVerifier};

pub use jsonwebtoken::Algorithm;

/// Result type for token verification
pub type Result<T> = std::result::Result<T, TokenError>;
