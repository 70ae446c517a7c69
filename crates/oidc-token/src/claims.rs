//! Claims validation
//!
//! Runs against a payload whose signature has already been verified. The
//! checks run in a fixed order and stop at the first failure:
//!
//! 1. `iss`, `sub`, `exp`, `iat` present and well-typed, dates in range
//! 2. `iss` equals the expected issuer
//! 3. `now + tolerance >= iat`
//! 4. `now - tolerance <= exp`
//! 5. `token_class`, when present, names the requested token type
//! 6. access tokens only: the resource server is listed in `aud`
//!
//! Optional claims are then extracted without validation.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::token::{TokenBody, TokenType};
use crate::{Result, TokenError};

/// Claims every token must carry, in the order they are checked
pub const REQUIRED_CLAIMS: [&str; 4] = ["iss", "sub", "exp", "iat"];

const TOKEN_CLASS_CLAIM: &str = "token_class";

/// Temporal, issuer and audience checks for one verification instant
#[derive(Debug, Clone, Copy)]
pub struct ClaimsValidator<'a> {
    expected_issuer: &'a str,
    now: i64,
    clock_tolerance_secs: i64,
}

impl<'a> ClaimsValidator<'a> {
    /// Validator for tokens from `expected_issuer`, evaluated at `now`
    /// (Unix seconds) with a symmetric clock tolerance
    pub fn new(expected_issuer: &'a str, now: i64, clock_tolerance_secs: i64) -> Self {
        Self {
            expected_issuer,
            now,
            clock_tolerance_secs,
        }
    }

    /// Validate an access token payload against `resource_server`
    ///
    /// # Errors
    ///
    /// See [`ClaimsValidator`] for the ordered checks; each maps to its own
    /// [`TokenError`] variant. A required claim of the wrong JSON type, or an
    /// `aud` that is neither a string nor an array of strings, is a
    /// [`TokenError::MalformedToken`].
    pub(crate) fn validate_access(
        &self,
        claims: Map<String, Value>,
        resource_server: &str,
    ) -> Result<TokenBody> {
        self.validate(claims, TokenType::Access, Some(resource_server))
    }

    /// Validate an ID token payload (audience extracted, not enforced)
    ///
    /// # Errors
    ///
    /// Same as [`validate_access`](Self::validate_access) minus the
    /// audience check.
    pub(crate) fn validate_id(&self, claims: Map<String, Value>) -> Result<TokenBody> {
        self.validate(claims, TokenType::Id, None)
    }

    fn validate(
        &self,
        claims: Map<String, Value>,
        token_type: TokenType,
        resource_server: Option<&str>,
    ) -> Result<TokenBody> {
        for claim in REQUIRED_CLAIMS {
            if matches!(claims.get(claim), None | Some(Value::Null)) {
                return Err(TokenError::MissingClaim { claim });
            }
        }

        let issuer = string_claim(&claims, "iss")?;
        let subject = string_claim(&claims, "sub")?;
        let expires_at = numeric_date(&claims, "exp")?;
        let issued_at = numeric_date(&claims, "iat")?;
        let expires_at_utc = to_datetime("exp", expires_at)?;
        let issued_at_utc = to_datetime("iat", issued_at)?;

        if issuer != self.expected_issuer {
            return Err(TokenError::IssuerMismatch {
                expected: self.expected_issuer.to_string(),
                actual: issuer,
            });
        }

        self.check_validity_window(issued_at, expires_at)?;
        check_token_class(&claims, token_type)?;

        let audience = audience(claims.get("aud"))?;
        if let Some(resource_server) = resource_server
            && !audience.iter().any(|aud| aud == resource_server)
        {
            return Err(TokenError::AudienceMismatch {
                expected: resource_server.to_string(),
                audience,
            });
        }

        let groups = lenient_string_list(claims.get("groups"));
        let tenant = claims
            .get("tenant")
            .and_then(Value::as_str)
            .map(str::to_string);
        let holder_of_key_pem = holder_of_key_pem(&claims);

        Ok(TokenBody {
            issuer,
            subject,
            audience,
            issued_at: issued_at_utc,
            expires_at: expires_at_utc,
            holder_of_key_pem,
            groups,
            tenant,
            claims,
        })
    }

    /// Steps 3 and 4: the tolerance widens both ends of `[iat, exp]`
    fn check_validity_window(&self, issued_at: i64, expires_at: i64) -> Result<()> {
        let tolerance = self.clock_tolerance_secs;

        if self.now.saturating_add(tolerance) < issued_at {
            return Err(TokenError::TokenNotYetValid {
                issued_at,
                now: self.now,
                tolerance_secs: tolerance,
            });
        }

        if self.now.saturating_sub(tolerance) > expires_at {
            return Err(TokenError::TokenExpired {
                expires_at,
                now: self.now,
                tolerance_secs: tolerance,
            });
        }

        Ok(())
    }
}

fn check_token_class(claims: &Map<String, Value>, token_type: TokenType) -> Result<()> {
    let Some(class) = claims.get(TOKEN_CLASS_CLAIM) else {
        return Ok(());
    };
    let expected = token_type.token_class();
    match class.as_str() {
        Some(actual) if actual == expected => Ok(()),
        Some(actual) => Err(TokenError::TokenClassMismatch {
            expected,
            actual: actual.to_string(),
        }),
        None => Err(TokenError::TokenClassMismatch {
            expected,
            actual: class.to_string(),
        }),
    }
}

fn string_claim(claims: &Map<String, Value>, name: &str) -> Result<String> {
    claims
        .get(name)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| TokenError::malformed(format!("claim '{name}' is not a string")))
}

/// NumericDate (RFC 7519 §2): integer or fractional seconds, truncated
fn numeric_date(claims: &Map<String, Value>, name: &str) -> Result<i64> {
    let not_a_date = || TokenError::malformed(format!("claim '{name}' is not a NumericDate"));
    let Some(Value::Number(number)) = claims.get(name) else {
        return Err(not_a_date());
    };
    if let Some(secs) = number.as_i64() {
        return Ok(secs);
    }
    match number.as_f64() {
        Some(secs) if secs.is_finite() && secs >= i64::MIN as f64 && secs < i64::MAX as f64 => {
            Ok(secs.trunc() as i64)
        }
        _ => Err(not_a_date()),
    }
}

fn to_datetime(name: &str, secs: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| TokenError::malformed(format!("claim '{name}' is out of range")))
}

/// `aud` is a single string or an array of strings; absent means empty
fn audience(value: Option<&Value>) -> Result<Vec<String>> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(aud)) => Ok(vec![aud.clone()]),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| TokenError::malformed("claim 'aud' contains a non-string entry"))
            })
            .collect(),
        Some(_) => Err(TokenError::malformed(
            "claim 'aud' is neither a string nor an array",
        )),
    }
}

/// Optional list claims: keep the string entries, ignore anything else
fn lenient_string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(item)) => vec![item.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Holder-of-key certificate from `hotk.keys[0].x5c[0]` or `cnf.x5c[0]`
fn holder_of_key_pem(claims: &Map<String, Value>) -> Option<String> {
    let encoded = claims
        .get("hotk")
        .and_then(|hotk| hotk.get("keys"))
        .and_then(|keys| keys.get(0))
        .and_then(first_x5c)
        .or_else(|| claims.get("cnf").and_then(first_x5c))?;

    let der = STANDARD.decode(encoded).ok()?;
    if der.is_empty() {
        return None;
    }
    Some(certificate_pem(&der))
}

fn first_x5c(value: &Value) -> Option<&str> {
    value.get("x5c")?.get(0)?.as_str()
}

fn certificate_pem(der: &[u8]) -> String {
    let encoded = STANDARD.encode(der);
    let mut pem = String::with_capacity(encoded.len() + encoded.len() / 64 + 64);
    pem.push_str("-----BEGIN CERTIFICATE-----\n");
    for (i, c) in encoded.chars().enumerate() {
        if i > 0 && i % 64 == 0 {
            pem.push('\n');
        }
        pem.push(c);
    }
    pem.push_str("\n-----END CERTIFICATE-----\n");
    pem
}
