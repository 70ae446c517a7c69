//! Verified token views
//!
//! A [`Token`] is only ever produced by a successful build. It owns a
//! snapshot of the verified claims and exposes them read-only. The two
//! public variants, [`AccessToken`] and [`IdToken`], dereference to
//! [`Token`] for the shared accessors.
//!
//! Releasing a token with [`Token::close`] wipes the snapshot; calling it
//! again is a no-op, and `Drop` performs the same release. After release
//! every accessor returns its empty value.

use std::ops::Deref;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use zeroize::Zeroize;

/// Which pipeline produced a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    /// OAuth2 access token, scoped to a resource server
    Access,
    /// OpenID Connect ID token, scoped to the client
    Id,
}

impl TokenType {
    /// Value of the `token_class` claim issuers use for this type
    pub fn token_class(self) -> &'static str {
        match self {
            Self::Access => "access_token",
            Self::Id => "id_token",
        }
    }
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Access => "access",
            Self::Id => "id",
        })
    }
}

/// How the token is bound to its presenter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenBinding {
    /// Plain bearer token
    Bearer,
    /// Proof-of-possession token carrying a holder-of-key certificate
    HolderOfKey,
}

/// Claims captured at build time
#[derive(Debug, Clone)]
pub(crate) struct TokenBody {
    pub(crate) issuer: String,
    pub(crate) subject: String,
    pub(crate) audience: Vec<String>,
    pub(crate) issued_at: DateTime<Utc>,
    pub(crate) expires_at: DateTime<Utc>,
    pub(crate) holder_of_key_pem: Option<String>,
    pub(crate) groups: Vec<String>,
    pub(crate) tenant: Option<String>,
    pub(crate) claims: Map<String, Value>,
}

impl TokenBody {
    fn wipe(&mut self) {
        self.issuer.zeroize();
        self.subject.zeroize();
        self.audience.zeroize();
        self.groups.zeroize();
        if let Some(pem) = self.holder_of_key_pem.as_mut() {
            pem.zeroize();
        }
        if let Some(tenant) = self.tenant.as_mut() {
            tenant.zeroize();
        }
        for (mut name, value) in std::mem::take(&mut self.claims) {
            name.zeroize();
            wipe_value(value);
        }
    }
}

fn wipe_value(value: Value) {
    match value {
        Value::String(mut s) => s.zeroize(),
        Value::Array(items) => items.into_iter().for_each(wipe_value),
        Value::Object(map) => {
            for (mut name, value) in map {
                name.zeroize();
                wipe_value(value);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

/// Immutable, read-only view over a verified token's claims
#[derive(Debug)]
pub struct Token {
    token_type: TokenType,
    body: Option<Box<TokenBody>>,
}

impl Token {
    pub(crate) fn new(token_type: TokenType, body: TokenBody) -> Self {
        Self {
            token_type,
            body: Some(Box::new(body)),
        }
    }

    fn body(&self) -> Option<&TokenBody> {
        self.body.as_deref()
    }

    /// Pipeline that produced this token
    pub fn token_type(&self) -> TokenType {
        self.token_type
    }

    /// `iss` claim
    pub fn issuer(&self) -> &str {
        self.body().map_or("", |b| b.issuer.as_str())
    }

    /// `sub` claim
    pub fn subject(&self) -> &str {
        self.body().map_or("", |b| b.subject.as_str())
    }

    /// `aud` claim, in token order
    ///
    /// Borrowed, not copied: the token cannot be mutated through it. Call
    /// `.to_vec()` for an owned list.
    pub fn audience(&self) -> &[String] {
        self.body().map_or(&[][..], |b| b.audience.as_slice())
    }

    /// `iat` claim, truncated to whole seconds
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.body().map_or(DateTime::<Utc>::UNIX_EPOCH, |b| b.issued_at)
    }

    /// `exp` claim, truncated to whole seconds
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.body().map_or(DateTime::<Utc>::UNIX_EPOCH, |b| b.expires_at)
    }

    /// Holder-of-key certificate as a PEM `CERTIFICATE` block
    ///
    /// `None` for bearer tokens.
    pub fn holder_of_key_pem(&self) -> Option<&str> {
        self.body().and_then(|b| b.holder_of_key_pem.as_deref())
    }

    /// Bearer or holder-of-key
    pub fn binding(&self) -> TokenBinding {
        if self.holder_of_key_pem().is_some() {
            TokenBinding::HolderOfKey
        } else {
            TokenBinding::Bearer
        }
    }

    /// `groups` claim, in token order
    ///
    /// Borrowed like [`audience`](Self::audience); `.to_vec()` for an owned copy.
    pub fn groups(&self) -> &[String] {
        self.body().map_or(&[][..], |b| b.groups.as_slice())
    }

    /// `tenant` claim
    pub fn tenant(&self) -> Option<&str> {
        self.body().and_then(|b| b.tenant.as_deref())
    }

    /// Look up a string-valued claim by name
    ///
    /// Returns `None` when the claim is absent or not a JSON string.
    pub fn string_claim(&self, key: &str) -> Option<&str> {
        self.body()
            .and_then(|b| b.claims.get(key))
            .and_then(Value::as_str)
    }

    /// Release the claims snapshot, wiping its string material
    ///
    /// Idempotent: closing an already closed token does nothing.
    pub fn close(&mut self) {
        if let Some(mut body) = self.body.take() {
            body.wipe();
        }
    }

    /// Whether [`close`](Self::close) has run
    pub fn is_closed(&self) -> bool {
        self.body.is_none()
    }
}

impl Drop for Token {
    fn drop(&mut self) {
        self.close();
    }
}

/// A verified OAuth2 access token
#[derive(Debug)]
pub struct AccessToken(Token);

/// A verified OpenID Connect ID token
#[derive(Debug)]
pub struct IdToken(Token);

macro_rules! token_variant {
    ($name:ident, $token_type:expr) => {
        impl $name {
            pub(crate) fn from_body(body: TokenBody) -> Self {
                Self(Token::new($token_type, body))
            }

            /// Release the claims snapshot (idempotent)
            pub fn close(&mut self) {
                self.0.close();
            }

            /// Unwrap into the variant-independent view
            pub fn into_token(self) -> Token {
                self.0
            }
        }

        impl Deref for $name {
            type Target = Token;

            fn deref(&self) -> &Token {
                &self.0
            }
        }

        impl AsRef<Token> for $name {
            fn as_ref(&self) -> &Token {
                &self.0
            }
        }
    };
}

token_variant!(AccessToken, TokenType::Access);
token_variant!(IdToken, TokenType::Id);
