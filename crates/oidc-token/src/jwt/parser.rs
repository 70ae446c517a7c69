//! JWS compact serialization parsing
//!
//! Splits `header.payload.signature`, base64url-decodes each segment and
//! deserializes the header and payload. Nothing here looks at claim
//! content or trusts any of it; that happens only after the signature over
//! [`ParsedJwt::signing_input`] has been verified.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{Result, TokenError};

/// Protected header fields the pipeline cares about
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JwtHeader {
    /// Signature algorithm name as written by the issuer (`RS256`, `none`, ...)
    pub alg: String,
    /// Media type, usually `JWT`
    #[serde(default)]
    pub typ: Option<String>,
    /// Key ID. Informational only: the trust certificate selects the key.
    #[serde(default)]
    pub kid: Option<String>,
}

/// A structurally valid, not yet verified JWT
#[derive(Debug, Clone)]
pub struct ParsedJwt<'a> {
    header: JwtHeader,
    claims: Map<String, Value>,
    signing_input: &'a str,
    encoded_signature: &'a str,
    signature: Vec<u8>,
}

impl<'a> ParsedJwt<'a> {
    /// Decoded protected header
    pub fn header(&self) -> &JwtHeader {
        &self.header
    }

    /// Decoded payload. Untrusted until the signature has been verified.
    pub fn claims(&self) -> &Map<String, Value> {
        &self.claims
    }

    /// Consume the parse result, keeping only the payload
    pub fn into_claims(self) -> Map<String, Value> {
        self.claims
    }

    /// The exact `header.payload` bytes the issuer signed
    pub fn signing_input(&self) -> &'a str {
        self.signing_input
    }

    /// Signature segment as it appeared on the wire (base64url)
    pub fn encoded_signature(&self) -> &'a str {
        self.encoded_signature
    }

    /// Raw signature bytes
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }
}

/// Parse a compact-serialized JWT
///
/// The signature segment may be empty (unsecured JWTs are still parsed so
/// that the signature stage can reject them for what they are).
///
/// # Errors
///
/// Returns [`TokenError::MalformedToken`] if the token does not have exactly
/// three segments, the header or payload segment is empty, any segment is
/// not unpadded base64url, the header is not a JSON object with a string
/// `alg`, or the payload is not a JSON object.
pub fn parse(token: &str) -> Result<ParsedJwt<'_>> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(TokenError::malformed(format!(
            "expected 3 segments, found {}",
            segments.len()
        )));
    }
    let (encoded_header, encoded_payload, encoded_signature) =
        (segments[0], segments[1], segments[2]);

    if encoded_header.is_empty() || encoded_payload.is_empty() {
        return Err(TokenError::malformed("empty header or payload segment"));
    }

    let header_bytes = decode_segment("header", encoded_header)?;
    let header: JwtHeader = serde_json::from_slice(&header_bytes)
        .map_err(|e| TokenError::malformed(format!("invalid header JSON: {e}")))?;

    let payload_bytes = decode_segment("payload", encoded_payload)?;
    let payload: Value = serde_json::from_slice(&payload_bytes)
        .map_err(|e| TokenError::malformed(format!("invalid payload JSON: {e}")))?;
    let Value::Object(claims) = payload else {
        return Err(TokenError::malformed("payload is not a JSON object"));
    };

    let signature = decode_segment("signature", encoded_signature)?;

    // header.payload is a prefix of the token; slice it rather than re-joining
    let signing_input = &token[..encoded_header.len() + 1 + encoded_payload.len()];

    Ok(ParsedJwt {
        header,
        claims,
        signing_input,
        encoded_signature,
        signature,
    })
}

fn decode_segment(name: &str, segment: &str) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| TokenError::malformed(format!("invalid base64url in {name}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TokenErrorKind;

    fn encode(json: &str) -> String {
        URL_SAFE_NO_PAD.encode(json)
    }

    fn compact(header: &str, payload: &str, signature: &[u8]) -> String {
        format!(
            "{}.{}.{}",
            encode(header),
            encode(payload),
            URL_SAFE_NO_PAD.encode(signature)
        )
    }

    #[test]
    fn test_parse_well_formed_token() {
        let token = compact(
            r#"{"alg":"RS256","typ":"JWT","kid":"k1"}"#,
            r#"{"iss":"https://idp.example","sub":"u1"}"#,
            b"sig-bytes",
        );

        let parsed = parse(&token).unwrap();

        assert_eq!(parsed.header().alg, "RS256");
        assert_eq!(parsed.header().typ.as_deref(), Some("JWT"));
        assert_eq!(parsed.header().kid.as_deref(), Some("k1"));
        assert_eq!(parsed.claims()["sub"], "u1");
        assert_eq!(parsed.signature(), b"sig-bytes");

        let last_dot = token.rfind('.').unwrap();
        assert_eq!(parsed.signing_input(), &token[..last_dot]);
        assert_eq!(parsed.encoded_signature(), &token[last_dot + 1..]);
    }

    #[test]
    fn test_wrong_segment_count() {
        for token in ["abc", "a.b", "a.b.c.d", ""] {
            let err = parse(token).unwrap_err();
            assert_eq!(err.kind(), TokenErrorKind::MalformedToken, "{token}");
        }
    }

    #[test]
    fn test_invalid_base64() {
        let token = format!("{}.%%%.", encode(r#"{"alg":"RS256"}"#));
        assert_eq!(
            parse(&token).unwrap_err().kind(),
            TokenErrorKind::MalformedToken
        );
    }

    #[test]
    fn test_padded_base64_rejected() {
        // "{}" encodes to "e30" unpadded; "e30=" is not valid base64url for JWS
        let token = format!("{}.e30=.", encode(r#"{"alg":"RS256"}"#));
        assert_eq!(
            parse(&token).unwrap_err().kind(),
            TokenErrorKind::MalformedToken
        );
    }

    #[test]
    fn test_header_without_alg() {
        let token = compact(r#"{"typ":"JWT"}"#, "{}", b"");
        assert_eq!(
            parse(&token).unwrap_err().kind(),
            TokenErrorKind::MalformedToken
        );
    }

    #[test]
    fn test_payload_must_be_object() {
        let token = compact(r#"{"alg":"RS256"}"#, r#"["not","an","object"]"#, b"x");
        assert_eq!(
            parse(&token).unwrap_err().kind(),
            TokenErrorKind::MalformedToken
        );

        let token = compact(r#"{"alg":"RS256"}"#, "not json", b"x");
        assert_eq!(
            parse(&token).unwrap_err().kind(),
            TokenErrorKind::MalformedToken
        );
    }

    #[test]
    fn test_empty_signature_segment_parses() {
        let token = format!("{}.{}.", encode(r#"{"alg":"none"}"#), encode("{}"));
        let parsed = parse(&token).unwrap();
        assert_eq!(parsed.header().alg, "none");
        assert!(parsed.signature().is_empty());
    }

    #[test]
    fn test_empty_payload_segment_rejected() {
        let token = format!("{}..sig", encode(r#"{"alg":"RS256"}"#));
        assert_eq!(
            parse(&token).unwrap_err().kind(),
            TokenErrorKind::MalformedToken
        );
    }
}
