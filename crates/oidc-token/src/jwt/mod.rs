//! JWT infrastructure: compact-serialization parsing and signature checks
//!
//! ```text
//! raw JWT ──► parser ──► ParsedJwt ──► signature ──► verified claims map
//!                             ▲
//!              TrustCertificate (PEM → public key)
//! ```
//!
//! - `parser` - split, base64url-decode and deserialize the three segments
//! - `signature` - algorithm policy and cryptographic verification

pub mod parser;
pub mod signature;

pub use parser::{JwtHeader, ParsedJwt, parse};
pub use signature::{ASYMMETRIC_ALGORITHMS, SignatureVerifier, resolve_algorithm};
