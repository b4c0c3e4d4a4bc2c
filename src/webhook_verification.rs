//! # Webhook Signature Verification
//!
//! GitHub signs every delivery with HMAC-SHA256 over the raw request body and sends the
//! digest as `X-Hub-Signature-256: sha256=<hex>`. Digests are compared in constant time.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the delivery signature.
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature-256";

const SUPPORTED_ALGORITHM: &str = "sha256";

/// Errors that can occur during webhook signature verification
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum VerificationError {
    #[error("Missing required signature header: {header}")]
    MissingSignature { header: String },

    #[error("Invalid signature format: {header}")]
    InvalidSignatureFormat { header: String },

    #[error("Unsupported signature algorithm: {algorithm}")]
    UnsupportedAlgorithm { algorithm: String },

    #[error("Signature verification failed")]
    VerificationFailed,
}

impl VerificationError {
    /// Short label used for the rejection metric.
    pub fn reason(&self) -> &'static str {
        match self {
            VerificationError::MissingSignature { .. } => "missing_signature",
            VerificationError::InvalidSignatureFormat { .. } => "invalid_format",
            VerificationError::UnsupportedAlgorithm { .. } => "unsupported_algorithm",
            VerificationError::VerificationFailed => "mismatch",
        }
    }
}

/// Result type for webhook verification
pub type VerificationResult<T> = Result<T, VerificationError>;

/// Verifies a GitHub `X-Hub-Signature-256` header against `body`, reporting why it was rejected.
///
/// The secret is used as-is; callers decide what an empty secret means.
pub fn verify_github_signature(
    body: &[u8],
    signature_header: Option<&str>,
    secret: &str,
) -> VerificationResult<()> {
    debug!(
        body_size = body.len(),
        "Starting GitHub signature verification"
    );

    let header = signature_header
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| VerificationError::MissingSignature {
            header: SIGNATURE_HEADER.to_string(),
        })?;

    let (algorithm, provided_hex) =
        header
            .split_once('=')
            .ok_or_else(|| VerificationError::InvalidSignatureFormat {
                header: format!("{SIGNATURE_HEADER} must look like 'sha256=<hex>'"),
            })?;

    if algorithm != SUPPORTED_ALGORITHM {
        return Err(VerificationError::UnsupportedAlgorithm {
            algorithm: algorithm.to_string(),
        });
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| VerificationError::VerificationFailed)?;
    mac.update(body);
    let expected_hex = hex::encode(mac.finalize().into_bytes());

    // Length mismatches compare unequal without short-circuiting on content
    if expected_hex.as_bytes().ct_eq(provided_hex.as_bytes()).into() {
        Ok(())
    } else {
        Err(VerificationError::VerificationFailed)
    }
}

/// Boolean form of [`verify_github_signature`].
///
/// An empty `secret` disables verification and accepts every request.
pub fn verify_signature(body: &[u8], signature_header: Option<&str>, secret: &str) -> bool {
    if secret.is_empty() {
        return true;
    }
    verify_github_signature(body, signature_header, secret).is_ok()
}

/// Computes the `sha256=<hex>` header value GitHub would send for `body`.
pub fn sign_body(body: &[u8], secret: &str) -> String {
    // HMAC accepts keys of any length, including empty
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(body);
    format!(
        "{SUPPORTED_ALGORITHM}={}",
        hex::encode(mac.finalize().into_bytes())
    )
}
