//! Time-based one-time passwords for stages with a stored `otpSecret`.

use crate::error::AuthError;
use std::time::{SystemTime, UNIX_EPOCH};
use totp_rs::{Algorithm, Secret, TOTP};

pub const DIGITS: usize = 6;
pub const PERIOD: u64 = 30;

/// Generate the 6-digit code for `secret` (base32) at `at`.
///
/// Standard RFC 6238 parameters: HMAC-SHA1, 30-second period, zero-padded
/// to six digits. Deterministic within a 30-second window.
///
/// # Errors
/// Returns `AuthError::InvalidSecret` if `secret` is not valid base32.
pub fn generate(secret: &str, at: SystemTime) -> Result<String, AuthError> {
    let secret_bytes = Secret::Encoded(secret.trim().to_string())
        .to_bytes()
        .map_err(|err| AuthError::InvalidSecret {
            message: format!("{err:?}"),
        })?;

    let seconds = at
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    let totp = TOTP::new_unchecked(Algorithm::SHA1, DIGITS, 1, PERIOD, secret_bytes);

    Ok(totp.generate(seconds))
}
