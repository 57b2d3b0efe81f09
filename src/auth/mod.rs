//! Sign-in orchestration: one authentication attempt per call.
//!
//! The attempt walks password submit → optional software-token challenge →
//! identity token, resolving the challenge code by priority: caller-supplied
//! code, then the stage's stored TOTP secret, then the [`CodePrompt`]
//! collaborator. No step is ever retried here; a rejection is terminal and
//! the caller may start a fresh attempt.

pub mod directory;

use crate::error::AuthError;
use crate::registry::{Registry, StageRecord};
use crate::totp;
use async_trait::async_trait;
use directory::{Directory, SignIn};
use regex::Regex;
use secrecy::ExposeSecret;
use std::time::SystemTime;
use tracing::debug;

/// The single suspension point of the orchestrator: asked for a code only
/// when neither a supplied code nor a stored secret can resolve a challenge.
#[async_trait]
pub trait CodePrompt: Send + Sync {
    async fn mfa_code(&self) -> Result<String, AuthError>;
}

/// Server-mode prompt: requests must never block on local terminal input,
/// so an unresolvable challenge fails instead of suspending.
pub struct NoPrompt;

#[async_trait]
impl CodePrompt for NoPrompt {
    async fn mfa_code(&self) -> Result<String, AuthError> {
        Err(AuthError::MfaCodeRequired)
    }
}

/// MFA codes are always exactly six digits here.
#[must_use]
pub fn valid_mfa_code(code: &str) -> bool {
    Regex::new(r"^[0-9]{6}$").map_or(false, |re| re.is_match(code))
}

/// Resolve `(pool, stage)` against the registry, then authenticate.
///
/// Shared by the single-shot, interactive, and server façades.
///
/// # Errors
/// Registry resolution and authentication failures, per [`AuthError`].
pub async fn deliver(
    registry: &Registry,
    directory: &dyn Directory,
    pool: &str,
    stage: &str,
    supplied_code: Option<&str>,
    prompt: &dyn CodePrompt,
) -> Result<String, AuthError> {
    let record = registry.lookup(pool, stage)?;
    authenticate(directory, record, supplied_code, prompt).await
}

/// Drive one sign-in attempt for `stage` and return the identity token.
///
/// # Errors
/// Any rejection from the provider, an invalid stored secret, or a prompt
/// failure; all terminal, never retried.
pub async fn authenticate(
    directory: &dyn Directory,
    stage: &StageRecord,
    supplied_code: Option<&str>,
    prompt: &dyn CodePrompt,
) -> Result<String, AuthError> {
    match directory.begin_sign_in(stage).await? {
        SignIn::Authenticated { id_token } => Ok(id_token),
        SignIn::SoftwareTokenMfa { session } => {
            let code = resolve_code(stage, supplied_code, prompt).await?;
            directory.confirm_challenge(stage, &session, &code).await
        }
    }
}

async fn resolve_code(
    stage: &StageRecord,
    supplied_code: Option<&str>,
    prompt: &dyn CodePrompt,
) -> Result<String, AuthError> {
    if let Some(code) = supplied_code {
        debug!("using caller-supplied MFA code");
        return Ok(code.trim().to_string());
    }

    if let Some(secret) = &stage.otp_secret {
        debug!("generating MFA code from stored secret");
        return totp::generate(secret.expose_secret(), SystemTime::now());
    }

    debug!("no code or secret available, asking the prompt collaborator");
    prompt.mfa_code().await
}
