//! Interactive terminal prompts (dialoguer).
//!
//! Only consulted when a value cannot be resolved from flags or
//! configuration: pool/stage selection in interactive mode, and the MFA
//! code of last resort.

use crate::auth::CodePrompt;
use crate::error::AuthError;
use async_trait::async_trait;
use dialoguer::{Input, Select};
use tokio::task;

/// Single selection from `options`, returning the chosen value.
///
/// # Errors
/// `AuthError::Prompt` when the terminal interaction fails.
pub fn select_from(prompt: &str, options: &[String]) -> Result<String, AuthError> {
    let index = Select::new()
        .with_prompt(prompt)
        .items(options)
        .default(0)
        .interact()
        .map_err(|err| AuthError::Prompt {
            message: err.to_string(),
        })?;

    Ok(options[index].clone())
}

/// Free-text MFA code entry.
///
/// # Errors
/// `AuthError::Prompt` when the terminal interaction fails.
pub fn input_mfa_code() -> Result<String, AuthError> {
    let code: String = Input::new()
        .with_prompt("Please enter MFA code")
        .interact_text()
        .map_err(|err| AuthError::Prompt {
            message: err.to_string(),
        })?;

    Ok(code.trim().to_string())
}

/// [`CodePrompt`] backed by the local terminal, for single-shot and
/// interactive runs. Blocking dialoguer calls run on the blocking pool.
pub struct TerminalPrompt;

#[async_trait]
impl CodePrompt for TerminalPrompt {
    async fn mfa_code(&self) -> Result<String, AuthError> {
        task::spawn_blocking(input_mfa_code)
            .await
            .map_err(|err| AuthError::Prompt {
                message: err.to_string(),
            })?
    }
}
