use thiserror::Error;

/// Failures surfaced by registry resolution and the sign-in flow.
///
/// Provider-originated variants keep the provider's own error code and
/// message so both the console renderer and the HTTP error body can show
/// them verbatim.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("pool {pool:?} not found in configuration")]
    PoolNotFound { pool: String },

    #[error("stage {stage:?} not found for pool {pool:?}")]
    StageNotFound { pool: String, stage: String },

    #[error("{message}")]
    InvalidCredentials { code: String, message: String },

    #[error("{message}")]
    PasswordResetRequired { message: String },

    #[error("unsupported authentication challenge: {challenge}")]
    UnsupportedChallenge { challenge: String },

    #[error("{message}")]
    MfaRejected { code: String, message: String },

    #[error("an MFA code is required; pass ?token=<code> or store an otpSecret")]
    MfaCodeRequired,

    #[error("invalid TOTP secret: {message}")]
    InvalidSecret { message: String },

    #[error("identity provider unavailable: {message}")]
    ProviderUnavailable { message: String },

    #[error("prompt failed: {message}")]
    Prompt { message: String },

    #[error("{message}")]
    Usage { message: String },
}

impl AuthError {
    /// Short machine-readable code, preferring the provider-supplied one.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::PoolNotFound { .. } => "PoolNotFound",
            Self::StageNotFound { .. } => "StageNotFound",
            Self::InvalidCredentials { code, .. } | Self::MfaRejected { code, .. } => code,
            Self::PasswordResetRequired { .. } => "PasswordResetRequiredException",
            Self::UnsupportedChallenge { .. } => "UnsupportedChallenge",
            Self::MfaCodeRequired => "MfaCodeRequired",
            Self::InvalidSecret { .. } => "InvalidSecret",
            Self::ProviderUnavailable { .. } => "ProviderUnavailable",
            Self::Prompt { .. } => "PromptFailed",
            Self::Usage { .. } => "UsageError",
        }
    }
}
