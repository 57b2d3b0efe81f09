//! Narrow seam to the identity provider's sign-in protocol.
//!
//! The orchestrator only ever sees [`Directory`]; the Cognito implementation
//! wraps the official SDK and maps its errors onto [`AuthError`] kinds while
//! preserving the provider's own code and message.

use crate::error::AuthError;
use crate::registry::StageRecord;
use async_trait::async_trait;
use aws_config::{timeout::TimeoutConfig, BehaviorVersion, Region};
use aws_sdk_cognitoidentityprovider::{
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    operation::{
        initiate_auth::InitiateAuthError, respond_to_auth_challenge::RespondToAuthChallengeError,
    },
    types::{AuthFlowType, ChallengeNameType},
    Client,
};
use secrecy::ExposeSecret;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of the password step.
#[derive(Debug)]
pub enum SignIn {
    /// The provider issued a session directly; no challenge required.
    Authenticated { id_token: String },
    /// The provider demands a software-token MFA code for this session.
    SoftwareTokenMfa { session: String },
}

/// The remote sign-in capability the orchestrator drives.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Submit username/password for `stage`.
    async fn begin_sign_in(&self, stage: &StageRecord) -> Result<SignIn, AuthError>;

    /// Answer a pending software-token challenge; returns the identity token.
    async fn confirm_challenge(
        &self,
        stage: &StageRecord,
        session: &str,
        code: &str,
    ) -> Result<String, AuthError>;
}

/// AWS Cognito user-pool implementation of [`Directory`].
///
/// A fresh client is configured per attempt because the region is a
/// property of the stage, not of the process.
#[derive(Debug, Clone)]
pub struct CognitoDirectory {
    operation_timeout: Duration,
}

impl CognitoDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self {
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(operation_timeout: Duration) -> Self {
        Self { operation_timeout }
    }

    async fn client(&self, stage: &StageRecord) -> Client {
        // USER_PASSWORD_AUTH is an unsigned call; no AWS credentials needed.
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(stage.region.clone()))
            .no_credentials()
            .timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(self.operation_timeout)
                    .build(),
            )
            .load()
            .await;

        Client::new(&config)
    }
}

impl Default for CognitoDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Directory for CognitoDirectory {
    async fn begin_sign_in(&self, stage: &StageRecord) -> Result<SignIn, AuthError> {
        debug!(
            region = %stage.region,
            pool_id = %stage.pool_id,
            client_id = %stage.client_id,
            "initiating sign-in"
        );

        let client = self.client(stage).await;

        let response = client
            .initiate_auth()
            .auth_flow(AuthFlowType::UserPasswordAuth)
            .client_id(&stage.client_id)
            .auth_parameters("USERNAME", &stage.username)
            .auth_parameters("PASSWORD", stage.password.expose_secret())
            .send()
            .await
            .map_err(|err| match err {
                SdkError::ServiceError(ctx) => map_initiate_service_error(ctx.into_err()),
                other => AuthError::ProviderUnavailable {
                    message: DisplayErrorContext(&other).to_string(),
                },
            })?;

        if let Some(result) = response.authentication_result() {
            let id_token = result
                .id_token()
                .ok_or_else(|| AuthError::ProviderUnavailable {
                    message: "authentication result carried no identity token".to_string(),
                })?;
            return Ok(SignIn::Authenticated {
                id_token: id_token.to_string(),
            });
        }

        match response.challenge_name() {
            Some(ChallengeNameType::SoftwareTokenMfa) => {
                let session = response
                    .session()
                    .ok_or_else(|| AuthError::ProviderUnavailable {
                        message: "challenge response carried no session".to_string(),
                    })?;
                Ok(SignIn::SoftwareTokenMfa {
                    session: session.to_string(),
                })
            }
            Some(other) => Err(AuthError::UnsupportedChallenge {
                challenge: other.as_str().to_string(),
            }),
            None => Err(AuthError::ProviderUnavailable {
                message: "provider returned neither a session nor a challenge".to_string(),
            }),
        }
    }

    async fn confirm_challenge(
        &self,
        stage: &StageRecord,
        session: &str,
        code: &str,
    ) -> Result<String, AuthError> {
        let client = self.client(stage).await;

        let response = client
            .respond_to_auth_challenge()
            .client_id(&stage.client_id)
            .challenge_name(ChallengeNameType::SoftwareTokenMfa)
            .session(session)
            .challenge_responses("USERNAME", &stage.username)
            .challenge_responses("SOFTWARE_TOKEN_MFA_CODE", code)
            .send()
            .await
            .map_err(|err| match err {
                SdkError::ServiceError(ctx) => map_challenge_service_error(ctx.into_err()),
                other => AuthError::ProviderUnavailable {
                    message: DisplayErrorContext(&other).to_string(),
                },
            })?;

        response
            .authentication_result()
            .and_then(|result| result.id_token())
            .map(ToString::to_string)
            .ok_or_else(|| AuthError::ProviderUnavailable {
                message: "challenge confirmation carried no identity token".to_string(),
            })
    }
}

fn map_initiate_service_error(err: InitiateAuthError) -> AuthError {
    let message = err
        .meta()
        .message()
        .map_or_else(|| err.to_string(), ToString::to_string);

    if err.is_password_reset_required_exception() {
        return AuthError::PasswordResetRequired { message };
    }

    if err.is_not_authorized_exception() || err.is_user_not_found_exception() {
        let code = err
            .meta()
            .code()
            .unwrap_or("NotAuthorizedException")
            .to_string();
        return AuthError::InvalidCredentials { code, message };
    }

    AuthError::ProviderUnavailable {
        message: format!("{}: {message}", err.meta().code().unwrap_or("ServiceError")),
    }
}

fn map_challenge_service_error(err: RespondToAuthChallengeError) -> AuthError {
    let message = err
        .meta()
        .message()
        .map_or_else(|| err.to_string(), ToString::to_string);

    if err.is_password_reset_required_exception() {
        return AuthError::PasswordResetRequired { message };
    }

    if err.is_code_mismatch_exception()
        || err.is_expired_code_exception()
        || err.is_not_authorized_exception()
    {
        let code = err
            .meta()
            .code()
            .unwrap_or("CodeMismatchException")
            .to_string();
        return AuthError::MfaRejected { code, message };
    }

    AuthError::ProviderUnavailable {
        message: format!("{}: {message}", err.meta().code().unwrap_or("ServiceError")),
    }
}
