use crate::auth::{self, NoPrompt};
use crate::error::AuthError;
use crate::registry::Registry;
use crate::server::DynDirectory;
use axum::{
    extract::rejection::QueryRejection,
    extract::{Extension, Path, Query},
    http::{header::CACHE_CONTROL, HeaderMap, HeaderValue, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, instrument};
use utoipa::{IntoParams, ToSchema};

#[derive(ToSchema, Serialize, Debug)]
pub struct Token {
    pub token: String,
}

#[derive(IntoParams, Debug, Deserialize, Default)]
#[into_params(parameter_in = Query)]
pub struct TokenQuery {
    /// Pre-supplied six-digit MFA code, bypassing secret-based resolution
    token: Option<String>,
}

/// Failure body; `token` is always null so a 2xx with a token can never be
/// confused with an error.
#[derive(ToSchema, Serialize, Debug)]
pub struct ErrorBody {
    pub token: Option<String>,
    pub code: String,
    pub message: String,
}

type TokenResponse = Result<(StatusCode, HeaderMap, Json<Token>), (StatusCode, Json<ErrorBody>)>;

#[utoipa::path(
    get,
    path = "/{pool}/{stage}",
    params(
        ("pool" = String, Path, description = "Pool name, matched case-insensitively"),
        ("stage" = String, Path, description = "Stage name, matched case-insensitively"),
        TokenQuery,
    ),
    responses(
        (status = 200, description = "Freshly issued identity token", body = Token),
        (status = 400, description = "Malformed request or unresolvable MFA challenge", body = ErrorBody),
        (status = 401, description = "Credentials or MFA code rejected", body = ErrorBody),
        (status = 404, description = "Unknown pool or stage", body = ErrorBody),
        (status = 502, description = "Identity provider unavailable", body = ErrorBody),
    ),
    tag = "token",
)]
#[instrument(skip_all, fields(%pool, %stage))]
pub async fn token(
    Extension(registry): Extension<Arc<Registry>>,
    Extension(directory): Extension<DynDirectory>,
    Path((pool, stage)): Path<(String, String)>,
    query: Result<Query<TokenQuery>, QueryRejection>,
) -> TokenResponse {
    let params = parse_query(query)?;

    if let Some(code) = &params.token {
        if !auth::valid_mfa_code(code) {
            return Err(error_response(&AuthError::Usage {
                message: "MFA code must be exactly six digits".to_string(),
            }));
        }
    }

    match auth::deliver(
        &registry,
        directory.as_ref(),
        &pool,
        &stage,
        params.token.as_deref(),
        &NoPrompt,
    )
    .await
    {
        Ok(jwt) => {
            debug!("issued identity token");
            let mut headers = HeaderMap::new();
            headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
            Ok((StatusCode::OK, headers, Json(Token { token: jwt })))
        }
        Err(err) => {
            error!("token request failed: {} - {err}", err.code());
            Err(error_response(&err))
        }
    }
}

fn parse_query(
    query: Result<Query<TokenQuery>, QueryRejection>,
) -> Result<TokenQuery, (StatusCode, Json<ErrorBody>)> {
    match query {
        Ok(Query(params)) => Ok(params),
        Err(rejection) => {
            error!("failed to parse query parameters: {rejection}");
            Err(error_response(&AuthError::Usage {
                message: "malformed query string".to_string(),
            }))
        }
    }
}

fn status_for(err: &AuthError) -> StatusCode {
    match err {
        AuthError::PoolNotFound { .. } | AuthError::StageNotFound { .. } => StatusCode::NOT_FOUND,
        AuthError::InvalidCredentials { .. }
        | AuthError::PasswordResetRequired { .. }
        | AuthError::MfaRejected { .. } => StatusCode::UNAUTHORIZED,
        AuthError::ProviderUnavailable { .. } => StatusCode::BAD_GATEWAY,
        AuthError::Prompt { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        AuthError::UnsupportedChallenge { .. }
        | AuthError::MfaCodeRequired
        | AuthError::InvalidSecret { .. }
        | AuthError::Usage { .. } => StatusCode::BAD_REQUEST,
    }
}

fn error_response(err: &AuthError) -> (StatusCode, Json<ErrorBody>) {
    (
        status_for(err),
        Json(ErrorBody {
            token: None,
            code: err.code().to_string(),
            message: err.to_string(),
        }),
    )
}
