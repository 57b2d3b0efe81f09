//! On-demand token server: one independent sign-in per request.

use crate::auth::directory::Directory;
use crate::registry::Registry;
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    routing::get,
    Extension, Json, Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use utoipa::OpenApi;

pub mod handlers;

/// Shared handle to the identity provider seam, injected per request.
pub type DynDirectory = Arc<dyn Directory>;

#[derive(OpenApi)]
#[openapi(
    paths(handlers::token::token, handlers::health::health),
    components(schemas(handlers::token::Token, handlers::token::ErrorBody)),
    tags(
        (name = "token", description = "On-demand identity token issuance")
    )
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

/// Build the application router.
///
/// The registry and directory ride along as extensions; every request runs
/// its own sign-in attempt against the shared read-only registry.
#[must_use]
pub fn router(registry: Arc<Registry>, directory: DynDirectory) -> Router {
    Router::new()
        .route("/:pool/:stage", get(handlers::token))
        .route("/health", get(handlers::health))
        .route("/openapi.json", get(openapi_json))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(registry))
                .layer(Extension(directory)),
        )
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(openapi())
}

/// Start the server
/// # Errors
/// Return error if the listening port cannot be bound
pub async fn new(port: u16, registry: Arc<Registry>, directory: DynDirectory) -> Result<()> {
    let app = router(registry, directory);

    let listener = TcpListener::bind(format!("::0:{port}"))
        .await
        .with_context(|| format!("failed to bind port {port}"))?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
