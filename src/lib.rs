//! # cognito-cli
//!
//! Issues short-lived identity tokens for AWS Cognito user pools declared in
//! a local configuration file. Each pool groups one or more stages
//! (dev/prod/...), and each stage carries its own pool id, app client id, and
//! credentials, plus an optional TOTP secret for automatic MFA handling.
//!
//! Three delivery modes share the same sign-in orchestration:
//!
//! - **Single-shot**: `cognito --pool <name> --stage <name>` prints the token.
//! - **Interactive**: `cognito` with no arguments prompts for pool and stage
//!   and copies the token to the clipboard.
//! - **Server**: `cognito --server [port]` answers `GET /{pool}/{stage}` with
//!   a JSON token body, one independent sign-in per request.

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod prompt;
pub mod registry;
pub mod server;
pub mod totp;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
