use crate::auth::{self, directory::CognitoDirectory};
use crate::cli::actions::Action;
use crate::config;
use crate::prompt::{self, TerminalPrompt};
use crate::registry::Registry;
use anyhow::{anyhow, bail, Result};
use std::process;
use tokio::task;
use tracing::warn;

/// Handle single-shot and interactive token delivery.
///
/// # Errors
/// Configuration and prompt failures; authentication failures print a short
/// diagnostic and exit with status 1 instead, matching script usage.
pub async fn handle(action: Action) -> Result<()> {
    let Some(config) = config::load_or_scaffold()? else {
        return Ok(());
    };

    let registry = Registry::from_config(&config)?;

    let (pool, stage, copy, code, interactive) = match action {
        Action::Interactive => {
            let (pool, stage) = select_pool_and_stage(&registry, None, None).await?;
            (pool, stage, true, None, true)
        }
        Action::Token {
            pool,
            stage,
            copy,
            code,
        } => {
            let (pool, stage) = select_pool_and_stage(&registry, pool, stage).await?;
            (pool, stage, copy, code, false)
        }
        Action::Server { .. } => bail!("not a token action"),
    };

    if let Some(code) = &code {
        if !auth::valid_mfa_code(code) {
            bail!("MFA code must be exactly six digits, got {code:?}");
        }
    }

    let directory = CognitoDirectory::new();
    let prompt = TerminalPrompt;

    match auth::deliver(
        &registry,
        &directory,
        &pool,
        &stage,
        code.as_deref(),
        &prompt,
    )
    .await
    {
        Ok(token) => {
            println!("{token}");

            if copy {
                copy_to_clipboard(&token);
                if interactive {
                    println!(
                        "\nCopied token for {pool} {} to clipboard!",
                        stage.to_uppercase()
                    );
                }
            }

            Ok(())
        }
        Err(err) => {
            eprintln!("Failed to get token: {} - {err}", err.code());
            process::exit(1);
        }
    }
}

/// Fill in whichever of pool and stage is missing by asking the operator.
async fn select_pool_and_stage(
    registry: &Registry,
    pool: Option<String>,
    stage: Option<String>,
) -> Result<(String, String)> {
    let pool = match pool {
        Some(pool) => pool,
        None => {
            let options: Vec<String> = registry
                .pool_names()
                .iter()
                .map(ToString::to_string)
                .collect();
            run_select("What pool would you like to use?", options).await?
        }
    };

    let stage = match stage {
        Some(stage) => stage,
        None => {
            let options: Vec<String> = registry
                .stage_names(&pool)?
                .iter()
                .map(ToString::to_string)
                .collect();
            run_select("And for what stage?", options).await?
        }
    };

    Ok((pool, stage))
}

async fn run_select(message: &'static str, options: Vec<String>) -> Result<String> {
    if options.is_empty() {
        bail!("nothing to select from, check the configuration file");
    }

    let choice = task::spawn_blocking(move || prompt::select_from(message, &options))
        .await
        .map_err(|err| anyhow!("selection task failed: {err}"))??;

    Ok(choice)
}

// Clipboard access is best effort, a headless session should not kill the run.
fn copy_to_clipboard(token: &str) {
    match arboard::Clipboard::new() {
        Ok(mut clipboard) => {
            if let Err(err) = clipboard.set_text(token.to_string()) {
                warn!("could not copy token to clipboard: {err}");
            }
        }
        Err(err) => warn!("clipboard unavailable: {err}"),
    }
}
