use crate::auth::directory::CognitoDirectory;
use crate::cli::actions::Action;
use crate::config::{self, DEFAULT_PORT};
use crate::registry::Registry;
use crate::server::{self, DynDirectory};
use anyhow::{bail, Context, Result};
use std::{env, sync::Arc};

/// Tunes the listening port when `--server` carries no value.
pub const PORT_ENV: &str = "COGNITO_PORT";

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    let Action::Server { port } = action else {
        bail!("not a server action");
    };

    let Some(config) = config::load_or_scaffold()? else {
        return Ok(());
    };

    let port = resolve_port(port, config.settings.port)?;

    let registry = Arc::new(Registry::from_config(&config)?);

    print_routes(&registry, port);

    let directory: DynDirectory = Arc::new(CognitoDirectory::new());

    server::new(port, registry, directory).await
}

// flag beats COGNITO_PORT, COGNITO_PORT beats config, config beats the
// built-in default
fn resolve_port(flag: Option<u16>, settings: Option<u16>) -> Result<u16> {
    if let Some(port) = flag {
        return Ok(port);
    }

    if let Ok(raw) = env::var(PORT_ENV) {
        if !raw.is_empty() {
            return raw
                .parse()
                .with_context(|| format!("invalid {PORT_ENV}: {raw:?}"));
        }
    }

    Ok(settings.unwrap_or(DEFAULT_PORT))
}

/// One line per stage so operators can copy-paste the URLs straight away.
fn print_routes(registry: &Registry, port: u16) {
    println!("Serving tokens on http://localhost:{port}\n");

    for pool in registry.pools() {
        println!("  ➜ {}", pool.name());
        for (stage, record) in pool.stages() {
            let mfa = if record.otp_secret.is_some() {
                " (automatic MFA handling)"
            } else {
                ""
            };
            println!(
                "    ↳ http://localhost:{port}/{}/{stage}{mfa}",
                pool.name()
            );
        }
    }

    println!("\nAppend ?token=<code> to answer an MFA challenge manually.\n");
}
