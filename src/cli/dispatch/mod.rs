use crate::cli::actions::Action;
use anyhow::{bail, Result};

/// Turn parsed arguments into the action to run.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    if let Some(raw) = matches.get_one::<String>("server") {
        // --server without a value leaves the config (or default) port in charge
        let port = if raw.is_empty() {
            None
        } else {
            match raw.parse::<u16>() {
                Ok(port) => Some(port),
                Err(_) => bail!("invalid port: {raw}"),
            }
        };

        return Ok(Action::Server { port });
    }

    let pool = matches.get_one::<String>("pool").map(String::to_string);
    let stage = matches.get_one::<String>("stage").map(String::to_string);

    if pool.is_none() && stage.is_none() {
        bail!("Please specify either a pool or a stage. See --help for help.");
    }

    Ok(Action::Token {
        pool,
        stage,
        copy: matches.get_flag("copy"),
        code: matches.get_one::<String>("token").map(String::to_string),
    })
}
