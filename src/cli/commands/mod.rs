use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ColorChoice, Command,
};

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("cognito")
        .about("Fetch identity tokens from Cognito user pools")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("pool")
                .short('p')
                .long("pool")
                .help("Pool to sign in against, matched case-insensitively")
                .env("COGNITO_POOL"),
        )
        .arg(
            Arg::new("stage")
                .short('s')
                .long("stage")
                .help("Stage within the pool, matched case-insensitively")
                .env("COGNITO_STAGE"),
        )
        .arg(
            Arg::new("copy")
                .short('c')
                .long("copy")
                .help("Copy the token to the clipboard")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("token")
                .short('t')
                .long("token")
                .help("Six-digit MFA code to answer a software token challenge"),
        )
        .arg(
            Arg::new("server")
                .short('S')
                .long("server")
                .help("Serve tokens over HTTP, optionally on the given port")
                .value_name("PORT")
                .num_args(0..=1)
                .default_missing_value(""),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("COGNITO_LOG_LEVEL")
                .global(true)
                .action(clap::ArgAction::Count)
                .value_parser(validator_log_level()),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "cognito");
        assert_eq!(
            command.get_about().unwrap().to_string(),
            "Fetch identity tokens from Cognito user pools"
        );
        assert_eq!(
            command.get_version().unwrap().to_string(),
            env!("CARGO_PKG_VERSION")
        );
    }

    #[test]
    fn test_check_pool_and_stage() {
        let command = new();
        let matches =
            command.get_matches_from(vec!["cognito", "--pool", "example", "--stage", "dev"]);

        assert_eq!(
            matches.get_one::<String>("pool").map(|s| s.to_string()),
            Some("example".to_string())
        );
        assert_eq!(
            matches.get_one::<String>("stage").map(|s| s.to_string()),
            Some("dev".to_string())
        );
        assert!(!matches.get_flag("copy"));
        assert!(matches.get_one::<String>("token").is_none());
        assert!(matches.get_one::<String>("server").is_none());
    }

    #[test]
    fn test_check_copy_and_token() {
        let command = new();
        let matches = command.get_matches_from(vec![
            "cognito", "-p", "example", "-s", "dev", "-c", "-t", "123456",
        ]);

        assert!(matches.get_flag("copy"));
        assert_eq!(
            matches.get_one::<String>("token").map(|s| s.to_string()),
            Some("123456".to_string())
        );
    }

    #[test]
    fn test_check_server_without_port() {
        let command = new();
        let matches = command.get_matches_from(vec!["cognito", "--server"]);

        assert_eq!(
            matches.get_one::<String>("server").map(|s| s.to_string()),
            Some(String::new())
        );
    }

    #[test]
    fn test_check_server_with_port() {
        let command = new();
        let matches = command.get_matches_from(vec!["cognito", "-S", "9000"]);

        assert_eq!(
            matches.get_one::<String>("server").map(|s| s.to_string()),
            Some("9000".to_string())
        );
    }

    #[test]
    fn test_env_port_does_not_enable_server() {
        // COGNITO_PORT only tunes the port, never selects the mode
        temp_env::with_vars([("COGNITO_PORT", Some("9000"))], || {
            let command = new();
            let matches = command.get_matches_from(vec!["cognito", "-p", "example"]);
            assert!(matches.get_one::<String>("server").is_none());
        });
    }

    #[test]
    fn test_check_env() {
        temp_env::with_vars(
            [
                ("COGNITO_POOL", Some("example")),
                ("COGNITO_STAGE", Some("prod")),
                ("COGNITO_LOG_LEVEL", Some("info")),
            ],
            || {
                let command = new();
                let matches = command.get_matches_from(vec!["cognito"]);
                assert_eq!(
                    matches.get_one::<String>("pool").map(|s| s.to_string()),
                    Some("example".to_string())
                );
                assert_eq!(
                    matches.get_one::<String>("stage").map(|s| s.to_string()),
                    Some("prod".to_string())
                );
                assert_eq!(matches.get_one::<u8>("verbosity").map(|s| *s), Some(2));
            },
        );
    }

    #[test]
    fn test_check_log_level_env() {
        // loop cover all possible value_parse
        let levels = vec!["error", "warn", "info", "debug", "trace"];
        for (index, &level) in levels.iter().enumerate() {
            temp_env::with_vars([("COGNITO_LOG_LEVEL", Some(level))], || {
                let command = new();
                let matches = command.get_matches_from(vec!["cognito"]);
                assert_eq!(
                    matches.get_one::<u8>("verbosity").map(|s| *s),
                    Some(index as u8)
                );
            });
        }
    }

    #[test]
    fn test_check_log_level_verbosity() {
        // loop cover all possible value_parse
        let levels = vec!["error", "warn", "info", "debug", "trace"];
        for (index, _) in levels.iter().enumerate() {
            temp_env::with_vars([("COGNITO_LOG_LEVEL", None::<String>)], || {
                let mut args = vec!["cognito".to_string()];

                // Add the appropriate number of "-v" flags based on the index
                if index > 0 {
                    let v = format!("-{}", "v".repeat(index));
                    args.push(v);
                }

                let command = new();
                let matches = command.get_matches_from(args);

                assert_eq!(
                    matches.get_one::<u8>("verbosity").map(|s| *s),
                    Some(index as u8)
                );
            });
        }
    }
}
