//! CLI argument parsing module
//!
//! This module handles command-line argument parsing and application entry point.

use std::collections::HashMap;

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use serde_json::Value;

use crate::api::{ConversionOptions, TonicPow};
use crate::config::{ClientOptions, Config, Environment};
use crate::error::TonicPowError;
use crate::exit_code::exit_code_for_error;
use crate::http::HttpClient;
use crate::session::{extract_session_token_from_header, Session, API_COOKIE_NAME};
use crate::utils::StringUtils;

/// Main entry point for the CLI application
pub fn run() {
    let matches = create_app().get_matches();
    crate::logging::init(matches.get_flag("verbose"));

    if let Err(err) = run_with_args(&matches) {
        eprintln!("tonicpow: error: {:#}", err);
        std::process::exit(exit_code(&err));
    }
}

fn exit_code(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<TonicPowError>())
        .map(exit_code_for_error)
        .unwrap_or(1)
}

/// Run with parsed command line arguments
fn run_with_args(matches: &ArgMatches) -> Result<()> {
    let (name, sub) = matches
        .subcommand()
        .context("a command is required (see --help)")?;

    if name == "extract-token" {
        let header = required(sub, "cookie-header")?;
        let cookie_name = sub
            .get_one::<String>("cookie-name")
            .map(String::as_str)
            .unwrap_or(API_COOKIE_NAME);
        println!("{}", extract_session_token_from_header(header, cookie_name));
        return Ok(());
    }

    let mut client = build_client(matches)?;
    let rt = tokio::runtime::Runtime::new().context("failed to create async runtime")?;
    let headers = parse_headers(matches)?;
    rt.block_on(async {
        // -H applies to the session call (if one is made) and the command call
        client.session_mut().set_custom_headers(headers.clone());
        client.auth().await.context("failed to establish api session")?;
        client.session_mut().set_custom_headers(headers);

        let body = match name {
            "session" => {
                let token = client.session().api_token().unwrap_or_default().to_string();
                Value::String(token)
            }
            "rate" => {
                let currency = required(sub, "currency")?;
                let amount = sub.get_one::<f64>("amount").copied().unwrap_or(1.0);
                client
                    .get_current_rate(currency, amount)
                    .await
                    .with_context(|| format!("failed to get rate for {}", currency))?
            }
            "campaigns" => client
                .list_campaigns(None)
                .await
                .context("failed to list campaigns")?,
            "campaign" => {
                let id = sub.get_one::<u64>("id").copied().context("campaign id is required")?;
                client
                    .get_campaign(id, None)
                    .await
                    .with_context(|| format!("failed to get campaign {}", id))?
            }
            "convert" => {
                let options = ConversionOptions {
                    additional_data: sub.get_one::<String>("data").cloned().unwrap_or_default(),
                    delay_in_minutes: sub.get_one::<u32>("delay").copied().unwrap_or(0),
                };
                client
                    .create_conversion_by_goal_name(
                        required(sub, "goal")?,
                        required(sub, "visitor-session")?,
                        &options,
                    )
                    .await
                    .context("failed to create conversion")?
            }
            other => anyhow::bail!("unknown command '{}'", other),
        };

        print_body(&body)
    })
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str> {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .with_context(|| format!("--{} is required", name))
}

fn print_body(body: &Value) -> Result<()> {
    match body {
        Value::String(text) => println!("{}", text),
        other => println!("{}", serde_json::to_string_pretty(other)?),
    }
    Ok(())
}

/// Build the API client from global options
fn build_client(matches: &ArgMatches) -> Result<TonicPow> {
    let api_key = matches
        .get_one::<String>("api-key")
        .cloned()
        .unwrap_or_default();
    let environment = match matches.get_one::<String>("environment") {
        Some(name) => name.parse::<Environment>()?,
        None => Environment::default(),
    };
    let options = ClientOptions {
        environment,
        token: matches.get_one::<String>("token").cloned(),
        ..Default::default()
    };

    let config = Config::new(api_key, options.environment)?;
    let http = match matches.get_one::<String>("api-url") {
        Some(url) => HttpClient::with_base_url(url, &options)?,
        None => HttpClient::new(&options)?,
    };
    Ok(TonicPow::from_parts(
        config,
        Session::from_options(&options),
        http,
    ))
}

fn parse_headers(matches: &ArgMatches) -> Result<HashMap<String, String>> {
    let mut headers = HashMap::new();
    if let Some(values) = matches.get_many::<String>("header") {
        for raw in values {
            let (key, value) = StringUtils::parse_header(raw)?;
            headers.insert(key, value);
        }
    }
    Ok(headers)
}

/// Create the CLI application structure
fn create_app() -> Command {
    Command::new("tonicpow")
        .version(crate::VERSION)
        .about("Command line client for the TonicPow API")
        .subcommand_required(true)
        .arg(Arg::new("api-key")
            .long("api-key")
            .env("TONICPOW_API_KEY")
            .hide_env_values(true)
            .value_name("KEY")
            .global(true)
            .help("API key for the selected environment"))
        .arg(Arg::new("environment")
            .short('e')
            .long("environment")
            .value_name("ENV")
            .global(true)
            .help("live, staging, local or mock"))
        .arg(Arg::new("api-url")
            .long("api-url")
            .value_name("URL")
            .global(true)
            .hide(true)
            .help("Send requests to this base URL instead of the environment's"))
        .arg(Arg::new("token")
            .long("token")
            .value_name("TOKEN")
            .global(true)
            .help("Existing API session token"))
        .arg(Arg::new("header")
            .short('H')
            .long("header")
            .value_name("HEADER")
            .global(true)
            .help("Add custom HTTP header")
            .action(ArgAction::Append))
        .arg(Arg::new("verbose")
            .short('v')
            .long("verbose")
            .global(true)
            .help("Verbose output")
            .action(ArgAction::SetTrue))
        .subcommand(Command::new("session")
            .about("Create (or reuse) an API session and print its token"))
        .subcommand(Command::new("rate")
            .about("Show the current exchange rate")
            .arg(Arg::new("currency")
                .value_name("CURRENCY")
                .required(true)
                .index(1))
            .arg(Arg::new("amount")
                .long("amount")
                .value_name("N")
                .value_parser(value_parser!(f64))
                .help("Amount to convert")))
        .subcommand(Command::new("campaigns")
            .about("List campaigns"))
        .subcommand(Command::new("campaign")
            .about("Show one campaign")
            .arg(Arg::new("id")
                .value_name("ID")
                .required(true)
                .value_parser(value_parser!(u64))
                .index(1)))
        .subcommand(Command::new("convert")
            .about("Fire a conversion by goal name")
            .arg(Arg::new("goal")
                .long("goal")
                .value_name("NAME")
                .required(true))
            .arg(Arg::new("visitor-session")
                .long("visitor-session")
                .value_name("SESSION")
                .required(true))
            .arg(Arg::new("data")
                .long("data")
                .value_name("DATA")
                .help("Additional data stored with the conversion"))
            .arg(Arg::new("delay")
                .long("delay")
                .value_name("MINUTES")
                .value_parser(value_parser!(u32))
                .help("Delay before processing")))
        .subcommand(Command::new("extract-token")
            .about("Print the session token found in a cookie header")
            .arg(Arg::new("cookie-header")
                .value_name("HEADER")
                .required(true)
                .index(1))
            .arg(Arg::new("cookie-name")
                .long("cookie-name")
                .value_name("NAME")
                .help("Cookie to look for")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_definition_is_consistent() {
        create_app().debug_assert();
    }

    #[test]
    fn headers_are_collected_from_repeated_flags() {
        let matches = create_app()
            .try_get_matches_from([
                "tonicpow",
                "-H",
                "X-One: 1",
                "-H",
                "X-Two: 2",
                "campaigns",
            ])
            .expect("parse");
        let headers = parse_headers(&matches).expect("headers");
        assert_eq!(headers.get("X-One").map(String::as_str), Some("1"));
        assert_eq!(headers.get("X-Two").map(String::as_str), Some("2"));
    }

    #[test]
    fn short_api_key_is_a_configuration_error() {
        let matches = create_app()
            .try_get_matches_from(["tonicpow", "--api-key", "short", "session"])
            .expect("parse");
        let err = build_client(&matches).expect_err("short key");
        assert_eq!(exit_code(&err), 2);
    }

    #[test]
    fn unknown_environment_is_rejected() {
        let matches = create_app()
            .try_get_matches_from([
                "tonicpow",
                "--api-key",
                "0123456789012345678901234567890123",
                "--environment",
                "prod",
                "session",
            ])
            .expect("parse");
        let err = build_client(&matches).expect_err("environment");
        assert!(err.to_string().contains("prod"));
        assert_eq!(exit_code(&err), 2);
    }
}
