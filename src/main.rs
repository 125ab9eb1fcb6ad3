use std::path::PathBuf;
use std::process::exit;
use std::time::Duration;

use chrono::Utc;
use clap::Parser;

use certchecker::check::{evaluate, CheckResult, Thresholds};
use certchecker::config::Config;
use certchecker::error::CheckError;
use certchecker::{CertificateFacts, StartTlsProtocol, Target};

mod metrics;

#[derive(Parser, Debug)]
#[command(name = "certchecker", version, about)]
struct Cli {
    /// Host to contact
    #[arg(long)]
    host: Option<String>,

    /// Port to use
    #[arg(long)]
    port: Option<u16>,

    /// Subject to expect, host is used if not specified
    #[arg(long)]
    subject: Option<String>,

    /// StartTLS protocol to negotiate before the handshake (smtp, imap, pop3)
    #[arg(long)]
    starttls: Option<String>,

    /// Number of days left for warning state
    #[arg(long = "expire-days-warning")]
    warning_days: Option<i64>,

    /// Number of days left for error state
    #[arg(long = "expire-days-error")]
    error_days: Option<i64>,

    /// Connect and read timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format: text or json
    #[arg(long)]
    output: Option<String>,

    /// Push check metrics to a Prometheus push gateway
    #[arg(long)]
    prometheus: bool,

    /// Prometheus push gateway address
    #[arg(long)]
    prometheus_address: Option<String>,

    /// Print an example configuration file and exit
    #[arg(long)]
    example_config: bool,
}

fn main() {
    let cli = Cli::parse();

    if cli.example_config {
        println!("{}", Config::example_toml());
        exit(0);
    }

    // Precedence: defaults < config file < CLI arguments.
    let mut config = Config::default();
    if let Some(path) = &cli.config {
        match Config::from_file(path) {
            Ok(file_config) => config = config.merge_with(file_config),
            Err(e) => {
                println!("Could not validate certificate: {}", e);
                exit(3);
            }
        }
    }
    config = config.merge_with(Config::from_cli_args(
        cli.host,
        cli.port,
        cli.subject,
        cli.starttls,
        cli.warning_days,
        cli.error_days,
        cli.timeout,
        cli.output,
        if cli.prometheus { Some(true) } else { None },
        cli.prometheus_address,
    ));

    let (result, days_left) = match run_check(&config) {
        Ok(outcome) => outcome,
        Err(e) => (CheckResult::from_error(&e), None),
    };

    match config.output.as_deref() {
        Some("json") => println!("{}", serde_json::to_string_pretty(&result).unwrap()),
        _ => println!("{}", result.message),
    }

    if let Some(prom) = &config.prometheus {
        if prom.enabled == Some(true) {
            let address = prom
                .address
                .clone()
                .unwrap_or_else(|| "http://localhost:9091".to_string());
            let host = config.host.as_deref().unwrap_or("");
            metrics::prom::push_check_metrics(&result, days_left, host, &address);
        }
    }

    exit(result.exit_code);
}

/// One check invocation: retrieve the peer certificate once, then apply
/// the pure evaluation. Every failure bubbles up to the caller, which
/// turns it into an UNKNOWN result.
fn run_check(config: &Config) -> Result<(CheckResult, Option<i64>), CheckError> {
    let host = config.host.clone().ok_or_else(|| CheckError::InvalidInput {
        field: "host".to_string(),
        reason: "no host configured".to_string(),
    })?;
    let target = Target {
        host,
        port: config.port.unwrap_or(443),
        starttls: parse_starttls(config.starttls.as_deref())?,
        timeout: Duration::from_secs(config.timeout.unwrap_or(30)),
    };
    let thresholds = Thresholds {
        warning_days: config.warning_days.unwrap_or(30),
        error_days: config.error_days.unwrap_or(15),
    };

    let facts = CertificateFacts::from_target(&target)?;
    let now = Utc::now();
    let days_left = (facts.not_after - now).num_days();
    let result = evaluate(&facts, now, config.subject.as_deref(), &thresholds, &target);
    Ok((result, Some(days_left)))
}

/// A blank protocol name means "no upgrade"; an unknown one fails the
/// check rather than probing the wrong protocol.
fn parse_starttls(raw: Option<&str>) -> Result<Option<StartTlsProtocol>, CheckError> {
    match raw {
        Some(s) if !s.trim().is_empty() => s
            .trim()
            .parse::<StartTlsProtocol>()
            .map(Some)
            .map_err(|_| CheckError::InvalidInput {
                field: "starttls".to_string(),
                reason: format!("unsupported protocol '{}'", s.trim()),
            }),
        _ => Ok(None),
    }
}
