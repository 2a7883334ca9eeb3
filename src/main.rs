//! broker-cli
//!
//! Runs brokered calls from the command line with the same cache, retry,
//! secret and instrumentation stack a deployed handler uses.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;

use genai_broker::config::{load_or_default, validation::validate_config, BrokerConfig};
use genai_broker::observability::logging::init_logging;
use genai_broker::observability::{metrics, Instrumentation, MemorySink, SysinfoProbe};
use genai_broker::secrets::{names, SecretProvider};
use genai_broker::upstream::MAX_VIDEO_RESULTS;
use genai_broker::{Broker, BrokerError, RequestContext};

#[derive(Parser)]
#[command(name = "broker-cli")]
#[command(about = "Run cached, retried GenAI and search calls", long_about = None)]
struct Cli {
    /// TOML configuration file; built-in defaults when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print the structured records of the invocation to stdout afterwards.
    #[arg(long, global = true)]
    trace: bool,

    /// User id attached to log records.
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Web search through the Custom Search API
    Search { query: String },
    /// Video search through the YouTube Data API
    Videos {
        query: String,
        #[arg(long, default_value_t = 5)]
        max: u32,
    },
    /// Generate text with Gemini
    Generate { prompt: String },
    /// Resolve a secret and print it masked
    Secret { name: String },
    /// Validate the configuration, print the effective values and
    /// report which known secrets resolve
    CheckConfig,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config.observability);
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: BrokerConfig) -> Result<(), Box<dyn std::error::Error>> {
    if let Commands::CheckConfig = cli.command {
        return check_config(&config).await;
    }

    let sink = Arc::new(MemorySink::new());
    let instrumentation = if cli.trace {
        Instrumentation::new(sink.clone(), Arc::new(SysinfoProbe::new()))
    } else {
        Instrumentation::tracing()
    };
    let broker = Broker::with_instrumentation(&config, Arc::new(instrumentation))?;
    let request = match cli.user {
        Some(user) => RequestContext::for_user(user),
        None => RequestContext::default(),
    };

    let outcome = match cli.command {
        Commands::Search { query } => broker
            .search(request, &query)
            .await
            .map_err(boxed)
            .and_then(|items| print_json(&items)),
        Commands::Videos { query, max } => {
            if max > MAX_VIDEO_RESULTS {
                tracing::warn!(requested = max, max = MAX_VIDEO_RESULTS, "Clamping video result count");
            }
            broker
                .videos(request, &query, max)
                .await
                .map_err(boxed)
                .and_then(|videos| print_json(&videos))
        }
        Commands::Generate { prompt } => broker.generate(request, &prompt).await.map_err(boxed).map(|text| {
            println!("{}", text);
        }),
        Commands::Secret { name } => broker
            .secrets()
            .get(&name)
            .await
            .map_err(|e| boxed(BrokerError::from(e)))
            .map(|value| println!("{} = {}", name, mask(&value))),
        Commands::CheckConfig => Ok(()),
    };

    // Dumped on failure as well.
    if cli.trace {
        for entry in sink.entries() {
            println!("{}", entry.to_json_line());
        }
    }
    outcome
}

async fn check_config(config: &BrokerConfig) -> Result<(), Box<dyn std::error::Error>> {
    if let Err(errors) = validate_config(config) {
        for error in &errors {
            eprintln!("  {}", error);
        }
        return Err(format!("{} configuration error(s)", errors.len()).into());
    }
    println!("{}", toml::to_string_pretty(config)?);

    let broker = Broker::from_config(config)?;
    println!("# secrets ({:?})", config.secrets.source);
    for line in secret_report(broker.secrets(), names::ALL).await {
        println!("{}", line);
    }
    Ok(())
}

/// One line per secret: masked value, or why it did not resolve.
async fn secret_report(secrets: &SecretProvider, names: &[&str]) -> Vec<String> {
    let mut lines = Vec::with_capacity(names.len());
    for name in names {
        let line = match secrets.get(name).await {
            Ok(value) => format!("{}: ok ({})", name, mask(&value)),
            Err(e) => format!("{}: unavailable ({})", name, e),
        };
        lines.push(line);
    }
    lines
}

fn boxed(e: BrokerError) -> Box<dyn std::error::Error> {
    Box::new(e)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// First and last four characters; short values are fully masked.
fn mask(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}{}", head, "*".repeat(chars.len() - 8), tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask() {
        assert_eq!(mask("short"), "*****");
        assert_eq!(mask("AIzaSyD-abcdefgh1234"), "AIza************1234");
    }

    #[tokio::test]
    async fn test_secret_report_covers_known_names() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(names::GEMINI_API_KEY), "AIzaSyD-abcdefgh1234\n").unwrap();
        let store = genai_broker::secrets::DirSecretStore::new(dir.path());
        let secrets = SecretProvider::new(Arc::new(store), std::time::Duration::from_secs(60));

        let lines = secret_report(&secrets, names::ALL).await;
        assert_eq!(lines.len(), names::ALL.len());
        assert_eq!(lines[0], "GEMINI_API_KEY: ok (AIza************1234)");
        for (line, name) in lines.iter().zip(names::ALL).skip(1) {
            assert!(line.starts_with(&format!("{}: unavailable (", name)), "{}", line);
        }
    }

    #[test]
    fn test_cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["broker-cli", "videos", "calm music", "--max", "10", "--trace"]).unwrap();
        assert!(cli.trace);
        match cli.command {
            Commands::Videos { query, max } => {
                assert_eq!(query, "calm music");
                assert_eq!(max, 10);
            }
            _ => panic!("expected videos"),
        }
    }
}
