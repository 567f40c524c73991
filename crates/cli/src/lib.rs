pub mod commands;

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use rolematrix_core::config::{AppConfig, LoadOptions, LogFormat, LoggingConfig};

#[derive(Debug, Parser)]
#[command(
    name = "rolematrix",
    about = "Route role requests to their approvers",
    long_about = "Resolve pasted role requests against a company's role matrix and print ticket text grouped by approver.",
    after_help = "Examples:\n  rolematrix resolve --company Acme --region West --client ProdC1 --input roles.txt\n  rolematrix companies --json\n  rolematrix doctor"
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        help = "Path to rolematrix.toml (defaults to ./rolematrix.toml or ./config/rolematrix.toml)"
    )]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Resolve role lines to approvers and print ticket text plus approver emails")]
    Resolve(ResolveArgs),
    #[command(about = "List configured companies with their regions, clients and single approvers")]
    Companies {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config and check every company's matrix tables")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

#[derive(Debug, Args)]
struct ResolveArgs {
    #[arg(long)]
    company: String,
    #[arg(long, help = "Region name or 1-based region number")]
    region: String,
    #[arg(long)]
    client: String,
    #[arg(long, help = "File with one requested role per line (reads stdin when omitted)")]
    input: Option<PathBuf>,
    #[arg(
        long = "single",
        value_name = "MENU_LABEL",
        help = "Add a single-approver grant; repeatable"
    )]
    singles: Vec<String>,
    #[arg(long, value_name = "YYYY-MM-DD", help = "Evaluate vacation coverage on this date")]
    as_of: Option<NaiveDate>,
    #[arg(long, help = "Emit machine-readable JSON output")]
    json: bool,
}

pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let options = LoadOptions { config_path: cli.config, ..LoadOptions::default() };
    init_logging(&logging_config(&options));

    let today = Local::now().date_naive();
    let result = match cli.command {
        Command::Resolve(args) => {
            let lines = read_lines(args.input.as_ref())?;
            commands::resolve::run(
                options,
                commands::resolve::ResolveRequest {
                    company: args.company,
                    region: args.region,
                    client: args.client,
                    singles: args.singles,
                    as_of: args.as_of.unwrap_or(today),
                    lines,
                    json: args.json,
                },
                today,
            )
        }
        Command::Companies { json } => commands::companies::run(options, today, json),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run(options) }
        }
        Command::Doctor { json } => commands::CommandResult {
            exit_code: 0,
            output: commands::doctor::run(options, today, json),
        },
    };

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", result.output).context("failed to write command output")?;
    Ok(ExitCode::from(result.exit_code))
}

fn read_lines(input: Option<&PathBuf>) -> Result<Vec<String>> {
    let raw = match input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read role lines from `{}`", path.display()))?,
        None => {
            let mut raw = String::new();
            io::stdin().read_to_string(&mut raw).context("failed to read role lines from stdin")?;
            raw
        }
    };

    Ok(raw.lines().map(str::to_string).collect())
}

/// Logging settings for the run; config errors are reported by the command itself.
fn logging_config(options: &LoadOptions) -> LoggingConfig {
    AppConfig::load(options.clone())
        .map(|config| config.logging)
        .unwrap_or_else(|_| AppConfig::default().logging)
}

fn init_logging(logging: &LoggingConfig) {
    use tracing::Level;

    let log_level = logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(io::stderr);

    // A subscriber may already be installed when the CLI is embedded.
    let _ = match logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
