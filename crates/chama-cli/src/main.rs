mod commands;
mod config;
mod input;
mod output;
mod telemetry;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde_json::Value;
use std::path::PathBuf;
use std::process;

use chama_core::LendingPolicy;
use commands::loans::{AmortizeArgs, EligibilityArgs, ReviewApplicationArgs};
use commands::savings::{ContributionsArgs, SavingsProgressArgs};
use config::CliConfig;

/// Loan quotes, eligibility scoring and savings reports for chama members
#[derive(Parser)]
#[command(
    name = "chama",
    version,
    about = "Loan quotes, eligibility scoring and savings reports for chama members",
    long_about = "A CLI for chama (savings group) lending calculations with decimal \
                  precision. Quotes amortised loans, scores member eligibility, reviews \
                  loan applications and summarises contribution history."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (defaults to CHAMA_OUTPUT, then json)
    #[arg(long, global = true)]
    output: Option<OutputFormat>,

    /// Lending policy file, YAML or JSON (defaults to CHAMA_POLICY)
    #[arg(long, global = true)]
    policy: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `chama_core=trace` (overrides RUST_LOG and CHAMA_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Quote a fixed-rate loan with its month-by-month schedule
    Amortize(AmortizeArgs),
    /// Score a member's loan eligibility and maximum loan
    Eligibility(EligibilityArgs),
    /// Validate a loan application and estimate approval likelihood
    ReviewApplication(ReviewApplicationArgs),
    /// Summarise and filter a member's contribution history
    Contributions(ContributionsArgs),
    /// Progress towards a savings target
    SavingsProgress(SavingsProgressArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    match run(cli) {
        Ok(Some((format, value))) => {
            output::format_output(&format, &value);
            process::exit(0);
        }
        Ok(None) => {}
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<Option<(OutputFormat, Value)>, Box<dyn std::error::Error>> {
    if let Commands::Version = cli.command {
        println!("chama {}", env!("CARGO_PKG_VERSION"));
        return Ok(None);
    }

    let config = CliConfig::load()?;
    telemetry::init(cli.log_level.as_deref(), &config.log_filter)?;

    let format = cli.output.unwrap_or(config.output);
    let policy = match cli.policy.or(config.policy_path) {
        Some(path) => input::file::read_policy(&path)?,
        None => LendingPolicy::default(),
    };

    let value = match cli.command {
        Commands::Amortize(args) => commands::loans::run_amortize(args, &policy)?,
        Commands::Eligibility(args) => commands::loans::run_eligibility(args, &policy)?,
        Commands::ReviewApplication(args) => {
            commands::loans::run_review_application(args, &policy)?
        }
        Commands::Contributions(args) => commands::savings::run_contributions(args)?,
        Commands::SavingsProgress(args) => commands::savings::run_savings_progress(args)?,
        Commands::Version => return Ok(None),
    };

    Ok(Some((format, value)))
}
