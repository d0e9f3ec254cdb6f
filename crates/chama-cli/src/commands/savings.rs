use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use chama_core::savings::contributions::{self, ContributionReportInput};
use chama_core::savings::progress;

use crate::input;

#[derive(Args)]
pub struct ContributionsArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct SavingsProgressArgs {
    /// Amount saved so far in KES
    #[arg(long)]
    pub current: Decimal,

    /// Savings target in KES
    #[arg(long)]
    pub target: Decimal,
}

pub fn run_contributions(args: ContributionsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let input_data: ContributionReportInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err("--input <file.json> or stdin required".into());
    };
    let result = contributions::contribution_report(&input_data)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_savings_progress(args: SavingsProgressArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let result = progress::savings_progress(args.current, args.target)?;
    Ok(serde_json::to_value(result)?)
}
