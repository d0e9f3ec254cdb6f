use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use chama_core::lending::amortization::{self, LoanQuoteRequest};
use chama_core::lending::application::{self, ApplicationReviewInput};
use chama_core::lending::eligibility::{self, EligibilityInput, PaymentHistory};
use chama_core::LendingPolicy;

use crate::input;

#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct AmortizeArgs {
    /// Loan principal in KES
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Repayment term in months
    #[arg(long)]
    pub term_months: Option<u32>,

    /// Annual interest rate in percent (defaults to the policy's standard rate)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct EligibilityArgs {
    /// Total completed contributions in KES
    #[arg(long)]
    pub total_contributions: Option<Decimal>,

    /// Months of group membership
    #[arg(long)]
    pub membership_months: Option<u32>,

    /// Loans currently outstanding
    #[arg(long, default_value = "0")]
    pub active_loans: u32,

    /// excellent, good, fair or poor
    #[arg(long, default_value = "good")]
    pub payment_history: PaymentHistory,

    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Args)]
pub struct ReviewApplicationArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_amortize(
    args: AmortizeArgs,
    policy: &LendingPolicy,
) -> Result<Value, Box<dyn std::error::Error>> {
    let request: LoanQuoteRequest = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if args.principal.is_some() || args.term_months.is_some() {
        LoanQuoteRequest {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            term_months: args
                .term_months
                .ok_or("--term-months is required (or provide --input)")?,
            annual_interest_rate_pct: args
                .rate
                .unwrap_or(policy.application.standard_rate_pct),
        }
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err("--principal and --term-months, --input <file.json> or stdin required".into());
    };

    let result = amortization::quote_loan(&request, policy)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_eligibility(
    args: EligibilityArgs,
    policy: &LendingPolicy,
) -> Result<Value, Box<dyn std::error::Error>> {
    let input_data: EligibilityInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if args.total_contributions.is_some() || args.membership_months.is_some() {
        EligibilityInput {
            total_contributions: args
                .total_contributions
                .ok_or("--total-contributions is required (or provide --input)")?,
            membership_months: args
                .membership_months
                .ok_or("--membership-months is required (or provide --input)")?,
            active_loans: args.active_loans,
            payment_history: args.payment_history,
        }
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err(
            "--total-contributions and --membership-months, --input <file.json> or stdin required"
                .into(),
        );
    };

    let result = eligibility::assess_eligibility(&input_data, policy)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_review_application(
    args: ReviewApplicationArgs,
    policy: &LendingPolicy,
) -> Result<Value, Box<dyn std::error::Error>> {
    let input_data: ApplicationReviewInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err("--input <file.json> or stdin required".into());
    };
    let result = application::review_application(&input_data, policy)?;
    Ok(serde_json::to_value(result)?)
}
