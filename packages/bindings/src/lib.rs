use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use chama_core::LendingPolicy;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Lending
// ---------------------------------------------------------------------------

#[napi]
pub fn compute_amortization(input_json: String) -> NapiResult<String> {
    let input: chama_core::lending::amortization::LoanQuoteRequest =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = chama_core::lending::amortization::quote_loan(&input, &LendingPolicy::default())
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn compute_eligibility(input_json: String) -> NapiResult<String> {
    let input: chama_core::lending::eligibility::EligibilityInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        chama_core::lending::eligibility::assess_eligibility(&input, &LendingPolicy::default())
            .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn review_loan_application(input_json: String) -> NapiResult<String> {
    let input: chama_core::lending::application::ApplicationReviewInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        chama_core::lending::application::review_application(&input, &LendingPolicy::default())
            .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Savings
// ---------------------------------------------------------------------------

#[napi]
pub fn contribution_report(input_json: String) -> NapiResult<String> {
    let input: chama_core::savings::contributions::ContributionReportInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = chama_core::savings::contributions::contribution_report(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct SavingsProgressInput {
    current_amount: Decimal,
    target_amount: Decimal,
}

#[napi]
pub fn savings_progress(input_json: String) -> NapiResult<String> {
    let input: SavingsProgressInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        chama_core::savings::progress::savings_progress(input.current_amount, input.target_amount)
            .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
