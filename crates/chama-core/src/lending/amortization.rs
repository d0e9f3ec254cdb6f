//! Fixed-payment loan amortisation.
//!
//! Monthly payment from the annuity formula
//! `P * r * (1 + r)^n / ((1 + r)^n - 1)` with `r = annual% / 100 / 12`,
//! falling back to `P / n` when the rate is zero. The schedule splits each
//! payment into interest on the running balance and principal.
//!
//! All arithmetic uses `rust_decimal::Decimal`. No `f64`.

use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ChamaError;
use crate::lending::policy::LendingPolicy;
use crate::types::*;
use crate::ChamaResult;

// ---------------------------------------------------------------------------
// Input / Output
// ---------------------------------------------------------------------------

/// A loan quote request as captured by the loan calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanQuoteRequest {
    pub principal: Money,
    pub term_months: u32,
    /// Annual interest rate as a percentage (15 = 15%).
    pub annual_interest_rate_pct: Rate,
}

/// One month of the repayment schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationLine {
    pub month: u32,
    pub payment: Money,
    pub principal_portion: Money,
    pub interest_portion: Money,
    /// Balance after this month's payment, never negative.
    pub remaining_balance: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationResult {
    pub monthly_payment: Money,
    pub total_payment: Money,
    pub total_interest: Money,
    pub schedule: Vec<AmortizationLine>,
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// Compute the fixed monthly payment and full repayment schedule.
pub fn compute_amortization(
    principal: Money,
    term_months: u32,
    annual_interest_rate_pct: Rate,
) -> ChamaResult<AmortizationResult> {
    validate_quote(principal, term_months, annual_interest_rate_pct)?;

    let monthly_rate = monthly_rate(annual_interest_rate_pct);
    let monthly_payment = level_payment(principal, term_months, monthly_rate)?;

    let mut schedule = Vec::with_capacity(term_months as usize);
    let mut balance = principal;

    for month in 1..=term_months {
        let interest_portion = balance * monthly_rate;
        let principal_portion = monthly_payment - interest_portion;
        // Absorbs rounding drift on the final period.
        balance = (balance - principal_portion).max(Decimal::ZERO);

        schedule.push(AmortizationLine {
            month,
            payment: monthly_payment,
            principal_portion,
            interest_portion,
            remaining_balance: balance,
        });
    }

    let total_payment = monthly_payment
        .checked_mul(Decimal::from(term_months))
        .ok_or_else(|| ChamaError::invalid("principal", "Total repayment exceeds decimal range"))?;
    let total_interest = total_payment - principal;

    tracing::debug!(
        principal = %principal,
        term_months,
        monthly_rate = %monthly_rate,
        monthly_payment = %monthly_payment,
        total_interest = %total_interest,
        "amortization computed"
    );

    Ok(AmortizationResult {
        monthly_payment,
        total_payment,
        total_interest,
        schedule,
    })
}

/// Quote a loan with the standard envelope, flagging non-standard terms
/// and rates above the policy's advisory ceiling.
pub fn quote_loan(
    request: &LoanQuoteRequest,
    policy: &LendingPolicy,
) -> ChamaResult<ComputationOutput<AmortizationResult>> {
    let start = Instant::now();
    policy.validate()?;
    let mut warnings: Vec<String> = Vec::new();

    let result = compute_amortization(
        request.principal,
        request.term_months,
        request.annual_interest_rate_pct,
    )?;

    let calculator = &policy.calculator;
    if !calculator.standard_terms.contains(&request.term_months) {
        let offered: Vec<String> = calculator
            .standard_terms
            .iter()
            .map(|t| t.to_string())
            .collect();
        warnings.push(format!(
            "Term of {} months is not a standard term (offered: {})",
            request.term_months,
            offered.join(", ")
        ));
    }
    if request.annual_interest_rate_pct > calculator.advisory_max_rate_pct {
        warnings.push(format!(
            "Annual rate of {}% exceeds the advisory ceiling of {}%",
            request.annual_interest_rate_pct, calculator.advisory_max_rate_pct
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Level-payment annuity amortisation (monthly compounding)",
        &serde_json::json!({
            "principal": request.principal.to_string(),
            "term_months": request.term_months,
            "annual_interest_rate_pct": request.annual_interest_rate_pct.to_string(),
            "monthly_rate": monthly_rate(request.annual_interest_rate_pct).to_string(),
        }),
        warnings,
        elapsed,
        result,
    ))
}

/// Monthly payment alone, without building a schedule.
pub fn monthly_payment(
    principal: Money,
    term_months: u32,
    annual_interest_rate_pct: Rate,
) -> ChamaResult<Money> {
    validate_quote(principal, term_months, annual_interest_rate_pct)?;
    level_payment(
        principal,
        term_months,
        monthly_rate(annual_interest_rate_pct),
    )
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn monthly_rate(annual_interest_rate_pct: Rate) -> Rate {
    annual_interest_rate_pct / dec!(100) / dec!(12)
}

fn level_payment(principal: Money, term_months: u32, monthly_rate: Rate) -> ChamaResult<Money> {
    let n = Decimal::from(term_months);
    if monthly_rate.is_zero() {
        return Ok(principal / n);
    }

    let growth = (Decimal::ONE + monthly_rate)
        .checked_powi(i64::from(term_months))
        .ok_or_else(|| {
            ChamaError::invalid(
                "term_months",
                "Growth factor (1 + r)^n exceeds decimal range for this rate and term",
            )
        })?;

    principal
        .checked_mul(monthly_rate)
        .and_then(|v| v.checked_mul(growth))
        .and_then(|v| v.checked_div(growth - Decimal::ONE))
        .ok_or_else(|| {
            ChamaError::invalid(
                "principal",
                "Monthly payment exceeds decimal range for this principal, rate and term",
            )
        })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_quote(principal: Money, term_months: u32, annual_interest_rate_pct: Rate) -> ChamaResult<()> {
    if principal <= Decimal::ZERO {
        return Err(ChamaError::invalid("principal", "Principal must be positive."));
    }
    if term_months == 0 {
        return Err(ChamaError::invalid(
            "term_months",
            "Term must be at least one month.",
        ));
    }
    if annual_interest_rate_pct < Decimal::ZERO {
        return Err(ChamaError::invalid(
            "annual_interest_rate_pct",
            "Interest rate must not be negative.",
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
