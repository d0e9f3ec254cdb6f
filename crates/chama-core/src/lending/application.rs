//! Loan application review.
//!
//! Validates the three application steps (amount, details, guarantors),
//! grades approval likelihood against the member's eligible maximum and
//! previews repayment at the standard rate.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

use crate::error::ChamaError;
use crate::lending::amortization::monthly_payment;
use crate::lending::policy::LendingPolicy;
use crate::types::*;
use crate::ChamaResult;

// ---------------------------------------------------------------------------
// Input / Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanPurpose {
    Business,
    Education,
    Medical,
    Agriculture,
    Home,
    Other,
}

impl fmt::Display for LoanPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoanPurpose::Business => write!(f, "Business Expansion"),
            LoanPurpose::Education => write!(f, "Education Fees"),
            LoanPurpose::Medical => write!(f, "Medical Emergency"),
            LoanPurpose::Agriculture => write!(f, "Agricultural Investment"),
            LoanPurpose::Home => write!(f, "Home Improvement"),
            LoanPurpose::Other => write!(f, "Other"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStep {
    Amount,
    Details,
    Guarantors,
}

impl ApplicationStep {
    pub const ALL: [ApplicationStep; 3] = [
        ApplicationStep::Amount,
        ApplicationStep::Details,
        ApplicationStep::Guarantors,
    ];
}

/// An application as filled in so far. `None` / empty means not yet entered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoanApplication {
    pub amount: Option<Money>,
    pub purpose: Option<LoanPurpose>,
    pub term_months: Option<u32>,
    #[serde(default)]
    pub guarantors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub step: ApplicationStep,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalLikelihood {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationReviewInput {
    pub application: LoanApplication,
    /// The member's eligible ceiling, normally `EligibilityResult::max_loan_amount`.
    pub max_eligible_amount: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationReview {
    /// True when every step validates.
    pub is_complete: bool,
    pub field_errors: Vec<FieldError>,
    pub approval_likelihood: Option<ApprovalLikelihood>,
    pub estimated_monthly_payment: Option<Money>,
    pub estimated_total_interest: Option<Money>,
}

// ---------------------------------------------------------------------------
// Core functions
// ---------------------------------------------------------------------------

/// Validate one step of the application form.
pub fn validate_step(
    application: &LoanApplication,
    step: ApplicationStep,
    max_eligible_amount: Money,
    policy: &LendingPolicy,
) -> Vec<FieldError> {
    let rules = &policy.application;
    let mut errors = Vec::new();
    let mut fail = |field: &str, message: String| {
        errors.push(FieldError {
            field: field.to_string(),
            step,
            message,
        })
    };

    match step {
        ApplicationStep::Amount => match application.amount {
            None => fail("amount", "Loan amount is required".into()),
            Some(amount) if amount < rules.min_loan_amount => fail(
                "amount",
                format!("Minimum loan amount is {}", format_kes(rules.min_loan_amount)),
            ),
            Some(amount) if amount > max_eligible_amount => fail(
                "amount",
                format!("Maximum eligible amount is {}", format_kes(max_eligible_amount)),
            ),
            Some(_) => {}
        },
        ApplicationStep::Details => {
            if application.purpose.is_none() {
                fail("purpose", "Loan purpose is required".into());
            }
            match application.term_months {
                None => fail("term_months", "Repayment term is required".into()),
                Some(term) if !rules.terms.contains(&term) => {
                    let offered: Vec<String> = rules.terms.iter().map(|t| t.to_string()).collect();
                    fail(
                        "term_months",
                        format!("Repayment term must be one of {} months", offered.join(", ")),
                    )
                }
                Some(_) => {}
            }
        }
        ApplicationStep::Guarantors => {
            let first = guarantor(application, 0);
            let second = guarantor(application, 1);
            if first.is_none() {
                fail("guarantor1", "First guarantor is required".into());
            }
            if second.is_none() {
                fail("guarantor2", "Second guarantor is required".into());
            }
            if let (Some(a), Some(b)) = (first, second) {
                if a.eq_ignore_ascii_case(b) {
                    fail(
                        "guarantor2",
                        "Guarantors must be two different members".into(),
                    );
                }
            }
        }
    }

    errors
}

/// Grade how likely the requested amount is to be approved.
pub fn approval_likelihood(
    amount: Money,
    max_eligible_amount: Money,
    policy: &LendingPolicy,
) -> ApprovalLikelihood {
    if amount <= max_eligible_amount * policy.application.high_likelihood_ratio {
        ApprovalLikelihood::High
    } else if amount <= max_eligible_amount {
        ApprovalLikelihood::Medium
    } else {
        ApprovalLikelihood::Low
    }
}

/// Validate every step and preview the repayment.
pub fn review_application(
    input: &ApplicationReviewInput,
    policy: &LendingPolicy,
) -> ChamaResult<ComputationOutput<ApplicationReview>> {
    let start = Instant::now();
    policy.validate()?;
    if input.max_eligible_amount < Decimal::ZERO {
        return Err(ChamaError::invalid(
            "max_eligible_amount",
            "Eligible amount must not be negative.",
        ));
    }

    let application = &input.application;
    let mut warnings: Vec<String> = Vec::new();

    let field_errors: Vec<FieldError> = ApplicationStep::ALL
        .iter()
        .flat_map(|step| validate_step(application, *step, input.max_eligible_amount, policy))
        .collect();

    let approval_likelihood = application
        .amount
        .map(|amount| approval_likelihood(amount, input.max_eligible_amount, policy));

    let (estimated_monthly_payment, estimated_total_interest) =
        match (application.amount, application.term_months) {
            (Some(amount), Some(term)) if amount > Decimal::ZERO && term > 0 => {
                let payment = monthly_payment(amount, term, policy.application.standard_rate_pct)?;
                let total = payment.checked_mul(Decimal::from(term)).ok_or_else(|| {
                    ChamaError::invalid("amount", "Total repayment exceeds decimal range")
                })?;
                (Some(payment), Some(total - amount))
            }
            _ => (None, None),
        };

    if input.max_eligible_amount.is_zero() {
        warnings.push("Member currently has no eligible loan amount".into());
    }

    let review = ApplicationReview {
        is_complete: field_errors.is_empty(),
        field_errors,
        approval_likelihood,
        estimated_monthly_payment,
        estimated_total_interest,
    };

    tracing::debug!(
        is_complete = review.is_complete,
        errors = review.field_errors.len(),
        likelihood = ?review.approval_likelihood,
        "loan application reviewed"
    );

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Three-step loan application review",
        &serde_json::json!({
            "max_eligible_amount": input.max_eligible_amount.to_string(),
            "purpose": application.purpose.map(|p| p.to_string()),
            "min_loan_amount": policy.application.min_loan_amount.to_string(),
            "standard_rate_pct": policy.application.standard_rate_pct.to_string(),
            "high_likelihood_ratio": policy.application.high_likelihood_ratio.to_string(),
        }),
        warnings,
        elapsed,
        review,
    ))
}

fn guarantor(application: &LoanApplication, index: usize) -> Option<&str> {
    application
        .guarantors
        .get(index)
        .map(|g| g.trim())
        .filter(|g| !g.is_empty())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn complete_application() -> LoanApplication {
        LoanApplication {
            amount: Some(dec!(50000)),
            purpose: Some(LoanPurpose::Business),
            term_months: Some(12),
            guarantors: vec!["Wanjiku Kamau".into(), "Otieno Ochieng".into()],
        }
    }

    fn fields(errors: &[FieldError]) -> Vec<&str> {
        errors.iter().map(|e| e.field.as_str()).collect()
    }

    #[test]
    fn test_complete_application_passes() {
        let input = ApplicationReviewInput {
            application: complete_application(),
            max_eligible_amount: dec!(112500),
        };
        let out = review_application(&input, &LendingPolicy::default()).unwrap();
        assert!(out.result.is_complete);
        assert_eq!(out.result.approval_likelihood, Some(ApprovalLikelihood::High));
        let payment = out.result.estimated_monthly_payment.unwrap();
        assert!((payment - dec!(4512.92)).abs() < dec!(0.01));
        let interest = out.result.estimated_total_interest.unwrap();
        assert!((interest - dec!(4154.99)).abs() < dec!(0.01));
        assert_eq!(out.assumptions["purpose"], "Business Expansion");
    }

    #[test]
    fn test_empty_application_reports_every_field() {
        let input = ApplicationReviewInput {
            application: LoanApplication::default(),
            max_eligible_amount: dec!(112500),
        };
        let out = review_application(&input, &LendingPolicy::default()).unwrap();
        assert!(!out.result.is_complete);
        assert_eq!(
            fields(&out.result.field_errors),
            vec!["amount", "purpose", "term_months", "guarantor1", "guarantor2"]
        );
        assert_eq!(out.result.approval_likelihood, None);
        assert_eq!(out.result.estimated_monthly_payment, None);
    }

    #[test]
    fn test_amount_bounds() {
        let policy = LendingPolicy::default();
        let mut app = complete_application();

        app.amount = Some(dec!(999));
        let errors = validate_step(&app, ApplicationStep::Amount, dec!(112500), &policy);
        assert_eq!(errors[0].message, "Minimum loan amount is KES 1,000");

        app.amount = Some(dec!(120000));
        let errors = validate_step(&app, ApplicationStep::Amount, dec!(112500), &policy);
        assert_eq!(errors[0].message, "Maximum eligible amount is KES 112,500");

        app.amount = Some(dec!(112500));
        assert!(validate_step(&app, ApplicationStep::Amount, dec!(112500), &policy).is_empty());
    }

    #[test]
    fn test_unoffered_term_rejected() {
        let mut app = complete_application();
        app.term_months = Some(36);
        let errors = validate_step(&app, ApplicationStep::Details, dec!(112500), &LendingPolicy::default());
        assert_eq!(fields(&errors), vec!["term_months"]);
        assert_eq!(errors[0].step, ApplicationStep::Details);
    }

    #[test]
    fn test_blank_and_duplicate_guarantors() {
        let policy = LendingPolicy::default();
        let mut app = complete_application();

        app.guarantors = vec!["  ".into(), "Otieno Ochieng".into()];
        let errors = validate_step(&app, ApplicationStep::Guarantors, dec!(112500), &policy);
        assert_eq!(fields(&errors), vec!["guarantor1"]);

        app.guarantors = vec!["Otieno Ochieng".into(), "otieno ochieng".into()];
        let errors = validate_step(&app, ApplicationStep::Guarantors, dec!(112500), &policy);
        assert_eq!(fields(&errors), vec!["guarantor2"]);
    }

    #[test]
    fn test_likelihood_bands() {
        let policy = LendingPolicy::default();
        let max = dec!(100000);
        assert_eq!(approval_likelihood(dec!(70000), max, &policy), ApprovalLikelihood::High);
        assert_eq!(approval_likelihood(dec!(70001), max, &policy), ApprovalLikelihood::Medium);
        assert_eq!(approval_likelihood(dec!(100000), max, &policy), ApprovalLikelihood::Medium);
        assert_eq!(approval_likelihood(dec!(100001), max, &policy), ApprovalLikelihood::Low);
    }

    #[test]
    fn test_negative_ceiling_rejected() {
        let input = ApplicationReviewInput {
            application: complete_application(),
            max_eligible_amount: dec!(-1),
        };
        assert!(review_application(&input, &LendingPolicy::default()).is_err());
    }

    #[test]
    fn test_zero_ceiling_warns() {
        let input = ApplicationReviewInput {
            application: complete_application(),
            max_eligible_amount: Decimal::ZERO,
        };
        let out = review_application(&input, &LendingPolicy::default()).unwrap();
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.result.approval_likelihood, Some(ApprovalLikelihood::Low));
    }
}
