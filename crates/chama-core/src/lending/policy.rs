//! Lending policy: every constant the eligibility, application and
//! calculator rules depend on.
//!
//! Defaults reproduce the group's published rules. A policy document may
//! override any subset of fields; everything it omits keeps its default.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ChamaError;
use crate::lending::eligibility::PaymentHistory;
use crate::types::{Money, Rate};
use crate::ChamaResult;

/// Points available to each eligibility factor. Must sum to 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub contributions: Decimal,
    pub membership: Decimal,
    pub active_loans: Decimal,
    pub payment_history: Decimal,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            contributions: dec!(30),
            membership: dec!(25),
            active_loans: dec!(25),
            payment_history: dec!(20),
        }
    }
}

impl ScoringWeights {
    pub fn total(&self) -> Decimal {
        self.contributions + self.membership + self.active_loans + self.payment_history
    }
}

/// One value per payment-history tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryTable {
    pub excellent: Decimal,
    pub good: Decimal,
    pub fair: Decimal,
    pub poor: Decimal,
}

impl HistoryTable {
    pub fn get(&self, history: PaymentHistory) -> Decimal {
        match history {
            PaymentHistory::Excellent => self.excellent,
            PaymentHistory::Good => self.good,
            PaymentHistory::Fair => self.fair,
            PaymentHistory::Poor => self.poor,
        }
    }

    fn values(&self) -> [(&'static str, Decimal); 4] {
        [
            ("excellent", self.excellent),
            ("good", self.good),
            ("fair", self.fair),
            ("poor", self.poor),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EligibilityPolicy {
    pub weights: ScoringWeights,
    /// Contributions at which the contributions factor is fully earned.
    pub contribution_target: Money,
    /// Membership tenure at which the membership factor is fully earned.
    pub membership_target_months: u32,
    /// Active-loans factor score for a member with some loans but fewer
    /// than `max_active_loans`.
    pub single_active_loan_score: Decimal,
    pub history_scores: HistoryTable,
    pub loan_multipliers: HistoryTable,
    pub max_loan_cap: Money,
    pub min_score: u32,
    pub min_membership_months: u32,
    /// Members are eligible only with strictly fewer active loans than this.
    /// At or above it the active-loans factor scores zero.
    pub max_active_loans: u32,
    pub low_contribution_threshold: Money,
    pub strong_profile_score: u32,
}

impl Default for EligibilityPolicy {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            contribution_target: dec!(50000),
            membership_target_months: 12,
            single_active_loan_score: dec!(15),
            history_scores: HistoryTable {
                excellent: dec!(20),
                good: dec!(15),
                fair: dec!(10),
                poor: dec!(5),
            },
            loan_multipliers: HistoryTable {
                excellent: dec!(3),
                good: dec!(2.5),
                fair: dec!(2),
                poor: dec!(1.5),
            },
            max_loan_cap: dec!(500000),
            min_score: 60,
            min_membership_months: 6,
            max_active_loans: 2,
            low_contribution_threshold: dec!(20000),
            strong_profile_score: 80,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationPolicy {
    pub min_loan_amount: Money,
    /// Annual rate (percent) used for the repayment preview.
    pub standard_rate_pct: Rate,
    /// Repayment terms (months) offered on the application form.
    pub terms: Vec<u32>,
    /// Share of the eligible maximum up to which approval is likely.
    pub high_likelihood_ratio: Rate,
}

impl Default for ApplicationPolicy {
    fn default() -> Self {
        Self {
            min_loan_amount: dec!(1000),
            standard_rate_pct: dec!(15),
            terms: vec![3, 6, 12, 18, 24],
            high_likelihood_ratio: dec!(0.7),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculatorPolicy {
    /// Terms (months) offered by the loan calculator.
    pub standard_terms: Vec<u32>,
    /// Annual rate (percent) above which a quote carries a warning.
    pub advisory_max_rate_pct: Rate,
}

impl Default for CalculatorPolicy {
    fn default() -> Self {
        Self {
            standard_terms: vec![3, 6, 12, 18, 24, 36],
            advisory_max_rate_pct: dec!(50),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LendingPolicy {
    pub eligibility: EligibilityPolicy,
    pub application: ApplicationPolicy,
    pub calculator: CalculatorPolicy,
}

impl LendingPolicy {
    /// Reject policies under which the scoring invariants cannot hold.
    pub fn validate(&self) -> ChamaResult<()> {
        let e = &self.eligibility;

        if e.weights.total() != dec!(100) {
            return Err(ChamaError::invalid(
                "eligibility.weights",
                format!("Factor weights must sum to 100, got {}", e.weights.total()),
            ));
        }
        for (name, weight) in [
            ("contributions", e.weights.contributions),
            ("membership", e.weights.membership),
            ("active_loans", e.weights.active_loans),
            ("payment_history", e.weights.payment_history),
        ] {
            if weight < Decimal::ZERO {
                return Err(ChamaError::invalid(
                    format!("eligibility.weights.{name}"),
                    "Weight must not be negative",
                ));
            }
        }
        if e.single_active_loan_score < Decimal::ZERO
            || e.single_active_loan_score > e.weights.active_loans
        {
            return Err(ChamaError::invalid(
                "eligibility.single_active_loan_score",
                "Score must lie between 0 and the active-loans weight",
            ));
        }
        for (tier, score) in e.history_scores.values() {
            if score < Decimal::ZERO || score > e.weights.payment_history {
                return Err(ChamaError::invalid(
                    format!("eligibility.history_scores.{tier}"),
                    "Score must lie between 0 and the payment-history weight",
                ));
            }
        }
        for (tier, multiplier) in e.loan_multipliers.values() {
            if multiplier <= Decimal::ZERO {
                return Err(ChamaError::invalid(
                    format!("eligibility.loan_multipliers.{tier}"),
                    "Multiplier must be positive",
                ));
            }
        }
        if e.contribution_target <= Decimal::ZERO {
            return Err(ChamaError::invalid(
                "eligibility.contribution_target",
                "Contribution target must be positive",
            ));
        }
        if e.membership_target_months == 0 {
            return Err(ChamaError::invalid(
                "eligibility.membership_target_months",
                "Membership target must be at least one month",
            ));
        }
        if e.max_loan_cap <= Decimal::ZERO {
            return Err(ChamaError::invalid(
                "eligibility.max_loan_cap",
                "Loan cap must be positive",
            ));
        }
        if e.min_score > 100 || e.strong_profile_score > 100 {
            return Err(ChamaError::invalid(
                "eligibility.min_score",
                "Score thresholds must not exceed 100",
            ));
        }

        let a = &self.application;
        if a.min_loan_amount <= Decimal::ZERO {
            return Err(ChamaError::invalid(
                "application.min_loan_amount",
                "Minimum loan amount must be positive",
            ));
        }
        if a.standard_rate_pct < Decimal::ZERO {
            return Err(ChamaError::invalid(
                "application.standard_rate_pct",
                "Standard rate must not be negative",
            ));
        }
        if a.high_likelihood_ratio <= Decimal::ZERO || a.high_likelihood_ratio > Decimal::ONE {
            return Err(ChamaError::invalid(
                "application.high_likelihood_ratio",
                "Ratio must be in (0, 1]",
            ));
        }
        validate_terms("application.terms", &a.terms)?;
        validate_terms("calculator.standard_terms", &self.calculator.standard_terms)?;

        Ok(())
    }
}

fn validate_terms(field: &str, terms: &[u32]) -> ChamaResult<()> {
    if terms.is_empty() {
        return Err(ChamaError::invalid(field, "At least one term is required"));
    }
    if terms.contains(&0) {
        return Err(ChamaError::invalid(field, "Terms must be at least one month"));
    }
    Ok(())
}
