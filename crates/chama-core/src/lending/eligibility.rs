//! Member loan eligibility scoring.
//!
//! Four weighted factors (contributions, membership tenure, active loans,
//! payment history) sum to a 0-100 score. Eligibility requires the
//! minimum score, the minimum tenure and fewer than the maximum number of
//! active loans; the loan ceiling is a history-dependent multiple of
//! contributions, capped by policy.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use crate::error::ChamaError;
use crate::lending::policy::LendingPolicy;
use crate::types::*;
use crate::ChamaResult;

// ---------------------------------------------------------------------------
// Input / Output
// ---------------------------------------------------------------------------

/// Repayment track record tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentHistory {
    Excellent,
    /// Members without a recorded history are treated as `Good`.
    #[default]
    Good,
    Fair,
    Poor,
}

impl fmt::Display for PaymentHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentHistory::Excellent => write!(f, "excellent"),
            PaymentHistory::Good => write!(f, "good"),
            PaymentHistory::Fair => write!(f, "fair"),
            PaymentHistory::Poor => write!(f, "poor"),
        }
    }
}

impl FromStr for PaymentHistory {
    type Err = ChamaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "excellent" => Ok(PaymentHistory::Excellent),
            "good" => Ok(PaymentHistory::Good),
            "fair" => Ok(PaymentHistory::Fair),
            "poor" => Ok(PaymentHistory::Poor),
            other => Err(ChamaError::invalid(
                "payment_history",
                format!("Unknown payment history '{other}' (expected excellent, good, fair or poor)"),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityInput {
    pub total_contributions: Money,
    pub membership_months: u32,
    pub active_loans: u32,
    #[serde(default)]
    pub payment_history: PaymentHistory,
}

/// A factor's earned points and the most it could earn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorScore {
    pub score: Decimal,
    pub weight: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityFactors {
    pub contributions: FactorScore,
    pub membership: FactorScore,
    pub active_loans: FactorScore,
    pub payment_history: FactorScore,
}

impl EligibilityFactors {
    /// Unrounded sum of the four factor scores.
    pub fn total(&self) -> Decimal {
        self.contributions.score
            + self.membership.score
            + self.active_loans.score
            + self.payment_history.score
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationKind {
    Improvement,
    Info,
    Warning,
    Success,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub title: String,
    pub description: String,
}

/// Qualitative label for a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl ScoreBand {
    pub fn from_score(score: u32) -> Self {
        if score >= 80 {
            ScoreBand::Excellent
        } else if score >= 60 {
            ScoreBand::Good
        } else if score >= 40 {
            ScoreBand::Fair
        } else {
            ScoreBand::Poor
        }
    }
}

impl fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreBand::Excellent => write!(f, "Excellent"),
            ScoreBand::Good => write!(f, "Good"),
            ScoreBand::Fair => write!(f, "Fair"),
            ScoreBand::Poor => write!(f, "Poor"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityResult {
    pub is_eligible: bool,
    pub max_loan_amount: Money,
    /// Rounded sum of the factor scores, 0-100.
    pub score: u32,
    pub score_band: ScoreBand,
    pub meets_minimum_score: bool,
    pub factors: EligibilityFactors,
    pub recommendations: Vec<Recommendation>,
}

// ---------------------------------------------------------------------------
// Core functions
// ---------------------------------------------------------------------------

/// Score a member under the default lending policy.
pub fn compute_eligibility(
    total_contributions: Money,
    membership_months: u32,
    active_loans: u32,
    payment_history: PaymentHistory,
) -> ChamaResult<EligibilityResult> {
    let input = EligibilityInput {
        total_contributions,
        membership_months,
        active_loans,
        payment_history,
    };
    score_eligibility(&input, &LendingPolicy::default())
}

/// Score a member under the given policy.
pub fn score_eligibility(
    input: &EligibilityInput,
    policy: &LendingPolicy,
) -> ChamaResult<EligibilityResult> {
    policy.validate()?;
    validate_eligibility_input(input)?;

    let rules = &policy.eligibility;
    let factors = score_factors(input, policy);
    let score = factors
        .total()
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .unwrap_or(0);

    let max_loan_amount = match uncapped_ceiling(input, policy) {
        Some(ceiling) => ceiling.min(rules.max_loan_cap),
        None => rules.max_loan_cap,
    };

    let meets_minimum_score = score >= rules.min_score;
    let is_eligible = meets_minimum_score
        && input.membership_months >= rules.min_membership_months
        && input.active_loans < rules.max_active_loans;

    let recommendations = recommendations(input, score, policy);

    tracing::debug!(
        score,
        is_eligible,
        max_loan_amount = %max_loan_amount,
        recommendations = recommendations.len(),
        "eligibility scored"
    );

    Ok(EligibilityResult {
        is_eligible,
        max_loan_amount,
        score,
        score_band: ScoreBand::from_score(score),
        meets_minimum_score,
        factors,
        recommendations,
    })
}

/// Envelope form: unmet requirements and a capped ceiling are reported as
/// warnings.
pub fn assess_eligibility(
    input: &EligibilityInput,
    policy: &LendingPolicy,
) -> ChamaResult<ComputationOutput<EligibilityResult>> {
    let start = Instant::now();
    let result = score_eligibility(input, policy)?;

    let rules = &policy.eligibility;
    let mut warnings: Vec<String> = Vec::new();
    if !result.meets_minimum_score {
        warnings.push(format!(
            "Score {} is below the minimum of {}",
            result.score, rules.min_score
        ));
    }
    if input.membership_months < rules.min_membership_months {
        warnings.push(format!(
            "Membership of {} months is below the minimum of {} months",
            input.membership_months, rules.min_membership_months
        ));
    }
    if input.active_loans >= rules.max_active_loans {
        warnings.push(format!(
            "{} active loans; members must have fewer than {}",
            input.active_loans, rules.max_active_loans
        ));
    }
    let capped = uncapped_ceiling(input, policy).map_or(true, |c| c > rules.max_loan_cap);
    if capped {
        warnings.push(format!(
            "Loan ceiling capped at the policy limit of {}",
            format_kes(rules.max_loan_cap)
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Weighted four-factor eligibility score",
        &serde_json::json!({
            "total_contributions": input.total_contributions.to_string(),
            "membership_months": input.membership_months,
            "active_loans": input.active_loans,
            "payment_history": input.payment_history.to_string(),
            "weights": rules.weights,
            "min_score": rules.min_score,
            "max_loan_cap": rules.max_loan_cap.to_string(),
        }),
        warnings,
        elapsed,
        result,
    ))
}

// ---------------------------------------------------------------------------
// Factors
// ---------------------------------------------------------------------------

fn score_factors(input: &EligibilityInput, policy: &LendingPolicy) -> EligibilityFactors {
    let rules = &policy.eligibility;
    let weights = &rules.weights;

    // Overflow only happens far beyond the target, where the factor is full.
    let contributions = input
        .total_contributions
        .checked_div(rules.contribution_target)
        .and_then(|ratio| ratio.checked_mul(weights.contributions))
        .map_or(weights.contributions, |score| score.min(weights.contributions));

    let membership = (Decimal::from(input.membership_months)
        / Decimal::from(rules.membership_target_months)
        * weights.membership)
        .min(weights.membership);

    let active_loans = match input.active_loans {
        0 => weights.active_loans,
        n if n < rules.max_active_loans => rules.single_active_loan_score,
        _ => Decimal::ZERO,
    };

    let payment_history = rules.history_scores.get(input.payment_history);

    EligibilityFactors {
        contributions: FactorScore {
            score: contributions,
            weight: weights.contributions,
        },
        membership: FactorScore {
            score: membership,
            weight: weights.membership,
        },
        active_loans: FactorScore {
            score: active_loans,
            weight: weights.active_loans,
        },
        payment_history: FactorScore {
            score: payment_history,
            weight: weights.payment_history,
        },
    }
}

/// Contributions times the history multiplier, or None past decimal range.
fn uncapped_ceiling(input: &EligibilityInput, policy: &LendingPolicy) -> Option<Money> {
    let multiplier = policy.eligibility.loan_multipliers.get(input.payment_history);
    input.total_contributions.checked_mul(multiplier)
}

// ---------------------------------------------------------------------------
// Recommendations
// ---------------------------------------------------------------------------

fn recommendations(input: &EligibilityInput, score: u32, policy: &LendingPolicy) -> Vec<Recommendation> {
    let rules = &policy.eligibility;
    let mut out = Vec::new();

    if input.total_contributions < rules.low_contribution_threshold {
        out.push(Recommendation {
            kind: RecommendationKind::Improvement,
            title: "Increase Your Contributions".into(),
            description: format!(
                "Make regular contributions to improve your loan eligibility. \
                 Target at least {} in total contributions.",
                format_kes(rules.low_contribution_threshold)
            ),
        });
    }
    if input.membership_months < rules.membership_target_months {
        out.push(Recommendation {
            kind: RecommendationKind::Info,
            title: "Build Your Membership History".into(),
            description: format!(
                "You've been a member for {} months. Longer membership improves your eligibility.",
                input.membership_months
            ),
        });
    }
    if input.active_loans >= rules.max_active_loans {
        out.push(Recommendation {
            kind: RecommendationKind::Warning,
            title: "Reduce Active Loans".into(),
            description: "Consider paying off existing loans before applying for new ones \
                          to improve your eligibility."
                .into(),
        });
    }
    if !matches!(
        input.payment_history,
        PaymentHistory::Excellent | PaymentHistory::Good
    ) {
        out.push(Recommendation {
            kind: RecommendationKind::Improvement,
            title: "Improve Payment History".into(),
            description: "Make timely payments on existing loans and contributions \
                          to build a better credit profile."
                .into(),
        });
    }
    if score >= rules.strong_profile_score {
        out.push(Recommendation {
            kind: RecommendationKind::Success,
            title: "Excellent Profile".into(),
            description: "You have an excellent loan profile. You qualify for our best rates and terms."
                .into(),
        });
    }

    out
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_eligibility_input(input: &EligibilityInput) -> ChamaResult<()> {
    if input.total_contributions < Decimal::ZERO {
        return Err(ChamaError::invalid(
            "total_contributions",
            "Total contributions must not be negative.",
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn member(contributions: Decimal, months: u32, loans: u32, history: PaymentHistory) -> EligibilityInput {
        EligibilityInput {
            total_contributions: contributions,
            membership_months: months,
            active_loans: loans,
            payment_history: history,
        }
    }

    #[test]
    fn test_reference_member() {
        let r = compute_eligibility(dec!(45000), 18, 1, PaymentHistory::Good).unwrap();
        assert_eq!(r.factors.contributions.score, dec!(27));
        assert_eq!(r.factors.membership.score, dec!(25));
        assert_eq!(r.factors.active_loans.score, dec!(15));
        assert_eq!(r.factors.payment_history.score, dec!(15));
        assert_eq!(r.score, 82);
        assert!(r.is_eligible);
        assert_eq!(r.max_loan_amount, dec!(112500));
        assert_eq!(r.score_band, ScoreBand::Excellent);
    }

    #[test]
    fn test_two_active_loans_blocks_eligibility() {
        let r = compute_eligibility(dec!(60000), 36, 2, PaymentHistory::Excellent).unwrap();
        assert_eq!(r.factors.active_loans.score, Decimal::ZERO);
        // 30 + 25 + 0 + 20
        assert_eq!(r.score, 75);
        assert!(r.meets_minimum_score);
        assert!(!r.is_eligible);
    }

    #[test]
    fn test_short_membership_blocks_eligibility() {
        let r = compute_eligibility(dec!(50000), 5, 0, PaymentHistory::Excellent).unwrap();
        // 30 + 10.4166.. + 25 + 20 = 85.41 -> 85
        assert_eq!(r.score, 85);
        assert!(!r.is_eligible);
    }

    #[test]
    fn test_low_score_blocks_eligibility() {
        let r = compute_eligibility(dec!(5000), 6, 1, PaymentHistory::Poor).unwrap();
        // 3 + 12.5 + 15 + 5 = 35.5 -> 36
        assert_eq!(r.score, 36);
        assert_eq!(r.score_band, ScoreBand::Poor);
        assert!(!r.is_eligible);
    }

    #[test]
    fn test_score_rounds_half_up() {
        // 0 + 12.5 + 25 + 15 = 52.5
        let r = compute_eligibility(Decimal::ZERO, 6, 0, PaymentHistory::Good).unwrap();
        assert_eq!(r.score, 53);
    }

    #[test]
    fn test_factors_capped_at_weight() {
        let r = compute_eligibility(dec!(10_000_000), 600, 0, PaymentHistory::Excellent).unwrap();
        assert_eq!(r.factors.contributions.score, r.factors.contributions.weight);
        assert_eq!(r.factors.membership.score, r.factors.membership.weight);
        assert_eq!(r.score, 100);
    }

    #[test]
    fn test_loan_ceiling_capped() {
        let r = compute_eligibility(dec!(400000), 24, 0, PaymentHistory::Excellent).unwrap();
        assert_eq!(r.max_loan_amount, dec!(500000));
    }

    #[test]
    fn test_multiplier_per_history() {
        let cases = [
            (PaymentHistory::Excellent, dec!(30000)),
            (PaymentHistory::Good, dec!(25000)),
            (PaymentHistory::Fair, dec!(20000)),
            (PaymentHistory::Poor, dec!(15000)),
        ];
        for (history, expected) in cases {
            let r = compute_eligibility(dec!(10000), 12, 0, history).unwrap();
            assert_eq!(r.max_loan_amount, expected, "history {history}");
        }
    }

    #[test]
    fn test_recommendation_order() {
        let r = compute_eligibility(dec!(10000), 4, 3, PaymentHistory::Fair).unwrap();
        let kinds: Vec<RecommendationKind> = r.recommendations.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                RecommendationKind::Improvement,
                RecommendationKind::Info,
                RecommendationKind::Warning,
                RecommendationKind::Improvement,
            ]
        );
        assert!(r.recommendations[0].description.contains("KES 20,000"));
        assert!(r.recommendations[1].description.contains("4 months"));
    }

    #[test]
    fn test_strong_profile_only_gets_success() {
        let r = compute_eligibility(dec!(50000), 12, 0, PaymentHistory::Excellent).unwrap();
        assert_eq!(r.recommendations.len(), 1);
        assert_eq!(r.recommendations[0].kind, RecommendationKind::Success);
    }

    #[test]
    fn test_negative_contributions_rejected() {
        let err = compute_eligibility(dec!(-1), 12, 0, PaymentHistory::Good).unwrap_err();
        assert!(
            matches!(err, ChamaError::InvalidInput { ref field, .. } if field == "total_contributions")
        );
    }

    #[test]
    fn test_payment_history_parsing() {
        assert_eq!("Excellent".parse::<PaymentHistory>().unwrap(), PaymentHistory::Excellent);
        assert_eq!(" poor ".parse::<PaymentHistory>().unwrap(), PaymentHistory::Poor);
        assert!("stellar".parse::<PaymentHistory>().is_err());
    }

    #[test]
    fn test_missing_history_defaults_to_good() {
        let input: EligibilityInput = serde_json::from_str(
            r#"{"total_contributions": "45000", "membership_months": 18, "active_loans": 1}"#,
        )
        .unwrap();
        assert_eq!(input.payment_history, PaymentHistory::Good);
    }

    #[test]
    fn test_score_band_thresholds() {
        assert_eq!(ScoreBand::from_score(80), ScoreBand::Excellent);
        assert_eq!(ScoreBand::from_score(79), ScoreBand::Good);
        assert_eq!(ScoreBand::from_score(60), ScoreBand::Good);
        assert_eq!(ScoreBand::from_score(40), ScoreBand::Fair);
        assert_eq!(ScoreBand::from_score(39), ScoreBand::Poor);
    }

    #[test]
    fn test_assess_reports_unmet_requirements() {
        let input = member(dec!(5000), 3, 2, PaymentHistory::Fair);
        let out = assess_eligibility(&input, &LendingPolicy::default()).unwrap();
        assert!(!out.result.is_eligible);
        assert_eq!(out.warnings.len(), 3);
    }

    #[test]
    fn test_assess_reports_capped_ceiling() {
        let input = member(dec!(400000), 24, 0, PaymentHistory::Good);
        let out = assess_eligibility(&input, &LendingPolicy::default()).unwrap();
        assert_eq!(out.warnings, vec!["Loan ceiling capped at the policy limit of KES 500,000".to_string()]);
    }

    #[test]
    fn test_custom_policy_cap() {
        let mut policy = LendingPolicy::default();
        policy.eligibility.max_loan_cap = dec!(100000);
        let r = score_eligibility(&member(dec!(45000), 18, 1, PaymentHistory::Good), &policy).unwrap();
        assert_eq!(r.max_loan_amount, dec!(100000));
    }

    #[test]
    fn test_repeated_calls_identical() {
        let a = compute_eligibility(dec!(33333), 7, 1, PaymentHistory::Fair).unwrap();
        let b = compute_eligibility(dec!(33333), 7, 1, PaymentHistory::Fair).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_extreme_contributions_saturate_to_cap() {
        let r = compute_eligibility(Decimal::MAX, 12, 0, PaymentHistory::Excellent).unwrap();
        assert_eq!(r.factors.contributions.score, dec!(30));
        assert_eq!(r.score, 100);
        assert_eq!(r.max_loan_amount, dec!(500000));
        assert!(r.is_eligible);
    }

    #[test]
    fn test_extreme_contributions_envelope_warns_capped() {
        let input = member(Decimal::MAX, 24, 0, PaymentHistory::Excellent);
        let out = assess_eligibility(&input, &LendingPolicy::default()).unwrap();
        assert_eq!(out.result.max_loan_amount, dec!(500000));
        assert_eq!(out.warnings, vec!["Loan ceiling capped at the policy limit of KES 500,000".to_string()]);
    }

    #[test]
    fn test_active_loan_tiers_follow_policy_limit() {
        let mut policy = LendingPolicy::default();
        policy.eligibility.max_active_loans = 3;
        let two = score_eligibility(&member(dec!(45000), 18, 2, PaymentHistory::Good), &policy).unwrap();
        assert_eq!(two.factors.active_loans.score, dec!(15));
        assert!(two.is_eligible);

        let three = score_eligibility(&member(dec!(45000), 18, 3, PaymentHistory::Good), &policy).unwrap();
        assert_eq!(three.factors.active_loans.score, Decimal::ZERO);
        assert!(!three.is_eligible);
    }
}
