//! Contribution summaries and history queries.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::time::Instant;

use crate::error::ChamaError;
use crate::types::*;
use crate::ChamaResult;

// ---------------------------------------------------------------------------
// Input / Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContributionStatus {
    Completed,
    Pending,
    Failed,
    Processing,
}

/// A single contribution payment into a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub id: u64,
    pub amount: Money,
    /// Transaction fee charged on top of the amount.
    #[serde(default)]
    pub fee: Money,
    #[serde(default)]
    pub purpose: String,
    pub group_name: String,
    #[serde(default)]
    pub payment_method: String,
    pub status: ContributionStatus,
    pub date: NaiveDateTime,
    #[serde(default)]
    pub reference: String,
}

/// Period filter, relative to the report's `as_of` date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateRange {
    #[default]
    All,
    Today,
    /// Same ISO week.
    Week,
    Month,
    Quarter,
    Year,
}

impl DateRange {
    pub fn contains(self, date: NaiveDate, as_of: NaiveDate) -> bool {
        match self {
            DateRange::All => true,
            DateRange::Today => date == as_of,
            DateRange::Week => date.iso_week() == as_of.iso_week(),
            DateRange::Month => date.year() == as_of.year() && date.month() == as_of.month(),
            DateRange::Quarter => {
                date.year() == as_of.year() && date.month0() / 3 == as_of.month0() / 3
            }
            DateRange::Year => date.year() == as_of.year(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistorySort {
    #[default]
    DateDesc,
    DateAsc,
    AmountDesc,
    AmountAsc,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryQuery {
    pub date_range: DateRange,
    pub status: Option<ContributionStatus>,
    /// Group name, matched case-insensitively.
    pub group: Option<String>,
    /// Case-insensitive substring of reference, purpose, group or method.
    pub search_term: Option<String>,
    pub sort: HistorySort,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionSummary {
    /// Sum of completed contributions.
    pub total_contributions: Money,
    /// Completed contributions in the `as_of` calendar month.
    pub this_month_contributions: Money,
    pub pending_contributions: Money,
    /// Fees paid on completed contributions.
    pub total_fees: Money,
    pub completed_count: usize,
    pub pending_count: usize,
    pub failed_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionReportInput {
    pub as_of: NaiveDate,
    pub contributions: Vec<Contribution>,
    #[serde(default)]
    pub query: HistoryQuery,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionReport {
    pub summary: ContributionSummary,
    pub history: Vec<Contribution>,
}

// ---------------------------------------------------------------------------
// Core functions
// ---------------------------------------------------------------------------

/// Totals over a member's contributions as of a given day.
pub fn summarize_contributions(
    contributions: &[Contribution],
    as_of: NaiveDate,
) -> ChamaResult<ContributionSummary> {
    validate_contributions(contributions)?;

    let mut summary = ContributionSummary {
        total_contributions: Decimal::ZERO,
        this_month_contributions: Decimal::ZERO,
        pending_contributions: Decimal::ZERO,
        total_fees: Decimal::ZERO,
        completed_count: 0,
        pending_count: 0,
        failed_count: 0,
    };

    for c in contributions {
        match c.status {
            ContributionStatus::Completed => {
                summary.total_contributions = add_total(summary.total_contributions, c.amount)?;
                summary.total_fees = add_total(summary.total_fees, c.fee)?;
                summary.completed_count += 1;
                if DateRange::Month.contains(c.date.date(), as_of) {
                    summary.this_month_contributions =
                        add_total(summary.this_month_contributions, c.amount)?;
                }
            }
            ContributionStatus::Pending => {
                summary.pending_contributions =
                    add_total(summary.pending_contributions, c.amount)?;
                summary.pending_count += 1;
            }
            ContributionStatus::Failed => summary.failed_count += 1,
            ContributionStatus::Processing => {}
        }
    }

    Ok(summary)
}

fn add_total(total: Money, amount: Money) -> ChamaResult<Money> {
    total
        .checked_add(amount)
        .ok_or_else(|| ChamaError::invalid("contributions", "Total exceeds decimal range"))
}

/// Filter and sort the contribution history.
pub fn query_history(
    contributions: &[Contribution],
    query: &HistoryQuery,
    as_of: NaiveDate,
) -> Vec<Contribution> {
    let group = query.group.as_deref().map(str::trim).filter(|g| !g.is_empty());
    let needle = query
        .search_term
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    let mut rows: Vec<Contribution> = contributions
        .iter()
        .filter(|c| query.date_range.contains(c.date.date(), as_of))
        .filter(|c| query.status.map_or(true, |s| c.status == s))
        .filter(|c| group.map_or(true, |g| c.group_name.eq_ignore_ascii_case(g)))
        .filter(|c| needle.as_deref().map_or(true, |n| matches_search(c, n)))
        .cloned()
        .collect();

    rows.sort_by(|a, b| compare(a, b, query.sort));
    rows
}

/// Summary plus queried history in one envelope.
pub fn contribution_report(
    input: &ContributionReportInput,
) -> ChamaResult<ComputationOutput<ContributionReport>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let summary = summarize_contributions(&input.contributions, input.as_of)?;
    let history = query_history(&input.contributions, &input.query, input.as_of);

    let future = input
        .contributions
        .iter()
        .filter(|c| c.date.date() > input.as_of)
        .count();
    if future > 0 {
        warnings.push(format!(
            "{future} contribution(s) dated after {}",
            input.as_of
        ));
    }

    tracing::debug!(
        contributions = input.contributions.len(),
        matched = history.len(),
        total = %summary.total_contributions,
        "contribution report built"
    );

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Completed-contribution totals with filtered history",
        &serde_json::json!({
            "as_of": input.as_of.to_string(),
            "query": input.query,
        }),
        warnings,
        elapsed,
        ContributionReport { summary, history },
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn matches_search(c: &Contribution, needle: &str) -> bool {
    [&c.reference, &c.purpose, &c.group_name, &c.payment_method]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}

fn compare(a: &Contribution, b: &Contribution, sort: HistorySort) -> Ordering {
    match sort {
        HistorySort::DateDesc => b.date.cmp(&a.date),
        HistorySort::DateAsc => a.date.cmp(&b.date),
        HistorySort::AmountDesc => b.amount.cmp(&a.amount),
        HistorySort::AmountAsc => a.amount.cmp(&b.amount),
    }
}

fn validate_contributions(contributions: &[Contribution]) -> ChamaResult<()> {
    for c in contributions {
        if c.amount < Decimal::ZERO {
            return Err(ChamaError::invalid(
                format!("contributions[{}].amount", c.id),
                "Contribution amount must not be negative.",
            ));
        }
        if c.fee < Decimal::ZERO {
            return Err(ChamaError::invalid(
                format!("contributions[{}].fee", c.id),
                "Contribution fee must not be negative.",
            ));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
