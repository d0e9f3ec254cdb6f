use chama_core::savings::contributions::{
    self, ContributionReportInput, ContributionStatus, DateRange, HistorySort,
};
use chama_core::savings::progress;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Contribution report tests
// ===========================================================================

fn sample_report_json() -> &'static str {
    r#"{
        "as_of": "2025-01-20",
        "contributions": [
            {
                "id": 1, "amount": "2500", "fee": "25", "purpose": "Regular Contribution",
                "group_name": "Umoja Savings Group", "payment_method": "M-Pesa",
                "status": "completed", "date": "2025-01-15T10:30:00", "reference": "CHM-001234"
            },
            {
                "id": 2, "amount": "1500", "fee": "15", "purpose": "Emergency Fund",
                "group_name": "Harambee Circle", "payment_method": "Bank Transfer",
                "status": "completed", "date": "2025-01-10T14:20:00", "reference": "CHM-001235"
            },
            {
                "id": 3, "amount": "3000", "fee": "30", "purpose": "Project Fund",
                "group_name": "Tumaini Chama", "payment_method": "M-Pesa",
                "status": "pending", "date": "2025-01-08T09:15:00", "reference": "CHM-001236"
            },
            {
                "id": 4, "amount": "2000", "fee": "20", "purpose": "Regular Contribution",
                "group_name": "Umoja Savings Group", "payment_method": "Airtel Money",
                "status": "failed", "date": "2025-01-05T16:45:00", "reference": "CHM-001237"
            },
            {
                "id": 5, "amount": "4000", "purpose": "Regular Contribution",
                "group_name": "Umoja Savings Group", "payment_method": "M-Pesa",
                "status": "completed", "date": "2024-12-28T08:00:00", "reference": "CHM-001200"
            }
        ],
        "query": {"group": "Umoja Savings Group", "sort": "amount_desc"}
    }"#
}

#[test]
fn test_contribution_report_from_json() {
    let input: ContributionReportInput = serde_json::from_str(sample_report_json()).unwrap();
    let out = contributions::contribution_report(&input).unwrap();
    let summary = &out.result.summary;

    // Completed: 2500 + 1500 + 4000
    assert_eq!(summary.total_contributions, dec!(8000));
    // December's 4000 falls outside January
    assert_eq!(summary.this_month_contributions, dec!(4000));
    assert_eq!(summary.pending_contributions, dec!(3000));
    // Fee omitted on id 5 defaults to zero
    assert_eq!(summary.total_fees, dec!(40));
    assert_eq!(summary.failed_count, 1);

    let ids: Vec<u64> = out.result.history.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![5, 1, 4]);
    assert!(out.warnings.is_empty());
}

#[test]
fn test_contribution_history_this_month_completed() {
    let mut input: ContributionReportInput = serde_json::from_str(sample_report_json()).unwrap();
    input.query.group = None;
    input.query.date_range = DateRange::Month;
    input.query.status = Some(ContributionStatus::Completed);
    input.query.sort = HistorySort::DateAsc;

    let history = contributions::query_history(&input.contributions, &input.query, input.as_of);
    let ids: Vec<u64> = history.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![2, 1]);
}

#[test]
fn test_summary_is_independent_of_query() {
    let input: ContributionReportInput = serde_json::from_str(sample_report_json()).unwrap();
    let direct = contributions::summarize_contributions(&input.contributions, input.as_of).unwrap();
    let report = contributions::contribution_report(&input).unwrap();
    assert_eq!(direct, report.result.summary);
}

#[test]
fn test_summary_in_later_month() {
    let input: ContributionReportInput = serde_json::from_str(sample_report_json()).unwrap();
    let as_of = NaiveDate::from_ymd_opt(2025, 2, 3).unwrap();
    let summary = contributions::summarize_contributions(&input.contributions, as_of).unwrap();
    assert_eq!(summary.this_month_contributions, Decimal::ZERO);
    assert_eq!(summary.total_contributions, dec!(8000));
}

// ===========================================================================
// Savings progress tests
// ===========================================================================

#[test]
fn test_savings_progress_fraction() {
    let p = progress::savings_progress(dec!(8000), dec!(30000)).unwrap();
    assert_eq!(p.remaining_amount, dec!(22000));
    assert!((p.progress_pct - dec!(26.6667)).abs() < dec!(0.0001));
}

#[test]
fn test_savings_progress_zero_saved() {
    let p = progress::savings_progress(Decimal::ZERO, dec!(30000)).unwrap();
    assert_eq!(p.progress_pct, Decimal::ZERO);
    assert_eq!(p.remaining_amount, dec!(30000));
}

// ===========================================================================
// Decimal range boundaries
// ===========================================================================

#[test]
fn test_report_with_overflowing_pending_total_is_an_error() {
    let mut input: ContributionReportInput = serde_json::from_str(sample_report_json()).unwrap();
    for c in input.contributions.iter_mut() {
        c.status = ContributionStatus::Pending;
        c.amount = Decimal::MAX;
    }
    assert!(contributions::contribution_report(&input).is_err());
}

#[test]
fn test_savings_progress_saturates_at_full() {
    let p = progress::savings_progress(Decimal::MAX, dec!(0.001)).unwrap();
    assert_eq!(p.progress_pct, dec!(100));
    assert!(p.target_reached);
}
