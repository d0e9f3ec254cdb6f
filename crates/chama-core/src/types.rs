use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// All monetary values (KES). Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates. Interest inputs are annual percentages (15 = 15%); internal
/// periodic rates are decimals (0.0125 = 1.25%).
pub type Rate = Decimal;

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    for warning in &warnings {
        tracing::warn!(methodology, warning = %warning, "computation warning");
    }
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

/// Render an amount the way the dashboard shows it: `KES 112,500`.
/// Rounded to whole shillings.
pub fn format_kes(amount: Money) -> String {
    let rounded = amount.round_dp_with_strategy(0, rust_decimal::RoundingStrategy::MidpointAwayFromZero);
    let digits = rounded.abs().trunc().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("KES -{grouped}")
    } else {
        format!("KES {grouped}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_kes_groups_thousands() {
        assert_eq!(format_kes(dec!(112500)), "KES 112,500");
        assert_eq!(format_kes(dec!(1000)), "KES 1,000");
        assert_eq!(format_kes(dec!(999)), "KES 999");
        assert_eq!(format_kes(dec!(1234567.5)), "KES 1,234,568");
    }

    #[test]
    fn test_format_kes_negative_and_zero() {
        assert_eq!(format_kes(dec!(-2500)), "KES -2,500");
        assert_eq!(format_kes(Decimal::ZERO), "KES 0");
    }
}
