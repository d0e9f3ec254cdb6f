use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ChamaError;
use crate::types::Money;
use crate::ChamaResult;

/// Progress towards a savings target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsProgress {
    pub current_amount: Money,
    pub target_amount: Money,
    /// Percentage of the target saved, capped at 100.
    pub progress_pct: Decimal,
    /// Amount still to save, never negative.
    pub remaining_amount: Money,
    pub target_reached: bool,
}

pub fn savings_progress(current_amount: Money, target_amount: Money) -> ChamaResult<SavingsProgress> {
    if target_amount <= Decimal::ZERO {
        return Err(ChamaError::invalid(
            "target_amount",
            "Savings target must be positive.",
        ));
    }
    if current_amount < Decimal::ZERO {
        return Err(ChamaError::invalid(
            "current_amount",
            "Saved amount must not be negative.",
        ));
    }

    // Overflow means the saved amount dwarfs the target.
    let progress_pct = current_amount
        .checked_div(target_amount)
        .and_then(|ratio| ratio.checked_mul(dec!(100)))
        .map_or(dec!(100), |pct| pct.min(dec!(100)));
    let remaining_amount = (target_amount - current_amount).max(Decimal::ZERO);

    Ok(SavingsProgress {
        current_amount,
        target_amount,
        progress_pct,
        remaining_amount,
        target_reached: current_amount >= target_amount,
    })
}
