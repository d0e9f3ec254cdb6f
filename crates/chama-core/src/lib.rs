//! Calculation engine behind the chama dashboard: loan quotes and
//! amortisation schedules, member eligibility scoring, loan application
//! review, and savings/contribution summaries.
//!
//! Every operation is a pure function over caller-supplied values. All
//! arithmetic uses `rust_decimal::Decimal`.

pub mod error;
pub mod types;

#[cfg(feature = "lending")]
pub mod lending;

#[cfg(feature = "savings")]
pub mod savings;

pub use error::ChamaError;
#[cfg(feature = "lending")]
pub use lending::policy::LendingPolicy;
pub use types::*;

/// Standard result type for all chama operations
pub type ChamaResult<T> = Result<T, ChamaError>;
