//! Member lending: loan quotes, eligibility and application review.

pub mod amortization;
pub mod application;
pub mod eligibility;
pub mod policy;

pub use amortization::{compute_amortization, quote_loan, AmortizationResult, LoanQuoteRequest};
pub use eligibility::{compute_eligibility, EligibilityResult, PaymentHistory};
