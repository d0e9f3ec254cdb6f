pub mod loans;
pub mod savings;
