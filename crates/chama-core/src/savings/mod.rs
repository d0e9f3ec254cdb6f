pub mod contributions;
pub mod progress;
