pub mod config;
pub mod language;
pub mod problem;
pub mod retry;
pub mod store;
pub mod submission;
pub mod submission_status;

pub use language::Language;
pub use submission_status::{RuntimeErrorCause, Verdict};
