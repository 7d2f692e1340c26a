pub mod executor;

pub use executor::{SubmissionResult, TransferExecutor, TransferIntent};
