// src/errors.rs
use thiserror::Error;

/// Failures surfaced by fee sampling and prioritized submission.
///
/// Callers match on the variant to decide between retrying as-is,
/// rebuilding the transaction, or aborting. `is_retryable` encodes
/// that split for the common case.
#[derive(Error, Debug)]
pub enum SenderError {
    #[error("Missing or invalid configuration for {variable}: {reason}")]
    Config { variable: String, reason: String },

    #[error("Failed to fetch recent prioritization fees: {message}")]
    FeeQueryFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Failed to fetch latest blockhash: {message}")]
    BlockhashFetch {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Failed to sign transaction: {reason}")]
    Signing { reason: String },

    #[error("Failed to send transaction (retry budget {max_retries}): {message}")]
    SendFailed {
        max_retries: usize,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // The cluster accepted the transaction and then reported it failed.
    // A fee may still have been charged; query the record before assuming
    // zero cost.
    #[error("Transaction {signature} rejected by the cluster: {reason}")]
    TransactionRejected { signature: String, reason: String },

    // The fate of the transaction is unknown, not negative. Resubmitting
    // the same signed payload cannot succeed; it has to be rebuilt against
    // a fresh blockhash.
    #[error("Blockhash expired before transaction {signature} was confirmed (last valid block height {last_valid_block_height})")]
    BlockhashExpired {
        signature: String,
        last_valid_block_height: u64,
    },

    #[error("Confirmation tracking failed for transaction {signature}: {message}")]
    ConfirmationFailed {
        signature: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Failed to fetch transaction record for {signature}: {message}")]
    RecordFetch {
        signature: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl SenderError {
    /// Whether the caller may retry, possibly after rebuilding the
    /// transaction. `Config`, `Signing` and `TransactionRejected` are
    /// terminal; everything else is a transport failure or an expired
    /// validity window.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            SenderError::Config { .. }
                | SenderError::Signing { .. }
                | SenderError::TransactionRejected { .. }
        )
    }
}
