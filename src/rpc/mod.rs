use async_trait::async_trait;
use log::debug;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::{RpcSendTransactionConfig, RpcTransactionConfig};
use solana_sdk::{
    commitment_config::CommitmentConfig, hash::Hash, pubkey::Pubkey, signature::Signature,
    transaction::VersionedTransaction,
};
use solana_transaction_status::UiTransactionEncoding;
use std::time::Duration;

use crate::errors::SenderError;

/// One prioritization fee sample as returned by the cluster. Slots may
/// repeat; samples are not deduplicated before statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeObservation {
    pub slot: u64,
    pub prioritization_fee: u64,
}

/// Terminal outcome of waiting on a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    Confirmed,
    Rejected(String),
    Expired,
}

/// The slice of cluster RPC the sampler and executor consume. Production
/// code talks to `RpcSolanaApi`; tests substitute deterministic stubs.
#[async_trait]
pub trait SolanaApi: Send + Sync {
    /// Recent per-slot prioritization fees, restricted to the given
    /// writable accounts. The account filter is passed through unchanged.
    async fn recent_prioritization_fees(
        &self,
        accounts: &[Pubkey],
    ) -> Result<Vec<FeeObservation>, SenderError>;

    /// Latest blockhash and its last valid block height.
    async fn latest_blockhash(&self) -> Result<(Hash, u64), SenderError>;

    /// Broadcast an already-signed transaction. `max_retries` bounds
    /// RPC-side resends of the same signed bytes.
    async fn send_signed_transaction(
        &self,
        transaction: &VersionedTransaction,
        max_retries: usize,
    ) -> Result<Signature, SenderError>;

    /// Suspend until the transaction lands, the cluster rejects it, or the
    /// blockhash validity window elapses. Bounded by block height, never
    /// by wall clock.
    async fn await_confirmation(
        &self,
        signature: &Signature,
        blockhash: &Hash,
        last_valid_block_height: u64,
    ) -> Result<ConfirmationOutcome, SenderError>;

    /// Realized fee in lamports from the finalized transaction record, or
    /// None when the record is not yet queryable at this commitment.
    async fn transaction_fee(&self, signature: &Signature) -> Result<Option<u64>, SenderError>;
}

// One Solana slot, roughly. Confirmation polling cadence.
const CONFIRM_POLL_INTERVAL: Duration = Duration::from_millis(400);

pub struct RpcSolanaApi {
    rpc_client: RpcClient,
    commitment: CommitmentConfig,
}

impl RpcSolanaApi {
    pub fn new(rpc_url: String) -> Self {
        Self::new_with_commitment(rpc_url, CommitmentConfig::confirmed())
    }

    pub fn new_with_commitment(rpc_url: String, commitment: CommitmentConfig) -> Self {
        Self {
            rpc_client: RpcClient::new_with_commitment(rpc_url, commitment),
            commitment,
        }
    }

    pub fn url(&self) -> String {
        self.rpc_client.url()
    }
}

#[async_trait]
impl SolanaApi for RpcSolanaApi {
    async fn recent_prioritization_fees(
        &self,
        accounts: &[Pubkey],
    ) -> Result<Vec<FeeObservation>, SenderError> {
        let fees = self
            .rpc_client
            .get_recent_prioritization_fees(accounts)
            .await
            .map_err(|e| SenderError::FeeQueryFailed {
                message: e.to_string(),
                source: Some(Box::new(e)),
            })?;

        Ok(fees
            .into_iter()
            .map(|f| FeeObservation {
                slot: f.slot,
                prioritization_fee: f.prioritization_fee,
            })
            .collect())
    }

    async fn latest_blockhash(&self) -> Result<(Hash, u64), SenderError> {
        self.rpc_client
            .get_latest_blockhash_with_commitment(self.commitment)
            .await
            .map_err(|e| SenderError::BlockhashFetch {
                message: e.to_string(),
                source: Some(Box::new(e)),
            })
    }

    async fn send_signed_transaction(
        &self,
        transaction: &VersionedTransaction,
        max_retries: usize,
    ) -> Result<Signature, SenderError> {
        let send_config = RpcSendTransactionConfig {
            skip_preflight: false,
            preflight_commitment: Some(self.commitment.commitment),
            encoding: Some(UiTransactionEncoding::Base64),
            max_retries: Some(max_retries),
            min_context_slot: None,
        };

        self.rpc_client
            .send_transaction_with_config(transaction, send_config)
            .await
            .map_err(|e| SenderError::SendFailed {
                max_retries,
                message: e.to_string(),
                source: Some(Box::new(e)),
            })
    }

    async fn await_confirmation(
        &self,
        signature: &Signature,
        _blockhash: &Hash,
        last_valid_block_height: u64,
    ) -> Result<ConfirmationOutcome, SenderError> {
        loop {
            match self
                .rpc_client
                .get_signature_status_with_commitment(signature, self.commitment)
                .await
            {
                Ok(Some(Ok(()))) => return Ok(ConfirmationOutcome::Confirmed),
                Ok(Some(Err(tx_err))) => {
                    return Ok(ConfirmationOutcome::Rejected(tx_err.to_string()))
                }
                Ok(None) => {}
                Err(e) => {
                    return Err(SenderError::ConfirmationFailed {
                        signature: signature.to_string(),
                        message: e.to_string(),
                        source: Some(Box::new(e)),
                    })
                }
            }

            let block_height = self
                .rpc_client
                .get_block_height_with_commitment(self.commitment)
                .await
                .map_err(|e| SenderError::ConfirmationFailed {
                    signature: signature.to_string(),
                    message: e.to_string(),
                    source: Some(Box::new(e)),
                })?;

            if block_height > last_valid_block_height {
                debug!(
                    "Block height {} passed last valid height {} for {}",
                    block_height, last_valid_block_height, signature
                );
                return Ok(ConfirmationOutcome::Expired);
            }

            tokio::time::sleep(CONFIRM_POLL_INTERVAL).await;
        }
    }

    async fn transaction_fee(&self, signature: &Signature) -> Result<Option<u64>, SenderError> {
        let config = RpcTransactionConfig {
            encoding: Some(UiTransactionEncoding::Json),
            commitment: Some(self.commitment),
            max_supported_transaction_version: Some(0),
        };

        let record = self
            .rpc_client
            .get_transaction_with_config(signature, config)
            .await
            .map_err(|e| SenderError::RecordFetch {
                signature: signature.to_string(),
                message: e.to_string(),
                source: Some(Box::new(e)),
            })?;

        Ok(record.transaction.meta.map(|meta| meta.fee))
    }
}
