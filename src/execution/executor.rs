use log::{info, warn};
use serde::Serialize;
use solana_sdk::{
    compute_budget::ComputeBudgetInstruction,
    message::{v0, VersionedMessage},
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    system_instruction,
    transaction::VersionedTransaction,
};
use std::sync::Arc;

use crate::errors::SenderError;
use crate::rpc::{ConfirmationOutcome, SolanaApi};

/// A single prioritized transfer, fixed once built. The priority fee rate
/// is in micro-lamports per compute unit, typically the sampler's median
/// over non-zero observations.
pub struct TransferIntent {
    pub sender: Keypair,
    pub recipient: Pubkey,
    pub amount_lamports: u64,
    pub priority_fee_microlamports: u64,
}

/// Terminal report of one submission. `fee_lamports` is the fee the cluster
/// actually charged, which can differ from the requested priority rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionResult {
    pub signature: String,
    pub confirmed: bool,
    pub fee_lamports: Option<u64>,
}

/// Builds, signs, broadcasts and confirms a transfer carrying a priority
/// fee instruction. Each `submit` call runs as one logical task; callers
/// racing on the same sender account must serialize themselves.
pub struct TransferExecutor {
    api: Arc<dyn SolanaApi>,
}

impl TransferExecutor {
    pub fn new(api: Arc<dyn SolanaApi>) -> Self {
        Self { api }
    }

    /// Submit the transfer and wait for its fate.
    ///
    /// `max_retries` bounds RPC-side resends of the same signed bytes during
    /// broadcast. The transaction is never rebuilt here: an expired validity
    /// window surfaces as `BlockhashExpired` and a cluster rejection as
    /// `TransactionRejected`, both of which the caller must handle.
    pub async fn submit(
        &self,
        intent: &TransferIntent,
        max_retries: usize,
    ) -> Result<SubmissionResult, SenderError> {
        // The blockhash anchors the validity window; a stale one means
        // rebuild, not resend.
        let (blockhash, last_valid_block_height) = self.api.latest_blockhash().await?;
        info!(
            "✅ Fetched latest blockhash, last valid block height: {}",
            last_valid_block_height
        );

        let instructions = vec![
            system_instruction::transfer(
                &intent.sender.pubkey(),
                &intent.recipient,
                intent.amount_lamports,
            ),
            ComputeBudgetInstruction::set_compute_unit_price(intent.priority_fee_microlamports),
        ];

        let message =
            v0::Message::try_compile(&intent.sender.pubkey(), &instructions, &[], blockhash)
                .map_err(|e| SenderError::Signing {
                    reason: format!("message compilation failed: {}", e),
                })?;
        info!("✅ Compiled transaction message");

        // Signing is local; a malformed key fails here before any further
        // network round trip.
        let transaction =
            VersionedTransaction::try_new(VersionedMessage::V0(message), &[&intent.sender])
                .map_err(|e| SenderError::Signing {
                    reason: e.to_string(),
                })?;
        info!("✅ Transaction signed");

        let signature = self
            .api
            .send_signed_transaction(&transaction, max_retries)
            .await?;
        info!("✅ Transaction sent to network: {}", signature);

        match self
            .api
            .await_confirmation(&signature, &blockhash, last_valid_block_height)
            .await?
        {
            ConfirmationOutcome::Confirmed => {
                let fee_lamports = match self.api.transaction_fee(&signature).await {
                    Ok(fee) => fee,
                    Err(e) => {
                        // Confirmation already succeeded; the record can lag
                        // behind the queried commitment.
                        warn!("Fee readback failed for {}: {}", signature, e);
                        None
                    }
                };
                Ok(SubmissionResult {
                    signature: signature.to_string(),
                    confirmed: true,
                    fee_lamports,
                })
            }
            ConfirmationOutcome::Rejected(reason) => Err(SenderError::TransactionRejected {
                signature: signature.to_string(),
                reason,
            }),
            ConfirmationOutcome::Expired => Err(SenderError::BlockhashExpired {
                signature: signature.to_string(),
                last_valid_block_height,
            }),
        }
    }
}
