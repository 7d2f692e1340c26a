use log::{debug, warn};
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;

use crate::errors::SenderError;
use crate::rpc::{FeeObservation, SolanaApi};

/// Summary statistics over recent prioritization fee samples, in
/// micro-lamports per compute unit. Recomputed fresh on every call.
///
/// `sample_count == 0` means the cluster returned no observations for the
/// requested accounts; every derived field is 0 in that case and the value
/// is a normal result, not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeeSummary {
    pub sample_count: u64,
    pub slot_range_start: u64,
    pub slot_range_end: u64,
    pub mean_including_zeros: u64,
    pub mean_excluding_zeros: u64,
    pub median_excluding_zeros: u64,
}

pub struct FeeSampler {
    api: Arc<dyn SolanaApi>,
}

impl FeeSampler {
    pub fn new(api: Arc<dyn SolanaApi>) -> Self {
        Self { api }
    }

    /// Query recent per-slot prioritization fees restricted to the given
    /// writable accounts and reduce them to summary statistics. The account
    /// filter is forwarded unchanged.
    pub async fn sample(&self, accounts: &[Pubkey]) -> Result<FeeSummary, SenderError> {
        let observations = self.api.recent_prioritization_fees(accounts).await?;

        if observations.is_empty() {
            warn!("No prioritization fee data available");
            return Ok(FeeSummary::default());
        }

        let summary = summarize(&observations);
        debug!(
            "Sampled {} slots ({}..{}): mean={} mean_nonzero={} median_nonzero={}",
            summary.sample_count,
            summary.slot_range_start,
            summary.slot_range_end,
            summary.mean_including_zeros,
            summary.mean_excluding_zeros,
            summary.median_excluding_zeros
        );
        Ok(summary)
    }
}

/// All arithmetic is integer floor division; fractional micro-lamports are
/// never reported. Duplicate slots count as separate samples.
fn summarize(observations: &[FeeObservation]) -> FeeSummary {
    let sample_count = observations.len() as u64;

    let slot_range_start = observations.iter().map(|o| o.slot).min().unwrap_or(0);
    let slot_range_end = observations.iter().map(|o| o.slot).max().unwrap_or(0);

    let total_fee: u64 = observations.iter().map(|o| o.prioritization_fee).sum();
    let mean_including_zeros = total_fee / sample_count;

    let mut nonzero_fees: Vec<u64> = observations
        .iter()
        .map(|o| o.prioritization_fee)
        .filter(|&fee| fee > 0)
        .collect();
    nonzero_fees.sort_unstable();

    let mean_excluding_zeros = if nonzero_fees.is_empty() {
        0
    } else {
        nonzero_fees.iter().sum::<u64>() / nonzero_fees.len() as u64
    };

    FeeSummary {
        sample_count,
        slot_range_start,
        slot_range_end,
        mean_including_zeros,
        mean_excluding_zeros,
        median_excluding_zeros: median_of_sorted(&nonzero_fees),
    }
}

fn median_of_sorted(sorted_fees: &[u64]) -> u64 {
    if sorted_fees.is_empty() {
        return 0;
    }
    let mid = sorted_fees.len() / 2;
    if sorted_fees.len() % 2 != 0 {
        sorted_fees[mid]
    } else {
        (sorted_fees[mid - 1] + sorted_fees[mid]) / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use solana_sdk::{hash::Hash, signature::Signature, transaction::VersionedTransaction};

    use crate::rpc::ConfirmationOutcome;

    struct StubApi {
        observations: Vec<FeeObservation>,
        fail: bool,
    }

    #[async_trait]
    impl SolanaApi for StubApi {
        async fn recent_prioritization_fees(
            &self,
            _accounts: &[Pubkey],
        ) -> Result<Vec<FeeObservation>, SenderError> {
            if self.fail {
                return Err(SenderError::FeeQueryFailed {
                    message: "connection refused".to_string(),
                    source: None,
                });
            }
            Ok(self.observations.clone())
        }

        async fn latest_blockhash(&self) -> Result<(Hash, u64), SenderError> {
            unimplemented!("not exercised by sampler tests")
        }

        async fn send_signed_transaction(
            &self,
            _transaction: &VersionedTransaction,
            _max_retries: usize,
        ) -> Result<Signature, SenderError> {
            unimplemented!("not exercised by sampler tests")
        }

        async fn await_confirmation(
            &self,
            _signature: &Signature,
            _blockhash: &Hash,
            _last_valid_block_height: u64,
        ) -> Result<ConfirmationOutcome, SenderError> {
            unimplemented!("not exercised by sampler tests")
        }

        async fn transaction_fee(
            &self,
            _signature: &Signature,
        ) -> Result<Option<u64>, SenderError> {
            unimplemented!("not exercised by sampler tests")
        }
    }

    fn obs(slot: u64, fee: u64) -> FeeObservation {
        FeeObservation {
            slot,
            prioritization_fee: fee,
        }
    }

    #[tokio::test]
    async fn empty_result_is_a_zero_summary_not_an_error() {
        let sampler = FeeSampler::new(Arc::new(StubApi {
            observations: vec![],
            fail: false,
        }));

        let summary = sampler.sample(&[]).await.unwrap();
        assert_eq!(summary, FeeSummary::default());
        assert_eq!(summary.sample_count, 0);
    }

    #[tokio::test]
    async fn query_failure_surfaces_as_fee_query_error() {
        let sampler = FeeSampler::new(Arc::new(StubApi {
            observations: vec![],
            fail: true,
        }));

        let err = sampler.sample(&[]).await.unwrap_err();
        assert!(matches!(err, SenderError::FeeQueryFailed { .. }));
    }

    #[test]
    fn slot_range_is_min_and_max_of_unsorted_input() {
        let summary = summarize(&[obs(310, 5), obs(290, 7), obs(305, 0)]);
        assert_eq!(summary.slot_range_start, 290);
        assert_eq!(summary.slot_range_end, 310);
        assert!(summary.slot_range_start <= summary.slot_range_end);
    }

    #[test]
    fn means_use_their_own_divisors() {
        // [0, 0, 100]: including zeros floor(100/3) = 33, excluding = 100.
        let summary = summarize(&[obs(1, 0), obs(2, 0), obs(3, 100)]);
        assert_eq!(summary.sample_count, 3);
        assert_eq!(summary.mean_including_zeros, 33);
        assert_eq!(summary.mean_excluding_zeros, 100);
    }

    #[test]
    fn median_of_single_sample() {
        assert_eq!(summarize(&[obs(1, 10)]).median_excluding_zeros, 10);
    }

    #[test]
    fn median_of_even_count_floors_the_midpoint() {
        let summary = summarize(&[obs(1, 10), obs(2, 30)]);
        assert_eq!(summary.median_excluding_zeros, 20);
    }

    #[test]
    fn median_of_odd_count_is_the_middle_element() {
        let summary = summarize(&[obs(1, 5), obs(2, 10), obs(3, 30)]);
        assert_eq!(summary.median_excluding_zeros, 10);
    }

    #[test]
    fn all_zero_fees_zero_the_nonzero_statistics() {
        let summary = summarize(&[obs(1, 0), obs(2, 0)]);
        assert_eq!(summary.mean_including_zeros, 0);
        assert_eq!(summary.mean_excluding_zeros, 0);
        assert_eq!(summary.median_excluding_zeros, 0);
    }

    #[test]
    fn duplicate_slots_count_as_separate_samples() {
        let summary = summarize(&[obs(42, 10), obs(42, 30), obs(42, 0)]);
        assert_eq!(summary.sample_count, 3);
        assert_eq!(summary.slot_range_start, 42);
        assert_eq!(summary.slot_range_end, 42);
        assert_eq!(summary.mean_including_zeros, 13);
        assert_eq!(summary.median_excluding_zeros, 20);
    }
}
