use solana_sdk::signature::Keypair;
use url::Url;

use crate::errors::SenderError;

pub static PROJECT_NAME: &str = "solana-priority-sender";

/// Writable account the fee sampler defaults to when the caller gives none:
/// the Jupiter v6 aggregator program, a reliably congested account.
pub static DEFAULT_FEE_ACCOUNT: &str = "JUP6LkbZbjS1jKKwapdHNy74zcZ3tLUZoi5QNyVTaV4";

/// Fallback priority fee rate in micro-lamports per compute unit, used when
/// sampling yields no non-zero observations.
pub const DEFAULT_PRIORITY_RATE: u64 = 25_000;

pub fn get_env(key: &str) -> String {
    std::env::var(key).unwrap_or(String::from(""))
}

/// Connection and signing material, resolved from process configuration
/// before either component runs. Missing or malformed required values fail
/// here, before any network call.
#[derive(Debug, Clone)]
pub struct Env {
    pub rpc_url: String,
    pub wss_rpc_url: Option<String>,
    pub private_key: String,
}

impl Env {
    pub fn load() -> Result<Self, SenderError> {
        let rpc_url = require_env("SOLANA_RPC")?;
        Url::parse(&rpc_url).map_err(|e| SenderError::Config {
            variable: String::from("SOLANA_RPC"),
            reason: e.to_string(),
        })?;

        let wss_rpc_url = Some(get_env("SOLANA_WSS")).filter(|v| !v.is_empty());
        let private_key = require_env("PRIVATE_KEY")?;

        Ok(Env {
            rpc_url,
            wss_rpc_url,
            private_key,
        })
    }

    /// Decode the configured base58 secret into a signing keypair.
    pub fn keypair(&self) -> Result<Keypair, SenderError> {
        decode_keypair(&self.private_key)
    }
}

fn require_env(key: &str) -> Result<String, SenderError> {
    let value = get_env(key);
    if value.is_empty() {
        return Err(SenderError::Config {
            variable: key.to_string(),
            reason: String::from("not set"),
        });
    }
    Ok(value)
}

pub fn decode_keypair(encoded: &str) -> Result<Keypair, SenderError> {
    let bytes = bs58::decode(encoded)
        .into_vec()
        .map_err(|e| SenderError::Signing {
            reason: format!("private key is not valid base58: {}", e),
        })?;
    Keypair::from_bytes(&bytes).map_err(|e| SenderError::Signing {
        reason: format!("private key bytes rejected: {}", e),
    })
}
