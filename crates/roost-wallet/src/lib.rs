//! Wallet collaborator: custodial Sui key generation, balance lookups,
//! transfers over the fullnode JSON-RPC API, and the SUI market price.

pub mod keys;
pub mod market;
pub mod rpc;

use async_trait::async_trait;
use tracing::info;

pub use keys::WalletKeys;
pub use market::MarketPrice;

use crate::rpc::SuiRpcClient;

pub const MIST_PER_SUI: f64 = 1_000_000_000.0;

#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("key generation failed: {0}")]
    KeyGen(String),
    #[error("invalid private key")]
    InvalidKey,
    #[error("rpc transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("unexpected rpc response: {0}")]
    Decode(String),
    #[error("no SUI coins to spend")]
    NoCoins,
    #[error("transaction failed: {0}")]
    Rejected(String),
}

/// Everything the application needs from a chain. Implemented by
/// `SuiWallet`; tests substitute their own.
#[async_trait]
pub trait WalletService: Send + Sync {
    /// Fresh keypair, address and mnemonic.
    fn generate(&self) -> Result<WalletKeys, WalletError>;

    /// Balance in SUI.
    async fn balance(&self, address: &str) -> Result<f64, WalletError>;

    /// Send `amount_sui` from the wallet behind `private_key` to
    /// `recipient`. Returns the transaction digest.
    async fn transfer(
        &self,
        private_key: &str,
        recipient: &str,
        amount_sui: f64,
    ) -> Result<String, WalletError>;

    /// Never fails; falls back to a fixed quote.
    async fn market_price(&self) -> MarketPrice;
}

pub struct SuiWallet {
    rpc: SuiRpcClient,
    http: reqwest::Client,
    price_url: String,
}

impl SuiWallet {
    pub fn new(rpc_url: &str, price_url: &str) -> Self {
        let http = reqwest::Client::new();
        Self {
            rpc: SuiRpcClient::new(http.clone(), rpc_url),
            http,
            price_url: price_url.to_string(),
        }
    }
}

#[async_trait]
impl WalletService for SuiWallet {
    fn generate(&self) -> Result<WalletKeys, WalletError> {
        keys::generate_wallet()
    }

    async fn balance(&self, address: &str) -> Result<f64, WalletError> {
        let mist = self.rpc.get_balance(address).await?;
        Ok(mist as f64 / MIST_PER_SUI)
    }

    async fn transfer(
        &self,
        private_key: &str,
        recipient: &str,
        amount_sui: f64,
    ) -> Result<String, WalletError> {
        let signer = keys::decode_private_key(private_key)?;
        let sender = keys::address_of(&signer.verifying_key());
        let amount = mist_from_sui(amount_sui);

        let digest = self.rpc.pay_sui(&signer, &sender, recipient, amount).await?;
        info!("Transferred {} MIST from {} to {} ({})", amount, sender, recipient, digest);
        Ok(digest)
    }

    async fn market_price(&self) -> MarketPrice {
        market::fetch_price(&self.http, &self.price_url).await
    }
}

pub fn mist_from_sui(amount_sui: f64) -> u64 {
    (amount_sui * MIST_PER_SUI).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_sui_to_mist() {
        assert_eq!(mist_from_sui(1.0), 1_000_000_000);
        assert_eq!(mist_from_sui(0.1), 100_000_000);
        assert_eq!(mist_from_sui(0.0), 0);
    }
}
