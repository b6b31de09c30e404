use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use blake2::Digest;
use ed25519_dalek::{Signer, SigningKey};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::WalletError;
use crate::keys::{Blake2b256, ED25519_FLAG};

const SUI_COIN_TYPE: &str = "0x2::sui::SUI";
const GAS_BUDGET_MIST: u64 = 5_000_000;
/// TransactionData intent: scope 0, version 0, app id 0.
const TX_INTENT: [u8; 3] = [0, 0, 0];

/// Thin JSON-RPC 2.0 client for a Sui fullnode.
pub struct SuiRpcClient {
    http: reqwest::Client,
    url: String,
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Balance {
    total_balance: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CoinPage {
    data: Vec<Coin>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Coin {
    coin_object_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TxBytes {
    tx_bytes: String,
}

#[derive(Deserialize)]
struct ExecutedTx {
    digest: String,
    effects: Option<Effects>,
}

#[derive(Deserialize)]
struct Effects {
    status: ExecutionStatus,
}

#[derive(Deserialize)]
struct ExecutionStatus {
    status: String,
    error: Option<String>,
}

impl SuiRpcClient {
    pub fn new(http: reqwest::Client, url: &str) -> Self {
        Self {
            http,
            url: url.to_string(),
        }
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, WalletError> {
        debug!("Sui RPC {}", method);
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response: RpcResponse = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(err) = response.error {
            warn!("Sui RPC {} failed: {} {}", method, err.code, err.message);
            return Err(WalletError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        let result = response
            .result
            .ok_or_else(|| WalletError::Decode(format!("{method}: missing result")))?;
        serde_json::from_value(result).map_err(|e| WalletError::Decode(format!("{method}: {e}")))
    }

    /// Total SUI balance in MIST.
    pub async fn get_balance(&self, address: &str) -> Result<u64, WalletError> {
        let balance: Balance = self
            .call("suix_getBalance", json!([address, SUI_COIN_TYPE]))
            .await?;
        balance
            .total_balance
            .parse()
            .map_err(|_| WalletError::Decode(format!("balance: {}", balance.total_balance)))
    }

    /// Build, sign and execute a SUI payment of `amount` MIST.
    pub async fn pay_sui(
        &self,
        signer: &SigningKey,
        sender: &str,
        recipient: &str,
        amount: u64,
    ) -> Result<String, WalletError> {
        let coins: CoinPage = self
            .call("suix_getCoins", json!([sender, SUI_COIN_TYPE, null, null]))
            .await?;
        if coins.data.is_empty() {
            return Err(WalletError::NoCoins);
        }
        let coin_ids: Vec<String> = coins.data.into_iter().map(|c| c.coin_object_id).collect();

        let unsigned: TxBytes = self
            .call(
                "unsafe_paySui",
                json!([
                    sender,
                    coin_ids,
                    [recipient],
                    [amount.to_string()],
                    GAS_BUDGET_MIST.to_string(),
                ]),
            )
            .await?;
        let tx_bytes = BASE64
            .decode(&unsigned.tx_bytes)
            .map_err(|e| WalletError::Decode(format!("txBytes: {e}")))?;

        let signature = sign_transaction(signer, &tx_bytes);

        let executed: ExecutedTx = self
            .call(
                "sui_executeTransactionBlock",
                json!([
                    unsigned.tx_bytes,
                    [signature],
                    { "showEffects": true },
                    "WaitForLocalExecution",
                ]),
            )
            .await?;

        match executed.effects {
            Some(effects) if effects.status.status != "success" => Err(WalletError::Rejected(
                effects
                    .status
                    .error
                    .unwrap_or_else(|| effects.status.status.clone()),
            )),
            _ => Ok(executed.digest),
        }
    }
}

/// Serialized signature: base64(flag || signature || public key) over
/// blake2b-256(intent || tx bytes).
pub(crate) fn sign_transaction(signer: &SigningKey, tx_bytes: &[u8]) -> String {
    let mut hasher = Blake2b256::new();
    hasher.update(TX_INTENT);
    hasher.update(tx_bytes);
    let digest = hasher.finalize();

    let signature = signer.sign(&digest);

    let mut out = Vec::with_capacity(1 + 64 + 32);
    out.push(ED25519_FLAG);
    out.extend_from_slice(&signature.to_bytes());
    out.extend_from_slice(signer.verifying_key().as_bytes());
    BASE64.encode(out)
}
