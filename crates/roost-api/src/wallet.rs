use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::{error, info, warn};

use roost_crypto::open_secret;
use roost_db::NotificationKind;
use roost_types::api::{
    RevealKeysRequest, TipRequest, TransferRequest, TransferResponse, WalletKeysResponse,
};
use roost_types::models::WalletSummary;

use crate::auth::verify_password;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::users::resolve_user;
use crate::{AppState, blocking, offload};

/// Balance and quote for `address`. A failed balance lookup reads as zero.
pub(crate) async fn wallet_summary(state: &AppState, address: String) -> WalletSummary {
    let balance = state.wallet.balance(&address).await.unwrap_or_else(|e| {
        warn!("Balance lookup for {} failed: {}", address, e);
        0.0
    });
    let quote = state.wallet.market_price().await;

    WalletSummary {
        address,
        balance,
        price: quote.price,
        price_change_pct: quote.change_pct,
        holdings_value: balance * quote.price,
    }
}

pub async fn summary(
    State(state): State<AppState>,
    Extension(me): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let user = blocking(&state, move |s| {
        s.get_user_by_id(me.id)?.ok_or(ApiError::NotFound("user"))
    })
    .await?;
    Ok(Json(wallet_summary(&state, user.wallet_address).await))
}

pub async fn transfer(
    State(state): State<AppState>,
    Extension(me): Extension<CurrentUser>,
    Json(req): Json<TransferRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_amount(req.amount)?;
    if !req.destination.starts_with("0x") {
        return Err(ApiError::bad_request("invalid SUI address"));
    }

    let digest = send_from(&state, me.id, &req.destination, req.amount).await?;
    info!("@{} sent {} SUI to {} ({})", me.username, req.amount, req.destination, digest);
    Ok(Json(TransferResponse { digest }))
}

/// Pay another user's wallet and let them know.
pub async fn tip(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(me): Extension<CurrentUser>,
    Json(req): Json<TipRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_amount(req.amount)?;

    let target = blocking(&state, move |s| resolve_user(s, &username)).await?;
    if target.id == me.id {
        return Err(ApiError::bad_request("you cannot tip yourself"));
    }

    let digest = send_from(&state, me.id, &target.wallet_address, req.amount).await?;

    info!("@{} tipped @{} {} SUI ({})", me.username, target.username, req.amount, digest);

    // The SUI has moved; a failed notification must not read as a failed tip
    let (recipient, actor) = (target.id, me.id);
    if let Err(e) =
        blocking(&state, move |s| Ok(s.notify(recipient, actor, NotificationKind::Tip)?)).await
    {
        error!("Tip {} succeeded but notifying @{} failed: {}", digest, target.username, e);
    }

    Ok(Json(TransferResponse { digest }))
}

/// Show the custodial keys after the password is entered again.
pub async fn reveal_keys(
    State(state): State<AppState>,
    Extension(me): Extension<CurrentUser>,
    Json(req): Json<RevealKeysRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (password_hash, secrets) = blocking(&state, move |s| {
        let user = s.get_user_by_id(me.id)?.ok_or(ApiError::NotFound("user"))?;
        let secrets = s.wallet_secrets(me.id)?.ok_or(ApiError::NotFound("wallet"))?;
        Ok((user.password_hash, secrets))
    })
    .await?;
    if !offload(move || Ok(verify_password(&req.password, &password_hash))).await? {
        return Err(ApiError::Unauthorized);
    }

    warn!("Wallet keys revealed for @{}", me.username);
    Ok(Json(WalletKeysResponse {
        address: secrets.wallet_address,
        private_key: open_secret(&state.sealing_key, &secrets.private_key)?,
        mnemonic: open_secret(&state.sealing_key, &secrets.mnemonic)?,
    }))
}

async fn send_from(
    state: &AppState,
    user_id: i64,
    destination: &str,
    amount: f64,
) -> Result<String, ApiError> {
    let secrets = blocking(state, move |s| {
        s.wallet_secrets(user_id)?.ok_or(ApiError::NotFound("wallet"))
    })
    .await?;
    let private_key = open_secret(&state.sealing_key, &secrets.private_key)?;

    Ok(state.wallet.transfer(&private_key, destination, amount).await?)
}

fn validate_amount(amount: f64) -> Result<(), ApiError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ApiError::bad_request("amount must be positive"));
    }
    Ok(())
}
