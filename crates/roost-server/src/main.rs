use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use roost_api::uploads::{POST_IMAGE_DIR, PROFILE_PIC_DIR};
use roost_api::{AppState, AppStateInner};
use roost_crypto::SealingKey;
use roost_db::Database;
use roost_wallet::SuiWallet;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

/// Used when RUST_LOG is unset. Names every roost crate that logs.
const DEFAULT_LOG_FILTER: &str =
    "roost=debug,roost_api=debug,roost_db=debug,roost_wallet=debug,tower_http=debug";

const DEFAULT_SUI_RPC_URL: &str = "https://fullnode.mainnet.sui.io:443";
const DEFAULT_PRICE_URL: &str = "https://api.binance.com/api/v3/ticker/24hr?symbol=SUIUSDT";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .init();

    // Config
    let jwt_secret = std::env::var("ROOST_JWT_SECRET").unwrap_or_default();
    if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
        eprintln!("FATAL: ROOST_JWT_SECRET is unset or still a placeholder.");
        eprintln!("       Set it in your .env file and restart.");
        std::process::exit(1);
    }

    let Ok(wallet_key) = std::env::var("ROOST_WALLET_KEY") else {
        eprintln!("FATAL: ROOST_WALLET_KEY is unset.");
        eprintln!("       It seals custodial wallet keys and must never change once set.");
        eprintln!("       A fresh key: ROOST_WALLET_KEY={}", SealingKey::generate().to_base64());
        std::process::exit(1);
    };
    let sealing_key = SealingKey::from_base64(&wallet_key)?;

    let host = std::env::var("ROOST_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("ROOST_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let db_path: PathBuf = std::env::var("ROOST_DB_PATH")
        .unwrap_or_else(|_| "roost.db".into())
        .into();
    let upload_dir: PathBuf = std::env::var("ROOST_UPLOAD_DIR")
        .unwrap_or_else(|_| "uploads".into())
        .into();
    let rpc_url = std::env::var("ROOST_SUI_RPC_URL").unwrap_or_else(|_| DEFAULT_SUI_RPC_URL.into());
    let price_url = std::env::var("ROOST_PRICE_URL").unwrap_or_else(|_| DEFAULT_PRICE_URL.into());
    let session_days: i64 = std::env::var("ROOST_SESSION_DAYS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(7);

    // Init database and upload storage
    let db = Database::open(&db_path)?;
    for subdir in [PROFILE_PIC_DIR, POST_IMAGE_DIR] {
        tokio::fs::create_dir_all(upload_dir.join(subdir)).await?;
    }

    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret,
        session_days,
        sealing_key,
        wallet: Arc::new(SuiWallet::new(&rpc_url, &price_url)),
        upload_dir,
    });

    let app = roost_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Roost server listening on {} (chain: {})", addr, rpc_url);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
