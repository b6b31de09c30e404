use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

/// Quote used whenever the price service cannot be reached.
pub const FALLBACK_PRICE: MarketPrice = MarketPrice {
    price: 1.56,
    change_pct: 2.22,
};

const PRICE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketPrice {
    /// USD per SUI.
    pub price: f64,
    /// 24-hour change in percent.
    pub change_pct: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ticker {
    last_price: String,
    price_change_percent: String,
}

/// Current SUI/USDT quote from a 24h ticker endpoint.
pub async fn fetch_price(http: &reqwest::Client, url: &str) -> MarketPrice {
    match try_fetch(http, url).await {
        Ok(price) => price,
        Err(e) => {
            warn!("Price lookup failed, using fallback: {}", e);
            FALLBACK_PRICE
        }
    }
}

async fn try_fetch(http: &reqwest::Client, url: &str) -> anyhow::Result<MarketPrice> {
    let body = http
        .get(url)
        .timeout(PRICE_TIMEOUT)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    parse_ticker(&body)
}

fn parse_ticker(body: &str) -> anyhow::Result<MarketPrice> {
    let ticker: Ticker = serde_json::from_str(body)?;
    Ok(MarketPrice {
        price: ticker.last_price.parse()?,
        change_pct: ticker.price_change_percent.parse()?,
    })
}
