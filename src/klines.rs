use crate::candle::{self, Candle, CandleError};
use crate::storage_utils::KlineConfig;
use anyhow::Result;
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::de::{self, IgnoredAny, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::sync::LazyLock;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("rate limited by the exchange (banned until {until_ms:?})")]
    RateLimited { until_ms: Option<u64> },
    #[error("unexpected HTTP status {0}")]
    Status(StatusCode),
    #[error("malformed kline payload: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] CandleError),
}

// --- Binance row decoding ---
// A kline row is a 12-element array; prices arrive as strings.

struct LenientF64Visitor;

impl<'de> Visitor<'de> for LenientF64Visitor {
    type Value = f64;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a float, an integer, or a string representing a number")
    }

    fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E> {
        Ok(v)
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E> {
        Ok(v as f64)
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
        Ok(v as f64)
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        v.trim().parse::<f64>().map_err(E::custom)
    }
}

struct LenientF64(f64);

impl<'de> Deserialize<'de> for LenientF64 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(LenientF64Visitor).map(LenientF64)
    }
}

struct KlineRowVisitor;

impl<'de> Visitor<'de> for KlineRowVisitor {
    type Value = Candle;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a kline array [openTime, open, high, low, close, ...]")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let time: i64 = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;
        let mut prices = [0.0; 4];
        for (i, slot) in prices.iter_mut().enumerate() {
            let LenientF64(v) = seq
                .next_element()?
                .ok_or_else(|| de::Error::invalid_length(i + 1, &self))?;
            *slot = v;
        }
        // volume, closeTime, quoteAssetVolume, ...
        while seq.next_element::<IgnoredAny>()?.is_some() {}

        let [open, high, low, close] = prices;
        Ok(Candle::new(time, open, high, low, close))
    }
}

struct KlineRow(Candle);

impl<'de> Deserialize<'de> for KlineRow {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_seq(KlineRowVisitor).map(KlineRow)
    }
}

/// Decodes a klines response body into sorted, validated candles.
pub fn parse_klines(body: &str) -> Result<Vec<Candle>, FetchError> {
    let rows: Vec<KlineRow> = serde_json::from_str(body)?;
    let candles = rows.into_iter().map(|KlineRow(c)| c).collect();
    Ok(candle::prepare_candles(candles)?)
}

static BAN_UNTIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"until\s+(\d+)").expect("ban-until pattern is valid"));

/// Pulls the ban expiry out of a `-1003` error body ("... banned until 1700000000000 ...").
pub fn parse_ban_until(body: &str) -> Option<u64> {
    if !body.contains("-1003") {
        return None;
    }
    BAN_UNTIL.captures(body)?.get(1)?.as_str().parse().ok()
}

/// Maps a non-success kline response to its error; `None` for 2xx.
pub fn classify_status(status: StatusCode, body: &str) -> Option<FetchError> {
    if status.is_success() {
        return None;
    }
    if status == StatusCode::IM_A_TEAPOT || status == StatusCode::TOO_MANY_REQUESTS {
        return Some(FetchError::RateLimited {
            until_ms: parse_ban_until(body),
        });
    }
    Some(FetchError::Status(status))
}

pub fn calculate_request_weight(limit: u32) -> u32 {
    match limit {
        0..=99 => 1,
        100..=499 => 2,
        500..=1000 => 5,
        _ => 10,
    }
}

/// Requests per batch, keeping 10% headroom on the per-minute weight budget.
pub fn batch_size(weight_limit: u32, limit: u32) -> usize {
    let safe_capacity = (weight_limit as f64 * 0.90) as u32;
    std::cmp::max(1, safe_capacity / calculate_request_weight(limit)) as usize
}

pub async fn fetch_candles(
    client: &Client,
    config: &KlineConfig,
    symbol: &str,
) -> Result<Vec<Candle>, FetchError> {
    let url = format!("{}{}", config.base_url.trim_end_matches('/'), config.path);
    let query = [
        ("symbol", symbol.to_string()),
        ("interval", config.interval.clone()),
        ("limit", config.limit.to_string()),
    ];

    let response = client.get(&url).query(&query).send().await?;
    let status = response.status();
    let body = response.text().await?;

    if let Some(err) = classify_status(status, &body) {
        return Err(err);
    }
    parse_klines(&body)
}

/// Fetches every symbol in weight-sized concurrent batches. Symbols that
/// fail are logged and left out of the result.
pub async fn fetch_all(config: &KlineConfig, symbols: &[String]) -> Result<Vec<(String, Vec<Candle>)>> {
    let client = Client::builder().pool_max_idle_per_host(50).build()?;
    let batch_size = batch_size(config.request_weight_limit, config.limit);

    let mut all_results = Vec::with_capacity(symbols.len());

    for (i, batch) in symbols.chunks(batch_size).enumerate() {
        let start_time = Instant::now();
        debug!(batch = i, size = batch.len(), "fetching kline batch");

        let tasks: Vec<_> = batch
            .iter()
            .map(|symbol| fetch_candles(&client, config, symbol))
            .collect();
        let results = futures::future::join_all(tasks).await;

        let mut ban_until: Option<u64> = None;
        for (symbol, result) in batch.iter().zip(results) {
            match result {
                Ok(candles) => {
                    info!(%symbol, candles = candles.len(), "klines fetched");
                    all_results.push((symbol.clone(), candles));
                }
                Err(FetchError::RateLimited { until_ms }) => {
                    warn!(%symbol, ?until_ms, "rate limited, skipping");
                    ban_until = ban_until.max(until_ms);
                }
                Err(e) => warn!(%symbol, error = %e, "failed to fetch klines"),
            }
        }

        if let Some(until) = ban_until {
            let now = chrono::Utc::now().timestamp_millis().max(0) as u64;
            if until > now {
                let wait_sec = ((until - now) as f64 / 1000.0) + 5.0;
                warn!(wait_sec, "waiting out exchange ban");
                tokio::time::sleep(Duration::from_secs_f64(wait_sec)).await;
            }
        }

        if i * batch_size + batch.len() < symbols.len() {
            let elapsed = start_time.elapsed();
            if elapsed.as_secs() < 60 {
                let wait = Duration::from_secs(62) - elapsed;
                tokio::time::sleep(wait).await;
            }
        }
    }

    Ok(all_results)
}
