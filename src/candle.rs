//! OHLC candle model shared by the fetcher, the indicator engine and the
//! context assembler.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Candle {
    /// Open time in milliseconds since the Unix epoch.
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    pub fn new(time: i64, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
        }
    }

    pub fn is_up(&self) -> bool {
        self.close > self.open
    }

    /// Open-to-close move in percent. Zero when the open is zero.
    pub fn change_percent(&self) -> f64 {
        if self.open == 0.0 {
            return 0.0;
        }
        (self.close - self.open) / self.open * 100.0
    }
}

// Lets candles feed `ta` indicators that need the full bar (ATR).
impl ta::Open for Candle {
    fn open(&self) -> f64 {
        self.open
    }
}

impl ta::High for Candle {
    fn high(&self) -> f64 {
        self.high
    }
}

impl ta::Low for Candle {
    fn low(&self) -> f64 {
        self.low
    }
}

impl ta::Close for Candle {
    fn close(&self) -> f64 {
        self.close
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CandleError {
    #[error("candle at {time} has a non-finite {field}")]
    NonFinite { time: i64, field: &'static str },
    #[error("duplicate candle timestamp {time}")]
    DuplicateTime { time: i64 },
}

/// Stable ascending sort by open time.
pub fn sort_by_time(candles: &mut [Candle]) {
    candles.sort_by_key(|c| c.time);
}

pub fn close_prices(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}

/// Normalises candles coming from an upstream source: sorts them ascending,
/// then rejects non-finite prices and repeated timestamps.
pub fn prepare_candles(mut candles: Vec<Candle>) -> Result<Vec<Candle>, CandleError> {
    sort_by_time(&mut candles);

    for c in &candles {
        let fields = [
            ("open", c.open),
            ("high", c.high),
            ("low", c.low),
            ("close", c.close),
        ];
        if let Some((field, _)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return Err(CandleError::NonFinite {
                time: c.time,
                field: *field,
            });
        }
    }

    if let Some(pair) = candles.windows(2).find(|w| w[0].time == w[1].time) {
        return Err(CandleError::DuplicateTime { time: pair[1].time });
    }

    Ok(candles)
}
