use crate::candle::Candle;
use serde::{Deserialize, Serialize};
use ta::Next;
use ta::indicators::{AverageTrueRange, ExponentialMovingAverage};

pub const DEFAULT_RSI_PERIOD: usize = 14;
pub const DEFAULT_ATR_PERIOD: usize = 14;

const VEGAS_FAST: usize = 12;
const VEGAS_TUNNEL_TOP: usize = 144;
const VEGAS_TUNNEL_BOTTOM: usize = 169;

// RSI needs this many bars beyond its period before a reading is produced.
const RSI_WARMUP: usize = 10;
const RSI_HISTORY_LEN: usize = 10;
const DIVERGENCE_LOOKBACK: usize = 5;

const HIGH_VOLATILITY_PERCENT: f64 = 3.0;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct IndicatorPeriods {
    pub rsi_period: usize,
    pub atr_period: usize,
}

impl Default for IndicatorPeriods {
    fn default() -> Self {
        Self {
            rsi_period: DEFAULT_RSI_PERIOD,
            atr_period: DEFAULT_ATR_PERIOD,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trend {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct VegasTunnel {
    pub ema12: f64,
    pub ema144: f64,
    pub ema169: f64,
    pub trend: Trend,
    /// Offset of the latest close from the 144 EMA, in percent.
    pub distance_percent: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RsiStatus {
    Overbought,
    Oversold,
    /// 50..=70
    Bullish,
    /// 30..50
    Bearish,
}

impl RsiStatus {
    pub fn from_value(rsi: f64) -> Self {
        if rsi > 70.0 {
            RsiStatus::Overbought
        } else if rsi < 30.0 {
            RsiStatus::Oversold
        } else if rsi >= 50.0 {
            RsiStatus::Bullish
        } else {
            RsiStatus::Bearish
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Divergence {
    None,
    BearishDivergence,
    BullishDivergence,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RsiReading {
    pub current: f64,
    pub history: Vec<f64>,
    pub status: RsiStatus,
    pub divergence: Divergence,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Volatility {
    High,
    Low,
}

impl Volatility {
    pub fn from_percent(percent: f64) -> Self {
        if percent > HIGH_VOLATILITY_PERCENT {
            Volatility::High
        } else {
            Volatility::Low
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AtrReading {
    pub value: f64,
    /// ATR as a percentage of the latest close.
    pub percent: f64,
    pub volatility: Volatility,
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn last_ema(closes: &[f64], period: usize) -> Option<f64> {
    let mut ema = ExponentialMovingAverage::new(period).ok()?;
    closes.iter().map(|&price| ema.next(price)).last()
}

/// EMA 12/144/169 over the close series. `None` below 169 closes.
pub fn calculate_vegas_tunnel(closes: &[f64]) -> Option<VegasTunnel> {
    if closes.len() < VEGAS_TUNNEL_BOTTOM {
        return None;
    }

    let price = *closes.last()?;
    let ema12 = last_ema(closes, VEGAS_FAST)?;
    let ema144 = last_ema(closes, VEGAS_TUNNEL_TOP)?;
    let ema169 = last_ema(closes, VEGAS_TUNNEL_BOTTOM)?;

    // Bullish is tested against the tunnel top (144), bearish against the
    // tunnel bottom (169).
    let trend = if price > ema144 && ema12 > ema144 {
        Trend::Bullish
    } else if price < ema169 && ema12 < ema169 {
        Trend::Bearish
    } else {
        Trend::Neutral
    };

    let distance_percent = round2((price - ema144) / ema144 * 100.0);

    Some(VegasTunnel {
        ema12,
        ema144,
        ema169,
        trend,
        distance_percent,
    })
}

/// RSI over the whole close series plus a fixed five-bar divergence check.
/// `None` when there are fewer than `period + 10` closes.
///
/// Gains and losses are the close-to-close changes from the second close on,
/// each smoothed by an EMA of `period`, so the result does not depend on the
/// price scale.
pub fn calculate_rsi(closes: &[f64], period: usize) -> Option<RsiReading> {
    let mut gains = ExponentialMovingAverage::new(period).ok()?;
    let mut losses = ExponentialMovingAverage::new(period).ok()?;

    if closes.len() < period + RSI_WARMUP {
        return None;
    }

    // series[i] is the RSI at closes[i + 1]
    let series: Vec<f64> = closes
        .windows(2)
        .map(|w| {
            let change = w[1] - w[0];
            let up = gains.next(change.max(0.0));
            let down = losses.next((-change).max(0.0));
            if up + down == 0.0 {
                50.0
            } else {
                100.0 * up / (up + down)
            }
        })
        .collect();

    let last = series.len() - 1;
    let back = last - DIVERGENCE_LOOKBACK;
    let price_now = closes[last + 1];
    let price_back = closes[back + 1];
    let current = series[last];

    let divergence = if price_now > price_back && series[last] < series[back] {
        Divergence::BearishDivergence
    } else if price_now < price_back && series[last] > series[back] {
        Divergence::BullishDivergence
    } else {
        Divergence::None
    };

    let history = series[series.len() - RSI_HISTORY_LEN..]
        .iter()
        .map(|&v| round2(v))
        .collect();

    Some(RsiReading {
        current,
        history,
        status: RsiStatus::from_value(current),
        divergence,
    })
}

/// Average true range of the candles, also expressed against the last close.
pub fn calculate_atr(candles: &[Candle], period: usize) -> Option<AtrReading> {
    let mut atr = AverageTrueRange::new(period).ok()?;

    if candles.len() < period {
        return None;
    }

    let value = candles.iter().map(|c| atr.next(c)).last()?;
    let close = candles.last()?.close;
    let percent = if close == 0.0 { 0.0 } else { value / close * 100.0 };

    Some(AtrReading {
        value,
        percent,
        volatility: Volatility::from_percent(percent),
    })
}
