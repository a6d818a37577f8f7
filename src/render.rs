//! Human-readable text for indicator results. The indicator records only
//! carry numbers and tags; everything a person reads is produced here.

use crate::candle::Candle;
use crate::indicators::{AtrReading, Divergence, RsiReading, RsiStatus, Trend, VegasTunnel, Volatility};
use std::fmt;

pub const RECENT_CANDLES: usize = 5;

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Trend::Bullish => "BULLISH",
            Trend::Bearish => "BEARISH",
            Trend::Neutral => "NEUTRAL",
        })
    }
}

impl fmt::Display for RsiStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            RsiStatus::Overbought => "overbought",
            RsiStatus::Oversold => "oversold",
            RsiStatus::Bullish => "healthy, bullish-leaning",
            RsiStatus::Bearish => "weak, bearish-leaning",
        })
    }
}

impl fmt::Display for Divergence {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Divergence::None => "none",
            Divergence::BearishDivergence => "bearish divergence",
            Divergence::BullishDivergence => "bullish divergence",
        })
    }
}

impl fmt::Display for Volatility {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Volatility::High => "high volatility",
            Volatility::Low => "low volatility",
        })
    }
}

pub fn describe_vegas(tunnel: &VegasTunnel) -> String {
    match tunnel.trend {
        Trend::Bullish => format!(
            "Price and EMA12 are above the Vegas tunnel (EMA144 {:.4}); uptrend, {:+.2}% from the tunnel top.",
            tunnel.ema144, tunnel.distance_percent
        ),
        Trend::Bearish => format!(
            "Price and EMA12 are below the Vegas tunnel (EMA169 {:.4}); downtrend, {:+.2}% from the tunnel top.",
            tunnel.ema169, tunnel.distance_percent
        ),
        Trend::Neutral => format!(
            "Price is inside or crossing the Vegas tunnel (EMA144 {:.4} / EMA169 {:.4}); no clear trend.",
            tunnel.ema144, tunnel.ema169
        ),
    }
}

pub fn describe_divergence(divergence: Divergence) -> &'static str {
    match divergence {
        Divergence::None => "No divergence between price and RSI over the last 5 bars.",
        Divergence::BearishDivergence => {
            "Bearish divergence: price made a higher close than 5 bars ago while RSI fell. Upside momentum is fading."
        }
        Divergence::BullishDivergence => {
            "Bullish divergence: price made a lower close than 5 bars ago while RSI rose. Downside momentum is fading."
        }
    }
}

pub fn describe_rsi(rsi: &RsiReading) -> String {
    format!("RSI {:.2} ({}). {}", rsi.current, rsi.status, describe_divergence(rsi.divergence))
}

pub fn describe_atr(atr: &AtrReading) -> String {
    let regime = match atr.volatility {
        Volatility::High => "high volatility, favour trend-following",
        Volatility::Low => "low volatility, favour range-trading",
    };
    format!("ATR {:.4} ({:.2}% of price): {}.", atr.value, atr.percent, regime)
}

/// One entry per candle among the last five, oldest first, e.g.
/// `up candle (+1.25%), down candle (-0.40%)`.
pub fn summarize_recent_candles(candles: &[Candle]) -> String {
    let start = candles.len().saturating_sub(RECENT_CANDLES);
    candles[start..]
        .iter()
        .map(|c| {
            let kind = if c.is_up() { "up candle" } else { "down candle" };
            format!("{} ({:+.2}%)", kind, c.change_percent())
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_covers_last_five_oldest_first() {
        let candles: Vec<Candle> = (0..7)
            .map(|i| {
                let open = 100.0;
                let close = if i % 2 == 0 { 101.0 } else { 99.5 };
                Candle::new(i, open, 102.0, 99.0, close)
            })
            .collect();
        assert_eq!(
            summarize_recent_candles(&candles),
            "up candle (+1.00%), down candle (-0.50%), up candle (+1.00%), down candle (-0.50%), up candle (+1.00%)"
        );
    }

    #[test]
    fn summary_of_short_input() {
        let candles = vec![Candle::new(1, 10.0, 10.0, 10.0, 10.0)];
        assert_eq!(summarize_recent_candles(&candles), "down candle (+0.00%)");
        assert_eq!(summarize_recent_candles(&[]), "");
    }

    #[test]
    fn atr_text_names_the_regime() {
        let atr = AtrReading {
            value: 4.0,
            percent: 4.0,
            volatility: Volatility::High,
        };
        assert!(describe_atr(&atr).contains("high volatility"));
    }

    #[test]
    fn status_labels() {
        assert_eq!(RsiStatus::Bullish.to_string(), "healthy, bullish-leaning");
        assert_eq!(Divergence::BearishDivergence.to_string(), "bearish divergence");
        assert_eq!(Trend::Neutral.to_string(), "NEUTRAL");
    }
}
