//! Assembles the per-symbol analysis handed to the prompt builder and the
//! report table.

use crate::candle::{self, Candle};
use crate::indicators::{self, AtrReading, IndicatorPeriods, RsiReading, VegasTunnel};
use crate::render;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AnalysisContext {
    pub symbol: String,
    pub current_price: f64,
    pub vegas: Option<VegasTunnel>,
    pub rsi: Option<RsiReading>,
    pub atr: Option<AtrReading>,
    pub recent_candles: String,
    pub generated_at: DateTime<Utc>,
}

pub fn generate_analysis_context(
    candles: &[Candle],
    symbol: &str,
    periods: &IndicatorPeriods,
) -> AnalysisContext {
    generate_analysis_context_at(candles, symbol, periods, Utc::now())
}

/// Same as [`generate_analysis_context`] with a caller-supplied timestamp.
/// Each indicator is `None` on its own when the history is too short.
pub fn generate_analysis_context_at(
    candles: &[Candle],
    symbol: &str,
    periods: &IndicatorPeriods,
    generated_at: DateTime<Utc>,
) -> AnalysisContext {
    let mut sorted = candles.to_vec();
    candle::sort_by_time(&mut sorted);

    let closes = candle::close_prices(&sorted);
    let current_price = closes.last().copied().unwrap_or(0.0);

    AnalysisContext {
        symbol: symbol.to_string(),
        current_price,
        vegas: indicators::calculate_vegas_tunnel(&closes),
        rsi: indicators::calculate_rsi(&closes, periods.rsi_period),
        atr: indicators::calculate_atr(&sorted, periods.atr_period),
        recent_candles: render::summarize_recent_candles(&sorted),
        generated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::Trend;

    fn ramp(len: usize) -> Vec<Candle> {
        (0..len)
            .map(|i| {
                let close = 100.0 + i as f64;
                Candle::new(i as i64 * 60_000, close - 0.5, close + 1.0, close - 1.0, close)
            })
            .collect()
    }

    #[test]
    fn descending_input_matches_ascending() {
        let now = Utc::now();
        let periods = IndicatorPeriods::default();
        let ascending = ramp(200);
        let mut descending = ascending.clone();
        descending.reverse();

        let a = generate_analysis_context_at(&ascending, "BTCUSDT", &periods, now);
        let d = generate_analysis_context_at(&descending, "BTCUSDT", &periods, now);
        assert_eq!(a, d);
        assert_eq!(a.current_price, 299.0);
    }

    #[test]
    fn short_history_keeps_partial_results() {
        let ctx = generate_analysis_context(&ramp(20), "ETHUSDT", &IndicatorPeriods::default());
        assert_eq!(ctx.symbol, "ETHUSDT");
        assert_eq!(ctx.current_price, 119.0);
        assert!(ctx.vegas.is_none());
        assert!(ctx.rsi.is_none());
        assert!(ctx.atr.is_some());
        assert!(!ctx.recent_candles.is_empty());
    }

    #[test]
    fn empty_input_is_not_an_error() {
        let ctx = generate_analysis_context(&[], "SOLUSDT", &IndicatorPeriods::default());
        assert_eq!(ctx.current_price, 0.0);
        assert!(ctx.vegas.is_none() && ctx.rsi.is_none() && ctx.atr.is_none());
        assert_eq!(ctx.recent_candles, "");
    }

    #[test]
    fn full_history_fills_every_indicator() {
        let ctx = generate_analysis_context(&ramp(200), "BTCUSDT", &IndicatorPeriods::default());
        assert_eq!(ctx.vegas.unwrap().trend, Trend::Bullish);
        assert!(ctx.rsi.unwrap().current > 70.0);
        assert!(ctx.atr.is_some());
    }

    #[test]
    fn serializes_indicator_tags() {
        let ctx = generate_analysis_context(&ramp(200), "BTCUSDT", &IndicatorPeriods::default());
        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(json["vegas"]["trend"], "BULLISH");
        assert_eq!(json["rsi"]["status"], "OVERBOUGHT");
        assert_eq!(json["rsi"]["divergence"], "NONE");
    }
}
