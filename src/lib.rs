//! Technical-indicator analysis for crypto assets: Vegas tunnel, RSI with
//! divergence, ATR, and the context object built from them for LLM
//! commentary.

pub mod analysis;
pub mod candle;
pub mod comfy_table;
pub mod context;
pub mod indicators;
pub mod klines;
pub mod llm;
pub mod prompt;
pub mod render;
pub mod storage_utils;

#[cfg(test)]
mod test_support;

pub use candle::Candle;
pub use context::{AnalysisContext, generate_analysis_context, generate_analysis_context_at};
pub use indicators::{IndicatorPeriods, calculate_atr, calculate_rsi, calculate_vegas_tunnel};
