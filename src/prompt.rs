//! Turns an [`AnalysisContext`] into chat messages for the commentary model.

use crate::context::AnalysisContext;
use crate::render;

const SYSTEM_PROMPT: &str = "You are a concise market analyst. Using only the indicator data provided, \
give a short technical read of the asset: trend, momentum, volatility, and one risk to watch. \
Do not invent data and do not give financial advice.";

const NO_HISTORY: &str = "not enough history";

#[derive(Debug, Clone, PartialEq)]
pub struct ChatPrompt {
    pub system: String,
    pub user: String,
}

pub fn build_prompt(ctx: &AnalysisContext) -> ChatPrompt {
    let mut lines = vec![
        format!("Symbol: {}", ctx.symbol),
        format!("Current price: {}", ctx.current_price),
        format!("Generated at: {}", ctx.generated_at.format("%Y-%m-%d %H:%M:%S UTC")),
    ];

    match &ctx.vegas {
        Some(vegas) => {
            lines.push(format!(
                "Vegas tunnel: EMA12 {:.4}, EMA144 {:.4}, EMA169 {:.4}, trend {}, distance {:+.2}%.",
                vegas.ema12, vegas.ema144, vegas.ema169, vegas.trend, vegas.distance_percent
            ));
            lines.push(render::describe_vegas(vegas));
        }
        None => lines.push(format!("Vegas tunnel: {}.", NO_HISTORY)),
    }

    match &ctx.rsi {
        Some(rsi) => {
            let history: Vec<String> = rsi.history.iter().map(|v| format!("{:.2}", v)).collect();
            lines.push(render::describe_rsi(rsi));
            lines.push(format!("RSI last 10: [{}]", history.join(", ")));
        }
        None => lines.push(format!("RSI: {}.", NO_HISTORY)),
    }

    match &ctx.atr {
        Some(atr) => lines.push(render::describe_atr(atr)),
        None => lines.push(format!("ATR: {}.", NO_HISTORY)),
    }

    if ctx.recent_candles.is_empty() {
        lines.push(format!("Recent candles: {}.", NO_HISTORY));
    } else {
        lines.push(format!("Recent candles (oldest first): {}", ctx.recent_candles));
    }

    ChatPrompt {
        system: SYSTEM_PROMPT.to_string(),
        user: lines.join("\n"),
    }
}
