//! This module contains the core analysis pipeline logic.

use crate::candle::Candle;
use crate::context::{AnalysisContext, generate_analysis_context};
use crate::indicators::IndicatorPeriods;
use crate::klines;
use crate::llm::LlmClient;
use crate::prompt::build_prompt;
use crate::storage_utils::{AppConfig, AsyncStorageManager};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    pub context: AnalysisContext,
    pub commentary: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OutputData {
    /// Open time of the newest candle seen across all symbols (ms).
    pub last_updated_timestamp: i64,
    pub reports: Vec<AnalysisReport>,
}

/// Builds one context per fetched symbol, keeping the input order.
pub fn analyze_symbols(fetched: &[(String, Vec<Candle>)], periods: &IndicatorPeriods) -> OutputData {
    let mut reports = Vec::with_capacity(fetched.len());
    let mut max_time = 0;

    for (symbol, candles) in fetched {
        if let Some(last) = candles.iter().map(|c| c.time).max() {
            max_time = max_time.max(last);
        }
        reports.push(AnalysisReport {
            context: generate_analysis_context(candles, symbol, periods),
            commentary: None,
        });
    }

    OutputData {
        last_updated_timestamp: max_time,
        reports,
    }
}

/// Asks the model for commentary on every report concurrently. A failed
/// request leaves that report's commentary empty.
pub async fn attach_commentary(client: &LlmClient, reports: &mut [AnalysisReport]) {
    let tasks: Vec<_> = reports
        .iter()
        .map(|r| {
            let prompt = build_prompt(&r.context);
            async move { client.commentary(&prompt).await }
        })
        .collect();
    let results = futures::future::join_all(tasks).await;

    for (report, result) in reports.iter_mut().zip(results) {
        match result {
            Ok(text) => report.commentary = Some(text),
            Err(e) => warn!(symbol = %report.context.symbol, error = %e, "commentary failed"),
        }
    }
}

/// Runs the full analysis pipeline:
/// 1. Fetches the kline (candlestick) data for each configured symbol.
/// 2. Builds the indicator context per symbol.
/// 3. Optionally asks the LLM for commentary.
/// 4. Saves the reports to `analysis.json`.
pub async fn run_analysis_pipeline(storage: &AsyncStorageManager, config: &AppConfig) -> Result<OutputData> {
    // Step 1: Download Candles
    let fetched = klines::fetch_all(&config.klines, &config.symbols).await?;
    info!(symbols = fetched.len(), "klines ready");

    // Step 2: Compute indicators
    let mut output = analyze_symbols(&fetched, &config.indicators);

    // Step 3: Commentary
    match &config.llm {
        Some(llm_config) => {
            let client = LlmClient::new(llm_config.clone())?;
            attach_commentary(&client, &mut output.reports).await;
        }
        None => info!("no llm section in config, skipping commentary"),
    }

    // Step 4: Persist
    storage.save("analysis", &output).await?;
    Ok(output)
}
