use crate::analysis::{AnalysisReport, OutputData};
use crate::indicators::{Divergence, Trend, Volatility};
use chrono::DateTime;
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ContentArrangement, Table, modifiers::UTF8_ROUND_CORNERS,
    presets::UTF8_BORDERS_ONLY,
};

const MISSING: &str = "n/a";

fn format_timestamp(ts_ms: i64) -> String {
    let seconds = ts_ms.div_euclid(1000);
    let nanoseconds = (ts_ms.rem_euclid(1000) * 1_000_000) as u32;

    if let Some(dt) = DateTime::from_timestamp(seconds, nanoseconds) {
        return dt.format("%d-%m-%Y %H:%M:%S").to_string();
    }
    "Unknown Time".to_string()
}

fn trend_color(trend: Trend) -> Color {
    match trend {
        Trend::Bullish => Color::Green,
        Trend::Bearish => Color::Red,
        Trend::Neutral => Color::DarkGrey,
    }
}

fn header_cell(text: &str) -> Cell {
    Cell::new(text).add_attribute(Attribute::Bold)
}

fn number_cell(text: String) -> Cell {
    Cell::new(text).set_alignment(CellAlignment::Right)
}

fn report_row(report: &AnalysisReport) -> Vec<Cell> {
    let ctx = &report.context;

    let (trend_cell, distance_cell) = match &ctx.vegas {
        Some(v) => (
            Cell::new(v.trend).fg(trend_color(v.trend)),
            number_cell(format!("{:+.2}%", v.distance_percent)),
        ),
        None => (Cell::new(MISSING), number_cell(MISSING.to_string())),
    };

    let (rsi_cell, status_cell, divergence_cell) = match &ctx.rsi {
        Some(r) => {
            let divergence = match r.divergence {
                Divergence::None => Cell::new(r.divergence),
                Divergence::BearishDivergence => Cell::new(r.divergence).fg(Color::Red),
                Divergence::BullishDivergence => Cell::new(r.divergence).fg(Color::Green),
            };
            (number_cell(format!("{:.2}", r.current)), Cell::new(r.status), divergence)
        }
        None => (number_cell(MISSING.to_string()), Cell::new(MISSING), Cell::new(MISSING)),
    };

    let (atr_cell, volatility_cell) = match &ctx.atr {
        Some(a) => {
            let cell = Cell::new(a.volatility);
            let cell = match a.volatility {
                Volatility::High => cell.fg(Color::Yellow),
                Volatility::Low => cell,
            };
            (number_cell(format!("{:.2}%", a.percent)), cell)
        }
        None => (number_cell(MISSING.to_string()), Cell::new(MISSING)),
    };

    vec![
        Cell::new(&ctx.symbol).fg(Color::Cyan),
        number_cell(format!("{}", ctx.current_price)),
        trend_cell,
        distance_cell,
        rsi_cell,
        status_cell,
        divergence_cell,
        atr_cell,
        volatility_cell,
    ]
}

pub fn build_table(reports: &[AnalysisReport]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_BORDERS_ONLY)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            header_cell("Asset"),
            header_cell("Price").set_alignment(CellAlignment::Right),
            header_cell("Vegas Trend"),
            header_cell("Dist. EMA144").set_alignment(CellAlignment::Right),
            header_cell("RSI").set_alignment(CellAlignment::Right),
            header_cell("RSI Status"),
            header_cell("Divergence"),
            header_cell("ATR %").set_alignment(CellAlignment::Right),
            header_cell("Volatility"),
        ]);

    for report in reports {
        table.add_row(report_row(report));
    }
    table
}

pub fn print_reports(data: &OutputData) {
    if data.reports.is_empty() {
        println!("No data found.");
        return;
    }

    let title = format!("(Data taken at {} UTC)", format_timestamp(data.last_updated_timestamp));
    println!("\n{}\n{}", title, build_table(&data.reports));

    for report in &data.reports {
        if let Some(text) = &report.commentary {
            println!("\n{}\n{}", report.context.symbol, text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candle::Candle;
    use crate::context::generate_analysis_context;
    use crate::indicators::IndicatorPeriods;

    fn report(len: usize) -> AnalysisReport {
        let candles: Vec<Candle> = (0..len)
            .map(|i| {
                let close = 100.0 + i as f64;
                Candle::new(i as i64, close - 0.5, close + 1.0, close - 1.0, close)
            })
            .collect();
        AnalysisReport {
            context: generate_analysis_context(&candles, "BTCUSDT", &IndicatorPeriods::default()),
            commentary: None,
        }
    }

    #[test]
    fn one_row_per_report() {
        let table = build_table(&[report(200), report(10)]);
        assert_eq!(table.row_iter().count(), 2);
    }

    #[test]
    fn missing_indicators_render_placeholder() {
        let rendered = build_table(&[report(10)]).to_string();
        assert!(rendered.contains("BTCUSDT"));
        assert!(rendered.contains(MISSING));
    }

    #[test]
    fn full_report_shows_trend() {
        let rendered = build_table(&[report(200)]).to_string();
        assert!(rendered.contains("BULLISH"));
        assert!(rendered.contains("overbought"));
    }

    #[test]
    fn timestamp_format() {
        assert_eq!(format_timestamp(0), "01-01-1970 00:00:00");
    }
}
