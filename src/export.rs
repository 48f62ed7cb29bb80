//! Tabular export of trading signals.
//!
//! Every format writes the same `(date, close, signal)` rows, capped at the
//! most recent [`MAX_SIGNALS`] entries.

use std::io::{BufWriter, Write};

use chrono::NaiveDate;
use clap::ValueEnum;
use error_stack::{Report, ResultExt};
use serde::Serialize;

use crate::error::ExportError;
use crate::model::Signal;
use crate::strategy::MAX_SIGNALS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

/// One exported row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalRow {
    pub date: NaiveDate,
    pub close: f64,
    pub signal: String,
}

impl From<&Signal> for SignalRow {
    fn from(signal: &Signal) -> Self {
        Self {
            date: signal.date,
            close: signal.close,
            signal: signal.label.to_string(),
        }
    }
}

pub fn rows(signals: &[Signal]) -> Vec<SignalRow> {
    let start = signals.len().saturating_sub(MAX_SIGNALS);
    signals[start..].iter().map(SignalRow::from).collect()
}

pub fn export_signals<W: Write>(
    signals: &[Signal],
    format: ExportFormat,
    writer: W,
) -> Result<(), Report<ExportError>> {
    let rows = rows(signals);
    let mut writer = BufWriter::new(writer);
    match format {
        ExportFormat::Csv => write_csv(&rows, &mut writer)?,
        ExportFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, &rows)
                .change_context(ExportError::Serialize)?;
            writeln!(writer).change_context(ExportError::Write)?;
        }
    }
    writer.flush().change_context(ExportError::Write)?;
    Ok(())
}

fn write_csv<W: Write>(rows: &[SignalRow], writer: &mut W) -> Result<(), Report<ExportError>> {
    writeln!(writer, "Date,Close,Signal").change_context(ExportError::Write)?;
    for row in rows {
        writeln!(
            writer,
            "{},{},{}",
            row.date.format("%Y-%m-%d"),
            row.close,
            csv_field(&row.signal)
        )
        .change_context(ExportError::Write)
        .attach_with(|| format!("date: {}", row.date))?;
    }
    Ok(())
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicator::test_support::day;
    use crate::model::SignalLabel;

    fn signal(offset: usize, close: f64, label: SignalLabel) -> Signal {
        Signal {
            date: day(offset),
            close,
            label,
        }
    }

    #[test]
    fn csv_has_header_and_rows() {
        let signals = vec![
            signal(0, 1.1036, SignalLabel::StochasticSell),
            signal(1, 1.094, SignalLabel::IchimokuBuy),
        ];
        let mut out = Vec::new();
        export_signals(&signals, ExportFormat::Csv, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Date,Close,Signal\n\
             2024-01-01,1.1036,SELL (Stochastic)\n\
             2024-01-02,1.094,BUY (Ichimoku trend)\n"
        );
    }

    #[test]
    fn json_rows_carry_date_close_signal() {
        let signals = vec![signal(4, 1.25, SignalLabel::BollingerRebound)];
        let mut out = Vec::new();
        export_signals(&signals, ExportFormat::Json, &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(
            value,
            serde_json::json!([
                {"date": "2024-01-05", "close": 1.25, "signal": "BUY (Bollinger rebound)"}
            ])
        );
    }

    #[test]
    fn export_is_capped_to_most_recent_rows() {
        let signals: Vec<Signal> = (0..70)
            .map(|i| signal(i, 1.0, SignalLabel::IchimokuSell))
            .collect();
        let rows = rows(&signals);
        assert_eq!(rows.len(), MAX_SIGNALS);
        assert_eq!(rows[0].date, day(20));
    }

    #[test]
    fn csv_field_quotes_separators() {
        assert_eq!(csv_field("BUY (Stochastic)"), "BUY (Stochastic)");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
