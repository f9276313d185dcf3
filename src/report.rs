//! Result table assembly, CSV output and console rendering

use anyhow::{Context, Result};
use itertools::Itertools;
use ordered_float::OrderedFloat;
use std::path::Path;
use tracing::info;

use crate::{Config, InstrumentOutcome, InstrumentReport};

/// Successful instrument reports, sorted by the reference ratio's duration
#[derive(Debug, Clone)]
pub struct ResultTable {
    ratios: Vec<f64>,
    risk_per_trade: f64,
    rows: Vec<InstrumentReport>,
}

impl ResultTable {
    /// Build the table; rows are sorted ascending (stable) by the average
    /// duration of `config.reference_ratio`
    pub fn new(mut rows: Vec<InstrumentReport>, config: &Config) -> Self {
        let reference = config.reference_ratio;
        rows.sort_by_key(|r| OrderedFloat(r.avg_duration_for(reference).unwrap_or(f64::INFINITY)));

        ResultTable {
            ratios: config.take_profit_ratios.clone(),
            risk_per_trade: config.risk_per_trade,
            rows,
        }
    }

    pub fn rows(&self) -> &[InstrumentReport] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column names: instrument, coefficient, buying power, then a take-profit
    /// and an average-duration column per ratio
    pub fn headers(&self) -> Vec<String> {
        let mut headers = vec![
            "Instrument".to_string(),
            "Coef_SL".to_string(),
            format!("BP_Risk_{}", self.risk_per_trade),
        ];
        for ratio in &self.ratios {
            headers.push(format!("TP_{:.1}x", ratio));
            headers.push(format!("Dur_Avg_{:.1}x", ratio));
        }
        headers
    }

    fn row_values(&self, report: &InstrumentReport) -> Vec<f64> {
        let mut values = vec![report.coefficient, report.avg_buying_power];
        for ratio in &self.ratios {
            let summary = report
                .ratios
                .iter()
                .find(|s| (s.ratio - ratio).abs() < f64::EPSILON);
            values.push(summary.map_or(f64::NAN, |s| s.take_profit));
            values.push(summary.map_or(f64::NAN, |s| s.avg_duration));
        }
        values
    }

    /// Write the table as CSV, creating parent directories
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let mut writer = csv::Writer::from_path(path).context("Failed to create output file")?;
        writer.write_record(self.headers())?;

        for report in &self.rows {
            let mut record = vec![report.instrument.clone()];
            record.extend(self.row_values(report).iter().map(|v| v.to_string()));
            writer.write_record(&record)?;
        }

        writer.flush().context("Failed to flush output file")?;
        info!("Wrote {} rows to {}", self.rows.len(), path.display());
        Ok(())
    }

    /// Fixed-width text rendering with four decimals
    pub fn render(&self) -> String {
        let headers = self.headers();
        let body: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|report| {
                std::iter::once(report.instrument.clone())
                    .chain(self.row_values(report).iter().map(|v| format!("{:.4}", v)))
                    .collect()
            })
            .collect();

        let widths: Vec<usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                body.iter()
                    .map(|row| row[i].len())
                    .chain(std::iter::once(h.len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let format_row = |cells: &[String]| {
            cells
                .iter()
                .zip(&widths)
                .enumerate()
                .map(|(i, (cell, &w))| {
                    if i == 0 {
                        format!("{:<w$}", cell, w = w)
                    } else {
                        format!("{:>w$}", cell, w = w)
                    }
                })
                .join("  ")
        };

        let mut out = format_row(headers.as_slice());
        for row in &body {
            out.push('\n');
            out.push_str(&format_row(row.as_slice()));
        }
        out
    }
}

/// One-line console summary of an instrument outcome
pub fn outcome_line(outcome: &InstrumentOutcome) -> String {
    match outcome {
        InstrumentOutcome::Analyzed(report) => {
            let durations = report
                .ratios
                .iter()
                .map(|r| format!("{:.1}x={:.1}", r.ratio, r.avg_duration))
                .join(", ");
            format!(
                "OK coef_sl={:.4} | BP={:.0} | Dur: {}",
                report.coefficient, report.avg_buying_power, durations
            )
        }
        InstrumentOutcome::Skipped { reason, .. } => format!("SKIPPED: {}", reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RatioSummary, Selection, SkipReason};

    fn report(name: &str, coef: f64, durations: [f64; 3]) -> InstrumentReport {
        InstrumentReport {
            instrument: name.to_string(),
            coefficient: coef,
            avg_buying_power: 1300.0,
            selection: Selection::InRange,
            bars: 1000,
            valid_indices: 900,
            candidates: 800,
            pool_size: 500,
            entries: 500,
            ratios: [1.0, 1.5, 2.0]
                .iter()
                .zip(durations)
                .map(|(&ratio, avg_duration)| RatioSummary {
                    ratio,
                    take_profit: ratio * coef,
                    avg_duration,
                })
                .collect(),
        }
    }

    #[test]
    fn test_rows_sorted_by_reference_duration() {
        let rows = vec![
            report("SLOW", 2.0, [3.0, 5.0, 9.0]),
            report("FAST", 1.0, [1.0, 2.0, 3.0]),
            report("MID", 1.5, [9.0, 9.0, 4.0]),
        ];
        let table = ResultTable::new(rows, &Config::default());
        let names: Vec<&str> = table.rows().iter().map(|r| r.instrument.as_str()).collect();
        assert_eq!(names, vec!["FAST", "MID", "SLOW"]);
    }

    #[test]
    fn test_headers() {
        let table = ResultTable::new(vec![], &Config::default());
        assert_eq!(
            table.headers(),
            vec![
                "Instrument",
                "Coef_SL",
                "BP_Risk_100",
                "TP_1.0x",
                "Dur_Avg_1.0x",
                "TP_1.5x",
                "Dur_Avg_1.5x",
                "TP_2.0x",
                "Dur_Avg_2.0x",
            ]
        );
        assert!(table.is_empty());
    }

    #[test]
    fn test_write_csv_round_trip_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.csv");
        let table = ResultTable::new(vec![report("AAA", 2.0, [1.0, 2.0, 3.0])], &Config::default());
        table.write_csv(&path).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.len(), 9);
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(&row[0], "AAA");
        assert_eq!(row[1].parse::<f64>().unwrap(), 2.0);
        assert_eq!(row[7].parse::<f64>().unwrap(), 4.0);
        assert_eq!(row[8].parse::<f64>().unwrap(), 3.0);
    }

    #[test]
    fn test_render_aligns_columns() {
        let table = ResultTable::new(
            vec![report("A", 1.0, [1.0, 2.0, 3.0]), report("LONGNAME", 2.0, [1.0, 2.0, 4.0])],
            &Config::default(),
        );
        let rendered = table.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| l.len() == lines[0].len()));
        assert!(lines[1].contains("1.0000"));
    }

    #[test]
    fn test_outcome_lines() {
        let ok = InstrumentOutcome::Analyzed(report("AAA", 1.25, [2.0, 3.5, 4.3]));
        assert_eq!(
            outcome_line(&ok),
            "OK coef_sl=1.2500 | BP=1300 | Dur: 1.0x=2.0, 1.5x=3.5, 2.0x=4.3"
        );

        let skipped = InstrumentOutcome::Skipped {
            instrument: "BBB".to_string(),
            reason: SkipReason::NoStopCoefficients,
        };
        assert_eq!(
            outcome_line(&skipped),
            "SKIPPED: no positive stop coefficients generated"
        );
    }
}
