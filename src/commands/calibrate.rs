//! Calibrate command implementation with progress tracking

use anyhow::{bail, Result};
use indicatif::{ProgressBar, ProgressStyle};
use stop_calibrator::report::{self, ResultTable};
use stop_calibrator::{analysis, data, Config, InstrumentOutcome};
use tracing::{info, warn};

pub fn run(
    config_path: Option<String>,
    data_dir_override: Option<String>,
    output_override: Option<String>,
    extension_override: Option<String>,
) -> Result<()> {
    info!("Starting calibration");

    let mut config = Config::load(config_path.as_deref())?;

    if let Some(dir) = data_dir_override {
        info!("Overriding data directory to: {}", dir);
        config.data_dir = dir;
    }
    if let Some(output) = output_override {
        info!("Overriding output path to: {}", output);
        config.output_path = output;
    }
    if let Some(extension) = extension_override {
        info!("Overriding file extension to: {}", extension);
        config.extension = extension;
    }
    config.validate()?;

    let files = data::discover_instruments(&config.data_dir, &config.extension)?;
    if files.is_empty() {
        bail!(
            "No input files found in {} (*.{})",
            config.data_dir,
            config.extension
        );
    }

    println!("\n{}", "=".repeat(70));
    println!("ATR STOP CALIBRATION");
    println!("{}", "=".repeat(70));
    println!("  Instruments:       {}", files.len());
    println!("  ATR period:        {}", config.atr_period);
    println!("  Horizon:           {} bars", config.horizon);
    println!(
        "  Target BP:         {:.0}..{:.0} at risk {}",
        config.bp_min, config.bp_max, config.risk_per_trade
    );
    println!("  Take-profit ratios: {:?}", config.take_profit_ratios);
    println!("{}\n", "=".repeat(70));

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("⚡ {percent:>3}%|{bar:40}| {pos}/{len} [{elapsed}<{eta}] ✓ {msg}")?
            .progress_chars("█░ "),
    );
    pb.set_message("starting...");
    pb.tick();

    let total = files.len();
    let mut outcomes = Vec::with_capacity(total);

    for (i, path) in files.iter().enumerate() {
        let outcome = analysis::process_file(path, &config);

        match &outcome {
            InstrumentOutcome::Analyzed(report) => info!(
                "{}: coef_sl={:.4} bp={:.2} ({}, {} entries)",
                report.instrument,
                report.coefficient,
                report.avg_buying_power,
                report.selection,
                report.entries
            ),
            InstrumentOutcome::Skipped { instrument, reason } => {
                warn!("{}: skipped, {}", instrument, reason)
            }
        }

        pb.println(format!(
            "[{}/{}] Processing {}... {}",
            i + 1,
            total,
            outcome.instrument(),
            report::outcome_line(&outcome)
        ));
        pb.inc(1);
        outcomes.push(outcome);
    }

    let reports: Vec<_> = outcomes
        .into_iter()
        .filter_map(|o| match o {
            InstrumentOutcome::Analyzed(report) => Some(report),
            InstrumentOutcome::Skipped { .. } => None,
        })
        .collect();
    let skipped = total - reports.len();

    pb.finish_with_message(format!("{} analyzed, {} skipped", reports.len(), skipped));
    println!();

    if reports.is_empty() {
        println!("No results generated.");
        info!("No results generated; no output written");
        return Ok(());
    }

    let table = ResultTable::new(reports, &config);
    table.write_csv(&config.output_path)?;

    println!("{}", "=".repeat(120));
    println!("SUMMARY (stop coefficient + buying power + durations per take-profit ratio)");
    println!("{}", "=".repeat(120));
    println!("{}", table.render());
    println!("{}", "=".repeat(120));
    println!("\nResults saved to: {}", config.output_path);
    println!("Total instruments analyzed: {}", table.len());

    info!(
        "Calibration complete: {} analyzed, {} skipped",
        table.len(),
        skipped
    );

    Ok(())
}
