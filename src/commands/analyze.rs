//! Analyze command implementation

use anyhow::Result;
use std::path::Path;
use stop_calibrator::{analysis, Config};
use tracing::{info, warn};

pub fn run(config_path: Option<String>, file: String) -> Result<()> {
    let config = Config::load(config_path.as_deref())?;
    config.validate()?;

    let path = Path::new(&file);
    info!("Analyzing {}", path.display());

    let report = match analysis::analyze_file(path, &config) {
        Ok(report) => report,
        Err(reason) => {
            warn!("{} skipped: {}", path.display(), reason);
            println!("{}: {}", path.display(), reason);
            return Ok(());
        }
    };

    println!("\n{}", "=".repeat(60));
    println!("INSTRUMENT {}", report.instrument);
    println!("{}", "=".repeat(60));
    println!("Bars:               {}", report.bars);
    println!("Valid indices:      {}", report.valid_indices);
    println!("Price-band entries: {}", report.candidates);
    println!("Coefficient pool:   {}", report.pool_size);
    println!("Evaluated entries:  {}", report.entries);
    println!("Stop coefficient:   {:.4} ({})", report.coefficient, report.selection);
    println!(
        "Avg buying power:   {:.2} (target {:.0}..{:.0}, risk {})",
        report.avg_buying_power, config.bp_min, config.bp_max, config.risk_per_trade
    );
    println!("{}", "-".repeat(60));
    println!("{:>8} {:>14} {:>16}", "Ratio", "TP (ATR)", "Avg duration");
    for summary in &report.ratios {
        println!(
            "{:>7.1}x {:>14.4} {:>16.2}",
            summary.ratio, summary.take_profit, summary.avg_duration
        );
    }
    println!("{}", "=".repeat(60));

    Ok(())
}
