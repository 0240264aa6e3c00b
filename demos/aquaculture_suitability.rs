//! Aquaculture suitability walkthrough.
//!
//! Runs the steps configured in a TOML file:
//! - Population totals per state from a city table
//! - Mean SST in Celsius from yearly Kelvin layers
//! - SST and NPP windows combined and clipped to an EEZ
//!
//! Usage: `cargo run --example aquaculture_suitability -- demos/aquaculture.toml`
//!
//! Set `RUST_LOG=debug` for per-step detail.

use aquaspatial::logging::init_logging;
use aquaspatial::pipeline::{run, PipelineConfig};

fn main() {
    init_logging("info");

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "demos/aquaculture.toml".to_string());

    println!("Aquaculture Suitability");
    println!("=======================");
    println!("Config: {}", path);
    println!();

    let config = match PipelineConfig::from_file(&path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    };

    let report = match run(&config) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    if let Some(totals) = &report.region_totals {
        println!("Region totals");
        println!("-------------");
        for sum in &totals.sums {
            println!("  {:<24} {:>14.0} ({} points)", sum.group, sum.sum, sum.count);
        }
        println!("  {:<24} {:>14.0}", "total", totals.grand_total());
        println!("  Unmatched points: {}", totals.unmatched);
        println!();
    }

    if let Some(outcome) = &report.suitability {
        println!("Mean SST (Celsius)");
        println!("------------------");
        println!("{}", outcome.sst_celsius.statistics());
        println!();
        println!("Suitable cells: {}", outcome.suitable_cells);
        println!("{}", outcome.suitability.statistics());
    }
}
