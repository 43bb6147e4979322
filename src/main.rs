// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

use track_record_dashboard::{
    aggregate, filter, load_comparison_store, load_standard_set, FilterCriteria,
};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() > 1 && args[1] == "summary" {
        // Summary mode: print the metric block and exit
        let json = args.iter().any(|a| a == "--json");
        let data_dir = args
            .iter()
            .skip(2)
            .find(|a| !a.starts_with("--"))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        run_summary(&data_dir, json)
    } else {
        // Dashboard mode (default)
        let data_dir = args
            .get(1)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        run_dashboard(&data_dir)
    }
}

fn run_summary(data_dir: &Path, json: bool) -> Result<()> {
    let store = load_comparison_store(data_dir)?;

    let criteria = FilterCriteria::all_of(&store);
    let subset = filter(&store, &criteria);
    let summary = aggregate::summary(&store, &subset);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let optional = |value: Option<usize>| match value {
        Some(count) => count.to_string(),
        None => "N/A".to_string(),
    };

    println!("Track Record Comparison - Summary");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Total records:                      {}", summary.total_records);
    println!("Average mark:                       {}", summary.mean_mark.format(2));
    println!(
        "Average probability (world record): {}",
        summary.mean_probability.format(4)
    );
    println!(
        "Predicted world record breakers:    {}",
        summary.predicted_world_record_breakers
    );
    println!(
        "Actual world record breakers:       {}",
        summary.actual_world_record_breakers
    );
    println!(
        "World record prediction accuracy:   {}%",
        summary.world_record_accuracy.format(1)
    );
    println!(
        "Predicted national record breakers: {}",
        optional(summary.predicted_national_record_breakers)
    );
    println!(
        "Actual national record breakers:    {}",
        optional(summary.actual_national_record_breakers)
    );
    println!(
        "Predicted personal best breakers:   {}",
        optional(summary.predicted_personal_best_breakers)
    );
    println!(
        "Actual personal best breakers:      {}",
        optional(summary.actual_personal_best_breakers)
    );

    Ok(())
}

#[cfg(feature = "tui")]
fn run_dashboard(data_dir: &Path) -> Result<()> {
    println!("📊 Loading comparison dataset...");
    let store = load_comparison_store(data_dir)?;
    println!("✓ Loaded {} records", store.len());

    println!("📂 Loading top-10 reference tables...");
    let tables =
        load_standard_set(data_dir).context("Failed to load top-10 reference tables")?;
    println!("✓ Loaded {} tables", tables.len());

    println!("Starting UI... (Press 'q' to quit)\n");

    let mut app = ui::App::new(store, tables);
    ui::run_ui(&mut app)?;

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_dashboard(_data_dir: &Path) -> Result<()> {
    eprintln!("TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or print metrics with: track-record-dashboard summary");
    std::process::exit(1);
}
