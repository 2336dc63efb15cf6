use std::fs;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};

use race_event_report::assets::AssetLayout;
use race_event_report::config::RunConfig;
use race_event_report::report::{Report, ReportContext, RunSummary};
use race_event_report::{
    event_report, logging, milestone_report, showdown_report, success, tournament_report,
};

const COMBINED_OUTPUT: &str = "allparser_output.txt";

type Phase = fn(&Path, &ReportContext) -> Result<Report>;

const PHASES: [(&str, Phase); 4] = [
    ("EventDataParser", event_report::run),
    ("MilestoneDataParser", milestone_report::run),
    ("ShowdownParser", showdown_report::run),
    ("TournamentParser", tournament_report::run),
];

fn main() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let started = Instant::now();
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let config = RunConfig::load(&args);
    logging::init(config.debug);

    if let Err(err) = run(&config) {
        log::error!("{err:#}");
    }
    log::info!("Total Processing Time: {}s", started.elapsed().as_secs());
}

fn run(config: &RunConfig) -> Result<()> {
    let layout = AssetLayout::new(&config.asset_dir);
    log::info!("Reading assets from {}", layout.root.display());
    let ctx = ReportContext::load(&layout, config);

    let mut summary = RunSummary::default();
    let mut combined = Vec::new();
    for (name, phase) in PHASES {
        let Some(report) = run_phase(name, || phase(&layout.text_dir, &ctx)) else {
            continue;
        };
        if !report.text.is_empty() {
            println!("{}", report.text.console());
            combined.push(format!("=== {name} Output ===\n{}\n", report.text.plain()));
        }
        summary.merge(report.summary);
    }

    if ctx.crdb {
        summary.missing_translations.clear();
    }
    if !summary.is_empty() {
        println!();
        println!("{}", summary.render().console());
    }

    if combined.is_empty() {
        log::warn!("No report output produced");
        return Ok(());
    }
    let path = layout.root.join(COMBINED_OUTPUT);
    fs::write(&path, combined.join("\n"))
        .with_context(|| format!("failed to write combined output to {}", path.display()))?;
    success!("Combined output written to {}", path.display());
    Ok(())
}

/// Runs one report phase; a failure is logged and only skips that phase.
fn run_phase(name: &str, phase: impl FnOnce() -> Result<Report>) -> Option<Report> {
    log::info!("Running {name}");
    match phase() {
        Ok(report) => {
            success!("{name} completed");
            Some(report)
        }
        Err(err) => {
            log::error!("{name} failed: {err:#}");
            None
        }
    }
}
