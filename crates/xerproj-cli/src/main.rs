//! xerproj CLI
//!
//! Command-line front end exercising the core end to end: detect format,
//! parse an XER (or MS-Project XML) export, run the CPM forward/backward
//! pass, and evaluate the schedule-quality analyzer. `anyhow` sits at the
//! edges, `tracing-subscriber` drives structured logs, and every subcommand
//! supports text or JSON output. There is no Gantt/rendering surface here;
//! that belongs to the view layer, not this core.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use xerproj_core::{CollectingEmitter, Diagnostic, Schedule};
use xerproj_solver::analysis::{self, AnalysisReport};

#[derive(Parser)]
#[command(name = "xerproj")]
#[command(author, version, about = "XER import, CPM scheduling, and DCMA-style quality analysis", long_about = None)]
struct Cli {
    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, ValueEnum, PartialEq, Eq)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect format, parse the file, and report entity counts and diagnostics.
    Parse {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Parse and run the CPM forward/backward pass; print per-task dates and float.
    Schedule {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Parse, schedule, and run the full quality analyzer.
    Analyze {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Float-bucket threshold in days (high vs. near-critical).
        #[arg(long, default_value_t = analysis::DEFAULT_FLOAT_THRESHOLD_DAYS)]
        float_threshold_days: i64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Parse { file, format } => run_parse(&file, format),
        Commands::Schedule { file, format } => run_schedule(&file, format),
        Commands::Analyze {
            file,
            format,
            float_threshold_days,
        } => run_analyze(&file, format, float_threshold_days),
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn read_file(file: &PathBuf) -> Result<Vec<u8>> {
    fs::read(file).with_context(|| format!("reading {}", file.display()))
}

fn parse_with_diagnostics(file: &PathBuf) -> Result<(Schedule, CollectingEmitter)> {
    let bytes = read_file(file)?;
    let (result, emitter) = xerproj_parser::parse_bytes_with_diagnostics(&bytes);
    let schedule = result.with_context(|| format!("parsing {}", file.display()))?;
    Ok((schedule, emitter))
}

fn scheduled(file: &PathBuf) -> Result<(Schedule, CollectingEmitter)> {
    let (mut schedule, mut emitter) = parse_with_diagnostics(file)?;
    xerproj_solver::cpm::run(&mut schedule, &mut emitter);
    Ok((schedule, emitter))
}

// ---------------------------------------------------------------------
// parse
// ---------------------------------------------------------------------

fn run_parse(file: &PathBuf, format: OutputFormat) -> Result<()> {
    let (schedule, emitter) = parse_with_diagnostics(file)?;

    match format {
        OutputFormat::Json => {
            let payload = serde_json::json!({
                "schedule": schedule,
                "diagnostics": emitter.diagnostics,
            });
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        OutputFormat::Text => {
            println!("Project:              {} ({})", schedule.project.name, schedule.project.id);
            println!("WBS elements:         {}", schedule.wbs_elements.len());
            println!("Tasks:                {}", schedule.tasks.len());
            println!("Relationships:        {}", schedule.relationships.len());
            println!("Resources:            {}", schedule.resources.len());
            println!("Resource assignments: {}", schedule.assignments.len());
            println!("Calendars:            {}", schedule.calendars.len());
            println!("Activity code types:  {}", schedule.activity_code_types.len());
            print_diagnostics(&emitter.diagnostics);
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------
// schedule
// ---------------------------------------------------------------------

fn run_schedule(file: &PathBuf, format: OutputFormat) -> Result<()> {
    let (schedule, emitter) = scheduled(file)?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&schedule)?);
        }
        OutputFormat::Text => {
            let mut views: Vec<_> = schedule.task_views().collect();
            views.sort_by(|a, b| a.task.id.cmp(&b.task.id));

            println!(
                "{:<10} {:<24} {:>14} {:>14} {:>14} {:>14} {:>8} {:<8}",
                "ID", "CODE", "ES", "EE", "LS", "LF", "FLOAT", "CRIT"
            );
            for view in &views {
                let Some(computed) = view.computed else { continue };
                println!(
                    "{:<10} {:<24} {:>14} {:>14} {:>14} {:>14} {:>8.1} {:<8}",
                    view.task.id,
                    truncate(&view.task.task_code, 24),
                    computed.early_start_seconds,
                    computed.early_end_seconds,
                    computed.late_start_seconds,
                    computed.late_end_seconds,
                    computed.total_float_hours,
                    if computed.is_critical() { "yes" } else { "" },
                );
            }
            print_diagnostics(&emitter.diagnostics);
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------
// analyze
// ---------------------------------------------------------------------

fn run_analyze(file: &PathBuf, format: OutputFormat, float_threshold_days: i64) -> Result<()> {
    let (schedule, emitter) = scheduled(file)?;
    let report = analysis::analyze_with_float_threshold(&schedule, float_threshold_days);

    match format {
        OutputFormat::Json => {
            let payload = serde_json::json!({
                "report": report,
                "diagnostics": emitter.diagnostics,
            });
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        OutputFormat::Text => {
            print_analysis_text(&report);
            print_diagnostics(&emitter.diagnostics);
        }
    }

    Ok(())
}

fn print_analysis_text(report: &AnalysisReport) {
    println!("== Critical Path ==");
    println!("Tasks on critical path: {}", report.critical_path.tasks.len());
    println!("Total critical duration: {} day(s)", report.critical_path.total_duration_days);
    for entry in &report.critical_path.tasks {
        println!("  {:<10} {:<30} float={:.1}h", entry.task_id, truncate(&entry.name, 30), entry.total_float_hours);
    }
    println!();

    println!("== Float Distribution (threshold {} day(s)) ==", report.float_buckets.threshold_days);
    println!("High float:     {}", report.float_buckets.high_float.len());
    println!("Near critical:  {}", report.float_buckets.near_critical.len());
    println!("Negative float: {}", report.float_buckets.negative_float.len());
    println!("Average float:  {:.2}h", report.float_buckets.average_float_hours);
    println!();

    println!("== Logic Check ==");
    println!("Open starts:             {}", report.logic_check.open_starts.len());
    println!("Open ends:                {}", report.logic_check.open_ends.len());
    println!("Dangling relationships:   {}", report.logic_check.dangling_relationships.len());
    println!();

    println!("== Resource Loading ==");
    for load in &report.resource_loading.resources {
        println!(
            "  {:<10} {:<24} qty={:<10.1} assignments={:<4} over_allocated={}",
            load.resource_id,
            truncate(&load.name, 24),
            load.total_target_quantity,
            load.assignment_count,
            load.over_allocated
        );
    }
    println!();

    println!("== DCMA Panel ({} of {} passed, score {:.1}) ==", report.dcma_panel.passed_count, report.dcma_panel.total_count, report.dcma_panel.overall_score);
    for check in &report.dcma_panel.checks {
        let actual = match check.actual {
            analysis::CheckValue::Percentage(p) => format!("{p:.1}%"),
            analysis::CheckValue::Ratio(r) => format!("{r:.2}"),
            analysis::CheckValue::Count(c) => c.to_string(),
            analysis::CheckValue::NotApplicable => "N/A".to_string(),
        };
        println!(
            "  [{}] {:<22} actual={:<10} threshold={}",
            if check.passed { "PASS" } else { "FAIL" },
            check.name,
            actual,
            check.threshold
        );
    }
}

fn print_diagnostics(diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }
    println!();
    println!("Diagnostics ({}):", diagnostics.len());
    for diagnostic in diagnostics {
        let context = diagnostic.context.as_deref().unwrap_or("-");
        println!("  [{:?}] {} ({}): {}", diagnostic.severity, diagnostic.code.as_str(), context, diagnostic.message);
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max.saturating_sub(1)).collect::<String>() + "…"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_leaves_short_strings_untouched() {
        assert_eq!(truncate("short", 10), "short");
    }

    #[test]
    fn truncate_shortens_long_strings_with_ellipsis() {
        let truncated = truncate("a very long task name indeed", 10);
        assert_eq!(truncated.chars().count(), 10);
        assert!(truncated.ends_with('…'));
    }
}
