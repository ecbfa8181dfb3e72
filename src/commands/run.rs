//! `filerec run` - one batch recommendation run

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use filerec_core::config::RecommenderConfig;
use filerec_core::error::Result;
use filerec_core::job::{JobReport, RecommendationJob};
use filerec_core::predict::RankedItem;
use filerec_core::source::scan_dir;
use filerec_core::store::{MemoryStore, RecommendationStore, SqliteStore};
use serde_json::json;

use super::inputs::{load_groups, load_ratings, GroupsInput};
use crate::cli::{Cli, OutputFormat};

pub struct RunArgs<'a> {
    pub files: &'a Path,
    pub ratings: &'a Path,
    pub groups: Option<&'a Path>,
    pub db: Option<&'a Path>,
    pub owner: &'a str,
    pub if_due: bool,
}

/// Execute the run command
pub fn execute(cli: &Cli, config: &RecommenderConfig, args: &RunArgs) -> Result<()> {
    let mut store: Box<dyn RecommendationStore> = match args.db {
        Some(path) => Box::new(SqliteStore::open(path)?),
        None => Box::new(MemoryStore::new()),
    };

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
        tracing::warn!(error = %e, "Could not install interrupt handler");
    }
    let job = RecommendationJob::new(config).with_interrupt(interrupted);

    let now = Utc::now();
    if args.if_due && !job.is_due(&*store, now)? {
        tracing::info!("Recompute interval has not passed; skipping run");
        return output_skipped(cli);
    }

    let files = scan_dir(args.files, args.owner)?;
    let ratings = load_ratings(args.ratings, args.files, config, now)?;
    let groups = match args.groups {
        Some(path) => load_groups(path)?,
        None => GroupsInput::default(),
    };
    for weight in &groups.weights {
        store.put_group_weight(weight)?;
    }

    let report = job.run(&files, &ratings, &groups.memberships, &mut *store)?;

    let mut recommendations = BTreeMap::new();
    for user in &report.users {
        recommendations.insert(user.clone(), store.recommendations(user)?);
    }

    match cli.format {
        OutputFormat::Human => output_human(cli, &report, &recommendations),
        OutputFormat::Json => output_json(&report, &recommendations)?,
    }
    Ok(())
}

fn output_skipped(cli: &Cli) -> Result<()> {
    match cli.format {
        OutputFormat::Human => {
            if !cli.quiet {
                println!("Not due; previous recommendations kept");
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ "skipped": true }))?);
        }
    }
    Ok(())
}

fn output_human(cli: &Cli, report: &JobReport, recommendations: &BTreeMap<String, Vec<RankedItem>>) {
    for (user, items) in recommendations {
        println!("{}", user);
        if items.is_empty() {
            println!("  (no recommendations)");
        }
        for (rank, item) in items.iter().enumerate() {
            println!(
                "  {}. {} [{}] score {:.3} (collaborative {:.3}, content {:.3}, group {:.2})",
                rank + 1,
                item.name,
                item.item_id,
                item.score,
                item.collaborative,
                item.content_based,
                item.group_weight
            );
        }
    }

    if !cli.quiet {
        println!();
        println!(
            "{} files ({} with text), {} ratings ({} skipped), {} similarity pairs, {} recommendations in {} ms",
            report.files,
            report.files_with_text,
            report.ratings,
            report.ratings_skipped,
            report.matrix_pairs,
            report.recommendations,
            report.elapsed_ms
        );
        if report.extractions_timed_out > 0 {
            println!(
                "{} files gave no text because extraction timed out",
                report.extractions_timed_out
            );
        }
    }
}

fn output_json(report: &JobReport, recommendations: &BTreeMap<String, Vec<RankedItem>>) -> Result<()> {
    let output = json!({
        "report": report,
        "recommendations": recommendations,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
