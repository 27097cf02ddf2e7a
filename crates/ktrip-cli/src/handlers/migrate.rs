use crate::context::ExecutionContext;
use anyhow::{Context, Result};
use ktrip_runtime::{LegacyMigration, MigrationProgress, MigrationReport};
use std::path::PathBuf;

pub fn handle(ctx: &ExecutionContext, source_dir: Option<PathBuf>, dry_run: bool) -> Result<()> {
    let source_dir = match source_dir {
        Some(dir) => dir,
        None => ctx.data_dir()?,
    };
    if !source_dir.is_dir() {
        anyhow::bail!("Legacy directory not found: {}", source_dir.display());
    }

    let store = ctx.store()?;
    let report = LegacyMigration::new(store, &source_dir)
        .dry_run(dry_run)
        .run(render_progress)
        .with_context(|| format!("Migration from {} failed", source_dir.display()))?;

    print!("{}", render_report(&report));

    let failed = report.failed().count();
    if failed > 0 {
        anyhow::bail!("{} dataset(s) failed to migrate", failed);
    }
    Ok(())
}

fn render_progress(progress: MigrationProgress) {
    match progress {
        MigrationProgress::DatasetStarted { table, sources } if sources > 0 => {
            eprintln!("Migrating {} ({} files)", table, sources);
        }
        MigrationProgress::DatasetFailed { table, error } => {
            eprintln!("  {} failed: {}", table, error);
        }
        MigrationProgress::Exported { files } => {
            eprintln!("Exported {} mirrors", files);
        }
        _ => {}
    }
}

fn render_report(report: &MigrationReport) -> String {
    let mut out = String::new();
    for dataset in &report.datasets {
        match &dataset.error {
            Some(error) => out.push_str(&format!("{}: failed: {}\n", dataset.table, error)),
            None => out.push_str(&format!(
                "{}: applied={} skipped={} sources={}\n",
                dataset.table, dataset.applied, dataset.skipped, dataset.sources
            )),
        }
    }

    let verb = if report.dry_run { "would apply" } else { "applied" };
    out.push_str(&format!("total: {} {}\n", verb, report.total_applied()));
    out
}
