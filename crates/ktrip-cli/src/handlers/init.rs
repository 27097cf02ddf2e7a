use crate::context::ExecutionContext;
use anyhow::{Context, Result};
use ktrip_index::RecordStore;
use ktrip_runtime::Config;

pub fn handle(ctx: &ExecutionContext, write_config: bool) -> Result<()> {
    let store = ctx.store()?;
    let files = store.export_all().context("Failed to write mirrors")?;
    let location = ctx.location()?;

    println!("Database: {}", location.db_path.display());
    println!(
        "Mirrors:  {} ({} files)",
        location.mirror_dir.display(),
        files.len()
    );

    if write_config {
        let cwd = ctx
            .cwd()
            .context("Cannot write ktrip.toml without a working directory")?;
        let path = Config::default_path(cwd);
        if path.exists() {
            println!("Config:   {} (kept)", path.display());
            return Ok(());
        }

        let mut config = ctx.config()?.clone();
        config.storage.data_dir = Some(ctx.data_dir()?.display().to_string());
        config
            .save_to(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Config:   {}", path.display());
    }

    Ok(())
}
