use crate::context::ExecutionContext;
use anyhow::Result;
use ktrip_index::{RecordStore, Table};
use ktrip_types::parse_iso_date;

pub fn handle(ctx: &ExecutionContext, table: &str, date: &str) -> Result<()> {
    let table = Table::parse(table)?;
    let date = parse_iso_date(date)?;

    let rows = ctx.store()?.fetch_rows_for_date(table, date)?;
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}
