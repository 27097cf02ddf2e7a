use crate::context::ExecutionContext;
use anyhow::Result;
use ktrip_index::{RecordStore, Table};

pub fn handle(ctx: &ExecutionContext, table: Option<&str>) -> Result<()> {
    // validate the name before touching storage
    let table = table.map(Table::parse).transpose()?;
    let store = ctx.store()?;

    let files = match table {
        Some(table) => vec![store.export_table(table)?],
        None => store.export_all()?,
    };

    for path in files {
        println!("{}", path.display());
    }
    Ok(())
}
