use crate::context::ExecutionContext;
use anyhow::Result;
use ktrip_index::{RecordStore, SchemaManager, Table, schema_version};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct StatusView {
    data_dir: String,
    db_path: String,
    mirror_dir: String,
    schema_version: i32,
    tables: Vec<TableStatus>,
}

#[derive(Debug, Serialize)]
struct TableStatus {
    table: &'static str,
    rows: usize,
    mirror: String,
    mirror_exists: bool,
}

pub fn handle(ctx: &ExecutionContext) -> Result<()> {
    let store = ctx.store()?;
    let location = ctx.location()?;
    let conn = store.schema().connection()?;

    let mut tables = Vec::with_capacity(Table::ALL.len());
    for table in Table::ALL {
        let mirror = store.mirror_path(table);
        tables.push(TableStatus {
            table: table.name(),
            rows: store.count_rows(table)?,
            mirror_exists: mirror.exists(),
            mirror: mirror.display().to_string(),
        });
    }

    let view = StatusView {
        data_dir: ctx.data_dir()?.display().to_string(),
        db_path: location.db_path.display().to_string(),
        mirror_dir: location.mirror_dir.display().to_string(),
        schema_version: schema_version(&conn)?,
        tables,
    };
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}
