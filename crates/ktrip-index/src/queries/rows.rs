use chrono::NaiveDate;
use ktrip_types::{Row, format_iso_date};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, params, params_from_iter};

use crate::Result;
use crate::registry::{PreparedRow, TableSpec};

pub(crate) fn upsert(conn: &Connection, spec: &TableSpec, row: &PreparedRow) -> Result<()> {
    conn.execute(&upsert_sql(spec, &row.provided), params_from_iter(row.values.iter()))?;
    Ok(())
}

fn upsert_sql(spec: &TableSpec, provided: &[&str]) -> String {
    let placeholders: Vec<String> = (1..=spec.columns.len()).map(|i| format!("?{}", i)).collect();
    let mut sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        spec.name,
        spec.columns.join(", "),
        placeholders.join(", ")
    );

    if spec.key_columns.is_empty() {
        return sql;
    }

    let conflict = spec.key_columns.join(", ");
    if spec.immutable || provided.is_empty() {
        sql.push_str(&format!(" ON CONFLICT({}) DO NOTHING", conflict));
    } else {
        let assignments: Vec<String> = provided
            .iter()
            .map(|c| format!("{c} = excluded.{c}"))
            .collect();
        sql.push_str(&format!(
            " ON CONFLICT({}) DO UPDATE SET {}",
            conflict,
            assignments.join(", ")
        ));
    }
    sql
}

pub(crate) fn delete_for_date(conn: &Connection, spec: &TableSpec, date: NaiveDate) -> Result<usize> {
    let deleted = conn.execute(
        &format!("DELETE FROM {} WHERE date = ?1", spec.name),
        params![format_iso_date(date)],
    )?;
    Ok(deleted)
}

pub(crate) fn select_for_date(
    conn: &Connection,
    spec: &TableSpec,
    date: NaiveDate,
) -> Result<Vec<Row>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM {} WHERE date = ?1 ORDER BY {}",
        spec.columns.join(", "),
        spec.name,
        spec.order_by
    ))?;

    let rows = stmt
        .query_map(params![format_iso_date(date)], |row| {
            let mut out = Row::new();
            for (i, column) in spec.columns.iter().enumerate() {
                out.insert(column.to_string(), value_to_text(row.get_ref(i)?));
            }
            Ok(out)
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Every row of the table as text, projected on `columns`, in export order.
pub(crate) fn select_all_text(
    conn: &Connection,
    spec: &TableSpec,
    columns: &[&str],
) -> Result<Vec<Vec<String>>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM {} ORDER BY {}",
        columns.join(", "),
        spec.name,
        spec.order_by
    ))?;

    let rows = stmt
        .query_map([], |row| {
            (0..columns.len())
                .map(|i| row.get_ref(i).map(value_to_text))
                .collect::<std::result::Result<Vec<_>, _>>()
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

pub(crate) fn count(conn: &Connection, spec: &TableSpec) -> Result<usize> {
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {}", spec.name),
        [],
        |row| row.get(0),
    )?;
    Ok(count as usize)
}

/// Text form used by reads and mirrors; NULL becomes the empty string.
pub(crate) fn value_to_text(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) | ValueRef::Blob(t) => String::from_utf8_lossy(t).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Table;

    #[test]
    fn test_upsert_sql_updates_only_provided_columns() {
        let sql = upsert_sql(Table::InterviewLog.spec(), &["quote"]);
        insta::assert_snapshot!(sql, @"INSERT INTO interview_log (interview_id, date, segment, language, pain_tags, quote) VALUES (?1, ?2, ?3, ?4, ?5, ?6) ON CONFLICT(date, interview_id) DO UPDATE SET quote = excluded.quote");
    }

    #[test]
    fn test_upsert_sql_for_immutable_and_keyless_tables() {
        let landing = upsert_sql(Table::LandingEvents.spec(), &["timestamp"]);
        assert!(landing.ends_with("DO NOTHING"));

        let analytics = upsert_sql(Table::AnalyticsEvents.spec(), &[]);
        assert!(!analytics.contains("ON CONFLICT"));
    }

    #[test]
    fn test_value_to_text() {
        assert_eq!(value_to_text(ValueRef::Null), "");
        assert_eq!(value_to_text(ValueRef::Integer(7)), "7");
        assert_eq!(value_to_text(ValueRef::Text(b"abc")), "abc");
    }
}
