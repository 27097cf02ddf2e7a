use chrono::NaiveDate;
use ktrip_types::{Channel, CounterField, DailyCounter, ValidationError, format_iso_date};
use rusqlite::{Connection, OptionalExtension, params, params_from_iter, types::Value};

use crate::Result;

pub(crate) fn ensure_zero(conn: &Connection, date: NaiveDate, channel: Channel) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO landing_cvr_daily (date, channel, visitors, pilot_cta, first_scan_cta, total_cta)
        VALUES (?1, ?2, 0, 0, 0, 0)
        ON CONFLICT(date, channel) DO NOTHING
        "#,
        params![format_iso_date(date), channel.as_str()],
    )?;
    Ok(())
}

/// Add every increment to the row in one UPDATE. The row must exist.
///
/// A sum past `i64::MAX` is rejected before the UPDATE; SQLite would
/// otherwise store it as REAL.
pub(crate) fn increment(
    conn: &Connection,
    date: NaiveDate,
    channel: Channel,
    increments: &[(CounterField, i64)],
) -> Result<()> {
    let merged = merge(increments)?;
    if merged.is_empty() {
        return Ok(());
    }
    if let Some(current) = get(conn, date, channel)? {
        for (field, amount) in &merged {
            checked_sum(*field, current.value(*field), *amount)?;
        }
    }

    let assignments: Vec<String> = merged
        .iter()
        .enumerate()
        .map(|(i, (field, _))| format!("{col} = {col} + ?{}", i + 1, col = field.column()))
        .collect();
    let sql = format!(
        "UPDATE landing_cvr_daily SET {} WHERE date = ?{} AND channel = ?{}",
        assignments.join(", "),
        merged.len() + 1,
        merged.len() + 2
    );

    let mut values: Vec<Value> = merged.iter().map(|(_, n)| Value::Integer(*n)).collect();
    values.push(Value::Text(format_iso_date(date)));
    values.push(Value::Text(channel.as_str().to_string()));

    conn.execute(&sql, params_from_iter(values))?;
    Ok(())
}

/// One entry per field; repeated fields are summed.
fn merge(increments: &[(CounterField, i64)]) -> Result<Vec<(CounterField, i64)>> {
    let mut merged: Vec<(CounterField, i64)> = Vec::new();
    for (field, amount) in increments {
        match merged.iter_mut().find(|(f, _)| f == field) {
            Some((_, total)) => *total = checked_sum(*field, *total, *amount)?,
            None => merged.push((*field, *amount)),
        }
    }
    Ok(merged)
}

fn checked_sum(field: CounterField, total: i64, amount: i64) -> Result<i64> {
    total.checked_add(amount).ok_or_else(|| {
        ValidationError::InvalidNumber {
            column: field.column().to_string(),
            value: amount.to_string(),
        }
        .into()
    })
}

pub(crate) fn get(
    conn: &Connection,
    date: NaiveDate,
    channel: Channel,
) -> Result<Option<DailyCounter>> {
    let counter = conn
        .query_row(
            r#"
            SELECT channel, visitors, pilot_cta, first_scan_cta, total_cta
            FROM landing_cvr_daily
            WHERE date = ?1 AND channel = ?2
            "#,
            params![format_iso_date(date), channel.as_str()],
            |row| {
                Ok(DailyCounter {
                    date,
                    channel: row.get(0)?,
                    visitors: row.get(1)?,
                    pilot_cta: row.get(2)?,
                    first_scan_cta: row.get(3)?,
                    total_cta: row.get(4)?,
                })
            },
        )
        .optional()?;
    Ok(counter)
}
