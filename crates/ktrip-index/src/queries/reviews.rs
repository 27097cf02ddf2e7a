use ktrip_types::AppReview;
use rusqlite::{Connection, params};

use crate::Result;

/// Trimmed copy with the country code upper-cased.
pub(crate) fn normalize(review: &AppReview) -> AppReview {
    let t = |s: &str| s.trim().to_string();
    AppReview {
        timestamp: t(&review.timestamp),
        date: t(&review.date),
        service_name: t(&review.service_name),
        store: t(&review.store),
        app_id: t(&review.app_id),
        country: review.country.trim().to_uppercase(),
        language: t(&review.language),
        review_id: t(&review.review_id),
        review_created_at: t(&review.review_created_at),
        review_updated_at: t(&review.review_updated_at),
        rating: t(&review.rating),
        title: t(&review.title),
        content: t(&review.content),
        reviewer_name: t(&review.reviewer_name),
        source_url: t(&review.source_url),
    }
}

pub(crate) fn exists(conn: &Connection, review: &AppReview) -> Result<bool> {
    let found: i64 = conn.query_row(
        r#"
        SELECT COUNT(*) FROM app_reviews
        WHERE store = ?1 AND app_id = ?2 AND country = ?3 AND review_id = ?4
        "#,
        params![
            &review.store,
            &review.app_id,
            &review.country,
            &review.review_id
        ],
        |row| row.get(0),
    )?;
    Ok(found > 0)
}

pub(crate) fn upsert(conn: &Connection, review: &AppReview) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO app_reviews (
            timestamp, date, service_name, store, app_id, country, language, review_id,
            review_created_at, review_updated_at, rating, title, content, reviewer_name, source_url
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
        ON CONFLICT(store, app_id, country, review_id) DO UPDATE SET
            timestamp = excluded.timestamp,
            date = excluded.date,
            service_name = excluded.service_name,
            language = excluded.language,
            review_created_at = excluded.review_created_at,
            review_updated_at = excluded.review_updated_at,
            rating = excluded.rating,
            title = excluded.title,
            content = excluded.content,
            reviewer_name = excluded.reviewer_name,
            source_url = excluded.source_url
        "#,
        params![
            &review.timestamp,
            &review.date,
            &review.service_name,
            &review.store,
            &review.app_id,
            &review.country,
            &review.language,
            &review.review_id,
            &review.review_created_at,
            &review.review_updated_at,
            &review.rating,
            &review.title,
            &review.content,
            &review.reviewer_name,
            &review.source_url,
        ],
    )?;
    Ok(())
}
