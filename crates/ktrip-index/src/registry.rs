use ktrip_types::{
    Channel, CtaType, EventType, ValidationError, parse_iso_date, pseudonymize_lead_email,
};
use rusqlite::types::Value;
use std::fmt;
use std::str::FromStr;

use ktrip_types::Row;

// NOTE: Table Registry
//
// Every table the store knows about is listed here, with its mirror file,
// the column order of that file, and the natural key that drives upserts.
// Table and column names are interpolated into SQL, so nothing outside this
// registry ever reaches a statement.

/// Tables owned by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    LandingEvents,
    LandingCvrDaily,
    AnalyticsEvents,
    AppReviews,
    CommunityOutreachLog,
    TripSafety,
    InterviewLog,
    B2bPipeline,
    TripPassPricing,
    GuardrailChecklist,
}

/// How a column's text value is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    /// Non-negative integer counter
    Count,
    /// Boolean stored as 0/1
    Flag,
}

#[derive(Debug)]
pub struct TableSpec {
    pub table: Table,
    pub name: &'static str,
    pub mirror_file: &'static str,
    /// Stored columns, in declaration order
    pub columns: &'static [&'static str],
    /// Columns written to the mirror file, in order
    pub mirror_columns: &'static [&'static str],
    /// Natural key (conflict target); empty for append-only tables
    pub key_columns: &'static [&'static str],
    /// Columns that must be present and non-blank in every written row
    pub required_columns: &'static [&'static str],
    pub count_columns: &'static [&'static str],
    pub flag_columns: &'static [&'static str],
    /// Deterministic export and read order
    pub order_by: &'static str,
    /// Rows are facts: a key conflict keeps the stored row untouched
    pub immutable: bool,
}

const LANDING_EVENT_COLUMNS: &[&str] = &[
    "timestamp",
    "date",
    "session_id",
    "language",
    "channel",
    "source_id",
    "post_id",
    "event_type",
    "cta_type",
    "lead_email",
    "consent",
];

/// Dedup key of `landing_events`.
pub const LANDING_EVENT_KEY: &[&str] = &[
    "date",
    "session_id",
    "channel",
    "source_id",
    "post_id",
    "event_type",
    "cta_type",
    "lead_email",
];

const COUNTER_COLUMNS: &[&str] = &[
    "date",
    "channel",
    "visitors",
    "pilot_cta",
    "first_scan_cta",
    "total_cta",
];

const COUNTER_FIELDS: &[&str] = &["visitors", "pilot_cta", "first_scan_cta", "total_cta"];

const ANALYTICS_COLUMNS: &[&str] = &[
    "timestamp",
    "date",
    "event_name",
    "client_id",
    "channel",
    "language",
    "status",
    "payload",
];

const ANALYTICS_MIRROR_COLUMNS: &[&str] = &[
    "timestamp",
    "event_name",
    "client_id",
    "channel",
    "language",
    "status",
    "payload",
];

const APP_REVIEW_COLUMNS: &[&str] = &[
    "timestamp",
    "date",
    "service_name",
    "store",
    "app_id",
    "country",
    "language",
    "review_id",
    "review_created_at",
    "review_updated_at",
    "rating",
    "title",
    "content",
    "reviewer_name",
    "source_url",
];

const APP_REVIEW_KEY: &[&str] = &["store", "app_id", "country", "review_id"];

const COMMUNITY_OUTREACH_COLUMNS: &[&str] = &[
    "date",
    "platform",
    "community_name",
    "post_id",
    "url",
    "language",
    "impressions",
    "clicks",
    "visitors",
    "cta",
    "leads",
    "status",
    "notes",
];

const TRIP_SAFETY_COLUMNS: &[&str] = &[
    "scenario_id",
    "date",
    "persona",
    "menu",
    "restriction",
    "risk_light",
    "confidence",
    "evidence_count",
    "show_mode_used",
    "quick_help_used",
    "resolved",
    "time_sec",
];

const INTERVIEW_LOG_COLUMNS: &[&str] = &[
    "interview_id",
    "date",
    "segment",
    "language",
    "pain_tags",
    "quote",
];

const B2B_PIPELINE_COLUMNS: &[&str] = &[
    "meeting_id",
    "date",
    "partner_type",
    "partner_name",
    "status",
    "loi_signed",
    "intent_email",
    "notes",
];

const TRIP_PASS_PRICING_COLUMNS: &[&str] = &[
    "response_id",
    "date",
    "persona",
    "price_card",
    "selected",
    "willing_to_pay",
];

const GUARDRAIL_CHECKLIST_COLUMNS: &[&str] = &[
    "check_id",
    "date",
    "scenario_id",
    "banned_expression_found",
    "evidence_missing",
    "confidence_missing",
    "reviewer",
    "notes",
];

static SPECS: [TableSpec; 10] = [
    TableSpec {
        table: Table::LandingEvents,
        name: "landing_events",
        mirror_file: "landing_events.csv",
        columns: LANDING_EVENT_COLUMNS,
        mirror_columns: LANDING_EVENT_COLUMNS,
        key_columns: LANDING_EVENT_KEY,
        required_columns: &["date", "session_id", "channel", "event_type"],
        count_columns: &[],
        flag_columns: &["consent"],
        order_by: "timestamp ASC, id ASC",
        immutable: true,
    },
    TableSpec {
        table: Table::LandingCvrDaily,
        name: "landing_cvr_daily",
        mirror_file: "landing_cvr.csv",
        columns: COUNTER_COLUMNS,
        mirror_columns: COUNTER_COLUMNS,
        key_columns: &["date", "channel"],
        required_columns: &["date", "channel"],
        count_columns: COUNTER_FIELDS,
        flag_columns: &[],
        order_by: "date ASC, channel ASC",
        immutable: false,
    },
    TableSpec {
        table: Table::AnalyticsEvents,
        name: "analytics_events",
        mirror_file: "analytics_events.csv",
        columns: ANALYTICS_COLUMNS,
        mirror_columns: ANALYTICS_MIRROR_COLUMNS,
        key_columns: &[],
        required_columns: &["date", "event_name"],
        count_columns: &[],
        flag_columns: &[],
        order_by: "timestamp ASC, id ASC",
        immutable: false,
    },
    TableSpec {
        table: Table::AppReviews,
        name: "app_reviews",
        mirror_file: "app_reviews.csv",
        columns: APP_REVIEW_COLUMNS,
        mirror_columns: APP_REVIEW_COLUMNS,
        key_columns: APP_REVIEW_KEY,
        required_columns: APP_REVIEW_KEY,
        count_columns: &[],
        flag_columns: &[],
        order_by: "date ASC, timestamp ASC, store ASC, app_id ASC, country ASC, review_id ASC",
        immutable: false,
    },
    TableSpec {
        table: Table::CommunityOutreachLog,
        name: "community_outreach_log",
        mirror_file: "community_outreach_log.csv",
        columns: COMMUNITY_OUTREACH_COLUMNS,
        mirror_columns: COMMUNITY_OUTREACH_COLUMNS,
        key_columns: &["date", "post_id"],
        required_columns: &["date", "post_id", "platform"],
        count_columns: &[],
        flag_columns: &[],
        order_by: "date ASC, post_id ASC",
        immutable: false,
    },
    TableSpec {
        table: Table::TripSafety,
        name: "trip_safety",
        mirror_file: "trip_safety.csv",
        columns: TRIP_SAFETY_COLUMNS,
        mirror_columns: TRIP_SAFETY_COLUMNS,
        key_columns: &["date", "scenario_id"],
        required_columns: &["date", "scenario_id"],
        count_columns: &[],
        flag_columns: &[],
        order_by: "date ASC, scenario_id ASC",
        immutable: false,
    },
    TableSpec {
        table: Table::InterviewLog,
        name: "interview_log",
        mirror_file: "interview_log.csv",
        columns: INTERVIEW_LOG_COLUMNS,
        mirror_columns: INTERVIEW_LOG_COLUMNS,
        key_columns: &["date", "interview_id"],
        required_columns: &["date", "interview_id"],
        count_columns: &[],
        flag_columns: &[],
        order_by: "date ASC, interview_id ASC",
        immutable: false,
    },
    TableSpec {
        table: Table::B2bPipeline,
        name: "b2b_pipeline",
        mirror_file: "b2b_pipeline.csv",
        columns: B2B_PIPELINE_COLUMNS,
        mirror_columns: B2B_PIPELINE_COLUMNS,
        key_columns: &["date", "meeting_id"],
        required_columns: &["date", "meeting_id"],
        count_columns: &[],
        flag_columns: &[],
        order_by: "date ASC, meeting_id ASC",
        immutable: false,
    },
    TableSpec {
        table: Table::TripPassPricing,
        name: "trip_pass_pricing",
        mirror_file: "trip_pass_pricing.csv",
        columns: TRIP_PASS_PRICING_COLUMNS,
        mirror_columns: TRIP_PASS_PRICING_COLUMNS,
        key_columns: &["date", "response_id"],
        required_columns: &["date", "response_id"],
        count_columns: &[],
        flag_columns: &[],
        order_by: "date ASC, response_id ASC",
        immutable: false,
    },
    TableSpec {
        table: Table::GuardrailChecklist,
        name: "guardrail_checklist",
        mirror_file: "guardrail_checklist.csv",
        columns: GUARDRAIL_CHECKLIST_COLUMNS,
        mirror_columns: GUARDRAIL_CHECKLIST_COLUMNS,
        key_columns: &["date", "check_id"],
        required_columns: &["date", "check_id"],
        count_columns: &[],
        flag_columns: &[],
        order_by: "date ASC, check_id ASC",
        immutable: false,
    },
];

impl Table {
    /// Registry order; also the order of a full export.
    pub const ALL: [Table; 10] = [
        Table::LandingEvents,
        Table::LandingCvrDaily,
        Table::AnalyticsEvents,
        Table::AppReviews,
        Table::CommunityOutreachLog,
        Table::TripSafety,
        Table::InterviewLog,
        Table::B2bPipeline,
        Table::TripPassPricing,
        Table::GuardrailChecklist,
    ];

    /// The six survey/metrics tables keyed by (date, entity id).
    pub const METRICS: [Table; 6] = [
        Table::TripSafety,
        Table::InterviewLog,
        Table::B2bPipeline,
        Table::TripPassPricing,
        Table::GuardrailChecklist,
        Table::CommunityOutreachLog,
    ];

    pub fn spec(&self) -> &'static TableSpec {
        &SPECS[*self as usize]
    }

    pub fn name(&self) -> &'static str {
        self.spec().name
    }

    /// Look a table up by its registered name.
    pub fn parse(name: &str) -> Result<Table, ValidationError> {
        name.parse()
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Table {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Table::ALL
            .into_iter()
            .find(|t| t.name() == s.trim())
            .ok_or_else(|| ValidationError::UnknownTable(s.to_string()))
    }
}

/// A validated row ready to be bound: one value per stored column.
#[derive(Debug)]
pub(crate) struct PreparedRow {
    pub values: Vec<Value>,
    /// Non-key columns overwritten on conflict: the ones the caller
    /// supplied, plus every counter field (an omitted counter resets to 0).
    pub provided: Vec<&'static str>,
}

impl TableSpec {
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains(&column)
    }

    pub fn column_kind(&self, column: &str) -> ColumnKind {
        if self.count_columns.contains(&column) {
            ColumnKind::Count
        } else if self.flag_columns.contains(&column) {
            ColumnKind::Flag
        } else {
            ColumnKind::Text
        }
    }

    /// Keep only registered columns of a foreign row (e.g. an old CSV export).
    pub fn project(&self, row: &Row) -> Row {
        row.iter()
            .filter(|(k, _)| self.has_column(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Validate a caller row and bind every stored column.
    ///
    /// Columns the row does not mention are bound to their empty value so no
    /// NULL ever reaches a key column.
    pub(crate) fn prepare_row(&self, row: &Row) -> Result<PreparedRow, ValidationError> {
        if let Some(column) = row.keys().find(|k| !self.has_column(k)) {
            return Err(ValidationError::UnknownColumn {
                table: self.name.to_string(),
                column: column.clone(),
            });
        }

        let missing: Vec<String> = self
            .required_columns
            .iter()
            .filter(|c| row.get(**c).is_none_or(|v| v.trim().is_empty()))
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::MissingIdentity {
                table: self.name.to_string(),
                fields: missing,
            });
        }

        if let Some(date) = row.get("date").filter(|d| !d.trim().is_empty()) {
            parse_iso_date(date)?;
        }

        let mut values = Vec::with_capacity(self.columns.len());
        for column in self.columns {
            let raw = row.get(*column).map(String::as_str).unwrap_or("");
            values.push(self.bind(column, raw)?);
        }

        let provided = self
            .columns
            .iter()
            .copied()
            .filter(|c| {
                !self.key_columns.contains(c)
                    && (row.contains_key(*c) || self.count_columns.contains(c))
            })
            .collect();

        Ok(PreparedRow { values, provided })
    }

    fn bind(&self, column: &str, raw: &str) -> Result<Value, ValidationError> {
        match self.column_kind(column) {
            ColumnKind::Count => parse_count(column, raw).map(Value::Integer),
            ColumnKind::Flag => Ok(Value::Integer(parse_flag(raw) as i64)),
            ColumnKind::Text => self.bind_text(column, raw).map(Value::Text),
        }
    }

    fn bind_text(&self, column: &str, raw: &str) -> Result<String, ValidationError> {
        match (self.table, column) {
            (Table::LandingEvents | Table::LandingCvrDaily, "channel") => {
                Ok(raw.trim().parse::<Channel>()?.as_str().to_string())
            }
            (Table::LandingEvents, "event_type") => {
                Ok(raw.trim().parse::<EventType>()?.as_str().to_string())
            }
            (Table::LandingEvents, "cta_type") => Ok(CtaType::parse_optional(raw)?
                .map(|c| c.as_str().to_string())
                .unwrap_or_default()),
            (Table::LandingEvents, "lead_email") => Ok(pseudonymize_lead_email(raw)),
            // same identity rules as upsert_reviews
            (Table::AppReviews, "country") => Ok(raw.trim().to_uppercase()),
            (Table::AppReviews, _) => Ok(raw.trim().to_string()),
            (_, "date") => Ok(raw.trim().to_string()),
            _ => Ok(raw.to_string()),
        }
    }
}

/// Parse a stored counter value: empty means zero.
pub fn parse_count(column: &str, raw: &str) -> Result<i64, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    match trimmed.parse::<i64>() {
        Ok(n) if n >= 0 => Ok(n),
        _ => Err(ValidationError::InvalidNumber {
            column: column.to_string(),
            value: raw.to_string(),
        }),
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "y"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_registry_order_matches_specs() {
        for table in Table::ALL {
            assert_eq!(table.spec().table, table);
            assert_eq!(table.name().parse::<Table>().unwrap(), table);
        }
    }

    #[test]
    fn test_unknown_table_rejected() {
        assert_eq!(
            Table::parse("landing"),
            Err(ValidationError::UnknownTable("landing".to_string()))
        );
    }

    #[test]
    fn test_mirror_columns_are_stored_columns() {
        for table in Table::ALL {
            let spec = table.spec();
            for column in spec.mirror_columns {
                assert!(spec.has_column(column), "{}.{}", spec.name, column);
            }
            for column in spec.key_columns {
                assert!(spec.has_column(column), "{}.{}", spec.name, column);
            }
        }
    }

    #[test]
    fn test_prepare_row_rejects_unknown_column() {
        let spec = Table::TripSafety.spec();
        let err = spec
            .prepare_row(&row(&[
                ("date", "2026-02-16"),
                ("scenario_id", "S001"),
                ("colour", "red"),
            ]))
            .unwrap_err();

        assert!(matches!(err, ValidationError::UnknownColumn { column, .. } if column == "colour"));
    }

    #[test]
    fn test_prepare_row_requires_identity() {
        let spec = Table::InterviewLog.spec();
        let err = spec
            .prepare_row(&row(&[("date", "2026-02-16"), ("interview_id", " ")]))
            .unwrap_err();

        assert_eq!(
            err,
            ValidationError::MissingIdentity {
                table: "interview_log".to_string(),
                fields: vec!["interview_id".to_string()],
            }
        );
    }

    #[test]
    fn test_prepare_row_validates_date() {
        let spec = Table::TripSafety.spec();
        let err = spec
            .prepare_row(&row(&[("date", "2026/02/16"), ("scenario_id", "S001")]))
            .unwrap_err();

        assert_eq!(err, ValidationError::InvalidDate("2026/02/16".to_string()));
    }

    #[test]
    fn test_prepare_counter_row_binds_integers() {
        let spec = Table::LandingCvrDaily.spec();
        let prepared = spec
            .prepare_row(&row(&[
                ("date", "2026-02-16"),
                ("channel", "community"),
                ("visitors", "12"),
                ("total_cta", "3"),
            ]))
            .unwrap();

        assert_eq!(prepared.values[2], Value::Integer(12));
        assert_eq!(prepared.values[3], Value::Integer(0));
        assert_eq!(
            prepared.provided,
            vec!["visitors", "pilot_cta", "first_scan_cta", "total_cta"]
        );

        let err = spec
            .prepare_row(&row(&[
                ("date", "2026-02-16"),
                ("channel", "community"),
                ("visitors", "-1"),
            ]))
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidNumber { .. }));
    }

    #[test]
    fn test_prepare_review_row_normalizes_identity() {
        let spec = Table::AppReviews.spec();
        let prepared = spec
            .prepare_row(&row(&[
                ("date", "2026-02-16"),
                ("store", " google_play "),
                ("app_id", "com.ktrip "),
                ("country", " kr"),
                ("review_id", " r1 "),
            ]))
            .unwrap();

        let value = |column: &str| {
            let i = spec.columns.iter().position(|c| *c == column).unwrap();
            prepared.values[i].clone()
        };
        assert_eq!(value("store"), Value::Text("google_play".to_string()));
        assert_eq!(value("app_id"), Value::Text("com.ktrip".to_string()));
        assert_eq!(value("country"), Value::Text("KR".to_string()));
        assert_eq!(value("review_id"), Value::Text("r1".to_string()));
    }

    #[test]
    fn test_prepare_landing_row_hashes_email() {
        let spec = Table::LandingEvents.spec();
        let prepared = spec
            .prepare_row(&row(&[
                ("date", "2026-02-16"),
                ("session_id", "s1"),
                ("channel", "referral"),
                ("event_type", "lead_submit"),
                ("lead_email", "Lead@Example.com"),
                ("consent", "true"),
            ]))
            .unwrap();

        let Value::Text(email) = &prepared.values[9] else {
            panic!("lead_email should bind as text");
        };
        assert!(ktrip_types::is_pseudonymized(email));
        assert_eq!(prepared.values[10], Value::Integer(1));
    }

    #[test]
    fn test_project_drops_foreign_columns() {
        let spec = Table::B2bPipeline.spec();
        let projected = spec.project(&row(&[
            ("date", "2026-02-16"),
            ("meeting_id", "M1"),
            ("legacy_column", "x"),
        ]));

        assert_eq!(projected.len(), 2);
        assert!(!projected.contains_key("legacy_column"));
    }
}
