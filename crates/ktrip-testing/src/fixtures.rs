//! Legacy CSV fragments.
//!
//! Shaped like the per-day exports the store replaced: dated files
//! (`20260216_landing_events.csv`), older ones moved to `archive/`, and the
//! cumulative file without a date prefix.

use anyhow::{Context, Result};
use std::path::Path;

/// Two visits from the same session (duplicate), one with a source, a CTA
/// click, a lead with a plaintext email and a row with an unknown channel.
pub const LANDING_EVENTS: &str = "\
timestamp,date,session_id,language,channel,source_id,post_id,event_type,cta_type,lead_email,consent
2026-02-16T09:00:00,2026-02-16,s1,,referral,,,visit,,,0
2026-02-16T09:00:05,2026-02-16,s1,,referral,,,visit,,,0
2026-02-16T09:02:00,20260216,s2,EN,community,reddit,p1,visit,,,0
2026-02-16T09:03:00,2026-02-16,s2,EN,community,reddit,p1,cta_click,pilot,,0
2026-02-16T09:04:00,2026-02-16,s2,EN,community,reddit,p1,lead_submit,,Traveler@Example.com,1
2026-02-16T09:05:00,2026-02-16,s3,,tiktok,,,visit,,,0
";

/// Written before source/post tracking existed.
pub const LANDING_EVENTS_ARCHIVED: &str = "\
timestamp,date,session_id,language,channel,event_type,cta_type,lead_email,consent
,2026-02-15,s0,,pre_arrival_qr,visit,,,0
";

/// First half of a day's counters.
pub const LANDING_CVR_MORNING: &str = "\
date,channel,visitors,pilot_cta,first_scan_cta,total_cta
2026-02-16,community,3,1,0,1
2026-02-16,referral,2,,,
";

/// Second half of the same day: sums with the morning fragment.
pub const LANDING_CVR_EVENING: &str = "\
date,channel,visitors,pilot_cta,first_scan_cta,total_cta
20260216,community,4,0,2,2
2026-02-16,referral,1.0,n/a,0,0
";

pub const ANALYTICS_EVENTS: &str = "\
timestamp,date,event_name,client_id,channel,language,status,payload
2026-02-16T09:00:01,2026-02-16,landing_visit,c1,referral,EN,sent,{}
2026-02-16T09:00:01,2026-02-16,landing_visit,c1,referral,EN,sent,{}
2026-02-16T09:03:01,,cta_click,c2,community,EN,failed,{}
";

/// Older snapshot of two scenarios.
pub const TRIP_SAFETY_EARLY: &str = "\
scenario_id,date,persona,menu,restriction,risk_light,confidence,evidence_count,show_mode_used,quick_help_used,resolved,time_sec
S001,2026-02-16,vegan,bibimbap,egg,yellow,0.6,2,no,no,no,90
S002,2026-02-16,halal,bulgogi,pork,green,0.9,3,yes,no,yes,40
";

/// Later snapshot: S001 resolved, plus a column that no longer exists.
pub const TRIP_SAFETY_LATE: &str = "\
scenario_id,date,persona,menu,restriction,risk_light,confidence,evidence_count,show_mode_used,quick_help_used,resolved,time_sec,legacy_note
S001,2026-02-16,vegan,bibimbap,egg,green,0.8,4,yes,yes,yes,60,dropped
,2026-02-16,nobody,,,,,,,,,,
";

pub const APP_REVIEWS: &str = "\
timestamp,date,service_name,store,app_id,country,language,review_id,review_created_at,review_updated_at,rating,title,content,reviewer_name,source_url
2026-02-16T12:00:00,2026-02-16,K-TripPedia,google_play,com.x,us,en,r1,,,4,Good,Helpful,Ann,
2026-02-16T13:00:00,2026-02-16,K-TripPedia,google_play,com.x,US,en,r1,,,5,Great,Very helpful,Ann,
";

/// Write `content` to `dir/name`, creating parent directories.
pub fn write_fragment(dir: &Path, name: &str, content: &str) -> Result<()> {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))
}

/// Every fixture in its usual place.
pub fn write_legacy_export(dir: &Path) -> Result<()> {
    write_fragment(dir, "20260216_landing_events.csv", LANDING_EVENTS)?;
    write_fragment(dir, "archive/20260215_landing_events.csv", LANDING_EVENTS_ARCHIVED)?;
    write_fragment(dir, "20260216_landing_cvr.csv", LANDING_CVR_MORNING)?;
    write_fragment(dir, "landing_cvr.csv", LANDING_CVR_EVENING)?;
    write_fragment(dir, "20260216_analytics_events.csv", ANALYTICS_EVENTS)?;
    write_fragment(dir, "archive/20260216_trip_safety.csv", TRIP_SAFETY_EARLY)?;
    write_fragment(dir, "trip_safety.csv", TRIP_SAFETY_LATE)?;
    write_fragment(dir, "20260216_app_reviews.csv", APP_REVIEWS)?;
    Ok(())
}
