use crate::args::VisitArgs;
use crate::context::ExecutionContext;
use anyhow::Result;
use ktrip_runtime::{LandingTracker, TrackOutcome, VisitContext, today_token};

pub fn visit(ctx: &ExecutionContext, args: &VisitArgs) -> Result<()> {
    let tracker = LandingTracker::new(ctx.store()?);
    let outcome = tracker.track_visit(&visit_context(args))?;
    println!("{}", outcome_label(outcome));
    Ok(())
}

pub fn cta(ctx: &ExecutionContext, args: &VisitArgs, cta_type: &str) -> Result<()> {
    let tracker = LandingTracker::new(ctx.store()?);
    let outcome = tracker.track_cta(&visit_context(args), cta_type)?;
    println!("{}", outcome_label(outcome));
    Ok(())
}

pub fn lead(ctx: &ExecutionContext, args: &VisitArgs, email: &str, consent: bool) -> Result<()> {
    let tracker = LandingTracker::new(ctx.store()?);
    let outcome = tracker.save_lead(&visit_context(args), email, consent)?;
    println!("{}", outcome_label(outcome));
    Ok(())
}

fn visit_context(args: &VisitArgs) -> VisitContext {
    let date_token = args.date.clone().unwrap_or_else(today_token);
    VisitContext::new(date_token, args.session.as_str(), args.channel.as_str())
        .with_source(args.source.as_str(), args.post.as_str())
        .with_language(args.language.as_str())
}

fn outcome_label(outcome: TrackOutcome) -> &'static str {
    match outcome {
        TrackOutcome::Recorded => "recorded",
        TrackOutcome::Duplicate => "duplicate",
        TrackOutcome::SkippedNoConsent => "skipped: no consent",
    }
}
