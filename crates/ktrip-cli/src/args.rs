use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ktrip")]
#[command(about = "K-TripPedia pilot KPI store: SQLite source of truth with CSV mirrors", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Data directory (database and mirrors); falls back to
    /// KTRIPPEDIA_DATA_DIR, then the config file, then ./data
    #[arg(long, global = true)]
    pub data_dir: Option<String>,

    /// Config file (default: ./ktrip.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Create the database and write every mirror")]
    Init {
        #[arg(long, help = "Record the resolved data directory in ./ktrip.toml")]
        write_config: bool,
    },

    #[command(about = "Fold legacy per-day CSV exports into the store")]
    Migrate {
        #[arg(long, help = "Directory holding the legacy files (default: data directory)")]
        source_dir: Option<PathBuf>,

        #[arg(long, help = "Read and validate only, write nothing")]
        dry_run: bool,
    },

    #[command(about = "Regenerate CSV mirrors from the database")]
    Export {
        #[arg(long, help = "Only this table (default: all)")]
        table: Option<String>,
    },

    #[command(about = "Print one table's rows for a date as JSON")]
    Fetch {
        #[arg(long)]
        table: String,

        #[arg(long, help = "YYYY-MM-DD")]
        date: String,
    },

    #[command(about = "Record landing-page activity")]
    Track {
        #[command(subcommand)]
        command: TrackCommand,
    },

    #[command(about = "Show storage location, schema version and row counts as JSON")]
    Status,
}

#[derive(Subcommand)]
pub enum TrackCommand {
    #[command(about = "Record a landing visit")]
    Visit {
        #[command(flatten)]
        visit: VisitArgs,
    },

    #[command(about = "Record a CTA click")]
    Cta {
        #[command(flatten)]
        visit: VisitArgs,

        #[arg(long, help = "pilot or first_scan")]
        cta: String,
    },

    #[command(about = "Store a lead email (pseudonymized)")]
    Lead {
        #[command(flatten)]
        visit: VisitArgs,

        #[arg(long)]
        email: String,

        #[arg(long, help = "Visitor agreed to be contacted; without it nothing is stored")]
        consent: bool,
    },
}

#[derive(Debug, Clone, Args)]
pub struct VisitArgs {
    #[arg(long, help = "YYYYMMDD (default: today)")]
    pub date: Option<String>,

    #[arg(long)]
    pub session: String,

    #[arg(long, default_value = "", help = "Unknown or empty channels count as referral")]
    pub channel: String,

    #[arg(long, default_value = "")]
    pub source: String,

    #[arg(long, default_value = "")]
    pub post: String,

    #[arg(long, default_value = "")]
    pub language: String,
}
