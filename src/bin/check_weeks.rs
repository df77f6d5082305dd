// src/bin/check_weeks.rs

//! Check week strings given on the command line and show how they expand.
//!
//!     check_weeks [--lossless] "1-16" "1-8,10-16" "3,1,2"

use anyhow::{bail, Result};
use clap::Parser;
use coursegrid::weeks::{self, WeekCompaction};
use tracing::{debug, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(about = "Check week strings and show how they expand")]
struct Args {
    /// Render runs (`1-3,9-10`) instead of min-max
    #[arg(long)]
    lossless: bool,

    #[arg(required = true, value_name = "WEEKS")]
    inputs: Vec<String>,
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    let Args { lossless, inputs } = Args::parse();
    let compaction = if lossless {
        WeekCompaction::Lossless
    } else {
        WeekCompaction::Lossy
    };

    let mut invalid = 0;
    for input in &inputs {
        let valid = weeks::is_valid_format(input);
        let set = weeks::parse(input);
        let canonical = weeks::normalize_with(&set, compaction).unwrap_or_default();
        debug!(input = %input, valid, weeks = set.len(), "checked");
        if !valid {
            warn!(input = %input, "not a valid week string");
            invalid += 1;
        }
        println!(
            "{:<20} {:<7} {:<12} {:?}",
            input,
            if valid { "ok" } else { "INVALID" },
            canonical,
            set.to_vec()
        );
    }

    if invalid > 0 {
        bail!("{} of {} week string(s) invalid", invalid, inputs.len());
    }
    Ok(())
}
