//! Command line interface.

mod args;

pub use args::Args;

use crate::error::Result;
use crate::packager::{Aggregation, Packager, Targets};

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    let request = args.to_request();

    let aggregation = if args.best_effort {
        Aggregation::BestEffort
    } else {
        Aggregation::FailFast
    };

    let packager = Packager::new(Targets::default()).aggregation(aggregation);
    let paths = packager.package(request).await?;

    if paths.is_empty() {
        println!("No bundles produced (all combinations skipped)");
    } else {
        for path in &paths {
            println!("{}", path.display());
        }
    }
    Ok(0)
}
