pub mod config;
pub mod ports;
pub mod run;
pub mod sim;
pub mod version;

use acc_core::config::AccConfig;
use acc_core::error::AccResult;
use acc_core::scheduling::{RunSummary, StopReason};
use acc_core::hal::Board;
use acc_library::nodes::{CruiseControlNode, TraceRecorder};
use colored::*;
use std::path::Path;

/// Config from `path`, or the Uno defaults when none is given
pub fn load_config(path: Option<&Path>) -> AccResult<AccConfig> {
    match path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            AccConfig::load(path)
        }
        None => Ok(AccConfig::uno_default()),
    }
}

pub(crate) fn attach_trace<B: Board>(
    node: CruiseControlNode<B>,
    trace: Option<&Path>,
) -> AccResult<CruiseControlNode<B>> {
    match trace {
        Some(path) => {
            println!("{} Tracing iterations to {}", "→".cyan(), path.display());
            Ok(node.with_trace(TraceRecorder::create(path)?))
        }
        None => Ok(node),
    }
}

pub(crate) fn print_summary(summary: &RunSummary) {
    let reason = match summary.reason {
        StopReason::Cancelled => "stopped",
        StopReason::DurationElapsed => "duration reached",
        StopReason::TickLimitReached => "script finished",
    };
    println!(
        "{} {} iterations in {:.2}s ({})",
        "✓".green(),
        summary.iterations,
        summary.elapsed.as_secs_f64(),
        reason
    );
}
