use super::{attach_trace, load_config, print_summary};
use acc_core::error::AccResult;
use acc_core::scheduling::Scheduler;
use acc_library::hardware::FirmataBoard;
use acc_library::nodes::CruiseControlNode;
use colored::*;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub config: Option<PathBuf>,
    pub port: Option<String>,
    pub duration_secs: Option<u64>,
    pub trace: Option<PathBuf>,
    pub quiet: bool,
}

/// Drive the real rig until Ctrl+C or the optional duration
pub fn run_hardware(opts: RunOptions) -> AccResult<()> {
    let mut config = load_config(opts.config.as_deref())?;
    if let Some(port) = opts.port {
        config.board.port = port;
    }
    config.validate()?;

    println!(
        "{} Connecting to {} at {} baud...",
        "→".cyan(),
        config.board.port.bold(),
        config.board.baud_rate
    );
    let board = FirmataBoard::open(&config)?;
    if let Some(fw) = board.firmware() {
        println!(
            "{} Firmware {} {}.{}",
            "✓".green(),
            fw.name,
            fw.major,
            fw.minor
        );
    }

    let node = attach_trace(CruiseControlNode::new(board, &config), opts.trace.as_deref())?;

    let mut scheduler = Scheduler::new().with_name("acc").with_signal_handler();
    scheduler.add(Box::new(node), 0, Some(!opts.quiet));

    println!("{}", "Press Ctrl+C to stop".dimmed());
    let summary = match opts.duration_secs {
        Some(secs) => scheduler.run_for(Duration::from_secs(secs))?,
        None => scheduler.run()?,
    };
    print_summary(&summary);
    Ok(())
}
