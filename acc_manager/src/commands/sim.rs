use super::{attach_trace, load_config, print_summary};
use crate::scenario::Scenario;
use acc_core::error::AccResult;
use acc_core::scheduling::Scheduler;
use acc_library::hardware::sim::{SimBoard, SimWrite};
use acc_library::nodes::CruiseControlNode;
use colored::*;
use std::path::PathBuf;

#[derive(Debug, Clone, Default)]
pub struct SimOptions {
    pub config: Option<PathBuf>,
    pub scenario: Option<PathBuf>,
    pub realtime: bool,
    pub trace: Option<PathBuf>,
    pub quiet: bool,
}

/// What a simulated drive did, beyond the scheduler summary
#[derive(Debug, Clone, PartialEq)]
pub struct SimReport {
    pub iterations: u64,
    pub simulated_secs: f64,
    pub peak_duty: f64,
}

/// Play a scenario on the simulated board for exactly its scripted iterations
pub fn run_scenario(opts: SimOptions) -> AccResult<SimReport> {
    let config = load_config(opts.config.as_deref())?;
    let scenario = match &opts.scenario {
        Some(path) => Scenario::load(path)?,
        None => Scenario::demo()?,
    };

    println!(
        "{} Simulating '{}' ({} iterations){}",
        "→".cyan(),
        scenario.name.bold(),
        scenario.iterations(),
        if opts.realtime { ", real time" } else { "" }
    );
    if !scenario.description.is_empty() {
        println!("  {}", scenario.description.dimmed());
    }

    let board = SimBoard::with_pins(config.pins.clone());
    board.set_realtime(opts.realtime);
    board.push_frames(scenario.frames()?);

    let node = attach_trace(
        CruiseControlNode::new(board.clone(), &config),
        opts.trace.as_deref(),
    )?;

    let mut scheduler = Scheduler::new().with_name("acc-sim");
    if opts.realtime {
        scheduler = scheduler.with_signal_handler();
    }
    scheduler.add(Box::new(node), 0, Some(!opts.quiet));

    let summary = scheduler.run_ticks(scenario.iterations())?;
    print_summary(&summary);

    let enable = config.pins.motor_enable;
    let peak_duty = board
        .writes()
        .into_iter()
        .filter_map(|w| match w {
            SimWrite::Pwm(pin, duty) if pin == enable => Some(duty),
            _ => None,
        })
        .fold(0.0, f64::max);

    let report = SimReport {
        iterations: summary.iterations,
        simulated_secs: board.total_paused().as_secs_f64(),
        peak_duty,
    };
    println!(
        "  simulated drive time {:.2}s, peak duty {:.0}%",
        report.simulated_secs,
        report.peak_duty * 100.0
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_runs_to_completion() {
        let report = run_scenario(SimOptions {
            quiet: true,
            ..Default::default()
        })
        .unwrap();

        assert_eq!(report.iterations, 80);
        // 25 increase presses in Normal and Cruise
        assert!((report.peak_duty - 0.25).abs() < 1e-9);
        assert!(report.simulated_secs > 0.0);
    }

    #[test]
    fn test_scenario_file_and_trace() {
        let dir = tempfile::tempdir().unwrap();
        let scenario = dir.path().join("short.toml");
        let trace = dir.path().join("trace.jsonl");
        std::fs::write(
            &scenario,
            "name = \"short\"\n[[step]]\nbuttons = [\"increase\"]\ndistance = 1.0\nrepeat = 3\n",
        )
        .unwrap();

        let report = run_scenario(SimOptions {
            scenario: Some(scenario),
            trace: Some(trace.clone()),
            quiet: true,
            ..Default::default()
        })
        .unwrap();

        assert_eq!(report.iterations, 3);
        let lines = std::fs::read_to_string(&trace).unwrap();
        assert_eq!(lines.lines().count(), 3);
    }
}
