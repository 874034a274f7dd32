//! Input samples and console status

use super::control::DriveMode;
use acc_core::LogSummary;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One iteration's worth of raw inputs
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ControlInputs {
    /// Button voltages in [0, 5]
    pub increase: f64,
    pub decrease: f64,
    pub cancel: f64,
    pub set: f64,
    pub acc: f64,
    /// Ultrasonic distance in meters, unfiltered
    pub distance: f64,
}

impl ControlInputs {
    /// No buttons held, obstacle at `distance`
    pub fn idle(distance: f64) -> Self {
        Self {
            distance,
            ..Default::default()
        }
    }

    pub fn presses(&self, threshold_volts: f64) -> ButtonPresses {
        let pressed = |volts: f64| volts >= threshold_volts;
        ButtonPresses {
            increase: pressed(self.increase),
            decrease: pressed(self.decrease),
            cancel: pressed(self.cancel),
            set: pressed(self.set),
            acc: pressed(self.acc),
        }
    }
}

/// Buttons at or above the press threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ButtonPresses {
    pub increase: bool,
    pub decrease: bool,
    pub cancel: bool,
    pub set: bool,
    pub acc: bool,
}

/// Console line printed once per iteration, after the mode update
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusLine {
    pub mode: DriveMode,
    pub speed: i32,
    pub distance: f64,
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | Speed: {} | Distance: {:.2} m",
            self.mode, self.speed, self.distance
        )
    }
}

impl LogSummary for StatusLine {
    fn log_summary(&self) -> String {
        self.to_string()
    }

    fn log_console(&self) -> String {
        let mode = self.mode.to_string();
        let mode = match self.mode {
            DriveMode::Normal => mode.green(),
            DriveMode::Cruise => mode.cyan(),
            DriveMode::Acc => mode.yellow().bold(),
        };
        format!(
            "{} | Speed: {} | Distance: {:.2} m",
            mode, self.speed, self.distance
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_threshold_is_inclusive() {
        let inputs = ControlInputs {
            increase: 4.0,
            decrease: 3.99,
            cancel: 5.0,
            set: 0.0,
            acc: 4.2,
            distance: 1.0,
        };
        let presses = inputs.presses(4.0);
        assert!(presses.increase);
        assert!(!presses.decrease);
        assert!(presses.cancel);
        assert!(!presses.set);
        assert!(presses.acc);
    }

    #[test]
    fn test_status_line_format() {
        let line = StatusLine {
            mode: DriveMode::Acc,
            speed: 7,
            distance: 0.1234,
        };
        assert_eq!(line.to_string(), "ACC Mode | Speed: 7 | Distance: 0.12 m");

        let line = StatusLine {
            mode: DriveMode::Normal,
            speed: 0,
            distance: 2.0,
        };
        assert_eq!(line.log_summary(), "Normal Mode | Speed: 0 | Distance: 2.00 m");
    }
}
