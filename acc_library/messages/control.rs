//! Control message types
//!
//! Outputs of one control-loop iteration: the active driving mode, the LED
//! pattern and the H-bridge command.

use acc_core::LogSummary;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Driving mode. Exactly one is active per iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DriveMode {
    /// Manual speed with passive decay
    #[default]
    Normal,
    /// Hold a latched set speed
    Cruise,
    /// Adaptive cruise: latched ceiling plus obstacle braking
    #[serde(rename = "ACC")]
    Acc,
}

impl DriveMode {
    /// Label used on the console status line
    pub fn label(&self) -> &'static str {
        match self {
            DriveMode::Normal => "Normal",
            DriveMode::Cruise => "Cruise",
            DriveMode::Acc => "ACC",
        }
    }
}

impl fmt::Display for DriveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Mode", self.label())
    }
}

/// State of the two status LEDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LedPattern {
    pub led1: bool,
    pub led2: bool,
}

impl LedPattern {
    /// LED1 off, LED2 on
    pub const NORMAL: LedPattern = LedPattern {
        led1: false,
        led2: true,
    };
    /// LED1 on, LED2 off
    pub const CRUISE: LedPattern = LedPattern {
        led1: true,
        led2: false,
    };
    /// Both on (ACC, path clear)
    pub const BOTH_ON: LedPattern = LedPattern {
        led1: true,
        led2: true,
    };
    pub const OFF: LedPattern = LedPattern {
        led1: false,
        led2: false,
    };

    /// Both LEDs follow the blink phase
    pub fn blink(phase: bool) -> Self {
        Self {
            led1: phase,
            led2: phase,
        }
    }
}

impl LogSummary for LedPattern {
    fn log_summary(&self) -> String {
        format!("LED1={} LED2={}", self.led1 as u8, self.led2 as u8)
    }
}

/// Direction pins and enable duty for a forward/stop H-bridge
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HBridgeCommand {
    pub in1: bool,
    pub in2: bool,
    /// Duty cycle on the enable pin (0.0 to 1.0)
    pub duty_cycle: f64,
}

impl HBridgeCommand {
    /// Drive forward at the given duty
    pub fn forward(duty_cycle: f64) -> Self {
        Self {
            in1: true,
            in2: false,
            duty_cycle,
        }
    }

    /// Both direction pins low, enable at zero
    pub fn stop() -> Self {
        Self {
            in1: false,
            in2: false,
            duty_cycle: 0.0,
        }
    }

    pub fn is_stopped(&self) -> bool {
        !self.in1 && !self.in2 && self.duty_cycle == 0.0
    }
}

impl LogSummary for HBridgeCommand {
    fn log_summary(&self) -> String {
        format!(
            "IN1={} IN2={} duty={:.2}",
            self.in1 as u8, self.in2 as u8, self.duty_cycle
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_labels() {
        assert_eq!(DriveMode::Normal.to_string(), "Normal Mode");
        assert_eq!(DriveMode::Cruise.to_string(), "Cruise Mode");
        assert_eq!(DriveMode::Acc.to_string(), "ACC Mode");
        assert_eq!(DriveMode::default(), DriveMode::Normal);
    }

    #[test]
    fn test_hbridge_commands() {
        let cmd = HBridgeCommand::forward(0.42);
        assert!(cmd.in1 && !cmd.in2);
        assert!(!cmd.is_stopped());
        assert!(HBridgeCommand::stop().is_stopped());
    }
}
