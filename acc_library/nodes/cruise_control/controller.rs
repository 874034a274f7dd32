use crate::{ButtonPresses, ControlInputs, DriveMode, HBridgeCommand, LedPattern, StatusLine};
use acc_core::config::AccConfig;
use serde::Serialize;
use std::time::Duration;

/// Tuning knobs for the update rules
#[derive(Debug, Clone, PartialEq)]
pub struct ControlParams {
    pub press_threshold_volts: f64,
    pub obstacle_distance_m: f64,
    pub max_speed: i32,
    pub button_step: Duration,
    pub idle_decay: Duration,
    pub blink_period: Duration,
    pub loop_period: Duration,
}

impl ControlParams {
    pub fn from_config(config: &AccConfig) -> Self {
        Self {
            press_threshold_volts: config.control.press_threshold_volts,
            obstacle_distance_m: config.control.obstacle_distance_m,
            max_speed: config.control.max_speed,
            button_step: config.timing.button_step(),
            idle_decay: config.timing.idle_decay(),
            blink_period: config.timing.blink_period(),
            loop_period: config.timing.loop_period(),
        }
    }
}

impl Default for ControlParams {
    fn default() -> Self {
        Self::from_config(&AccConfig::uno_default())
    }
}

/// All state carried from one iteration to the next
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ControlState {
    pub mode: DriveMode,
    pub speed: i32,
    /// Latched on Cruise entry, tracks button steps while in Cruise
    pub set_speed: i32,
    /// Speed ceiling latched on ACC entry
    pub constant: i32,
    pub distance: f64,
    pub blink_state: bool,
}

/// What one iteration asks the hardware to do, in order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepOutput {
    /// Set when a button switched the mode this iteration
    pub entered_mode: Option<DriveMode>,
    pub leds: LedPattern,
    /// Pause inside the mode update, before the status line
    pub mode_pause: Option<Duration>,
    pub status: StatusLine,
    /// Speed after the output clamp, the value the duty is derived from
    pub motor_speed: i32,
    pub motor: HBridgeCommand,
    /// End-of-iteration pause
    pub loop_pause: Duration,
}

impl StepOutput {
    /// Total blocking time this iteration requested
    pub fn total_pause(&self) -> Duration {
        self.mode_pause.unwrap_or_default() + self.loop_pause
    }
}

/// The mode/speed update rules, free of any I/O
#[derive(Debug, Clone)]
pub struct CruiseController {
    params: ControlParams,
    state: ControlState,
}

impl CruiseController {
    pub fn new(params: ControlParams) -> Self {
        Self {
            params,
            state: ControlState::default(),
        }
    }

    pub fn from_config(config: &AccConfig) -> Self {
        Self::new(ControlParams::from_config(config))
    }

    /// Start from a given state instead of the power-on state
    pub fn with_state(mut self, state: ControlState) -> Self {
        self.state = state;
        self
    }

    pub fn state(&self) -> &ControlState {
        &self.state
    }

    pub fn params(&self) -> &ControlParams {
        &self.params
    }

    /// Run one iteration of the update rules on a fresh input sample
    pub fn step(&mut self, inputs: &ControlInputs) -> StepOutput {
        let presses = inputs.presses(self.params.press_threshold_volts);
        self.state.distance = inputs.distance;

        let entered_mode = self.select_mode(&presses);

        let (leds, mode_pause) = match self.state.mode {
            DriveMode::Normal => self.update_normal(&presses),
            DriveMode::Cruise => self.update_cruise(&presses),
            DriveMode::Acc => self.update_acc(),
        };

        let status = StatusLine {
            mode: self.state.mode,
            speed: self.state.speed,
            distance: self.state.distance,
        };

        let motor = self.motor_stage();

        let loop_pause = if self.state.mode == DriveMode::Acc && self.obstacle_near() {
            self.params.blink_period
        } else {
            self.params.loop_period
        };

        StepOutput {
            entered_mode,
            leds,
            mode_pause,
            status,
            motor_speed: self.state.speed,
            motor,
            loop_pause,
        }
    }

    fn obstacle_near(&self) -> bool {
        self.state.distance < self.params.obstacle_distance_m
    }

    /// cancel > set > acc, at most one transition per iteration
    fn select_mode(&mut self, presses: &ButtonPresses) -> Option<DriveMode> {
        if presses.cancel {
            self.state.mode = DriveMode::Normal;
        } else if presses.set {
            self.state.mode = DriveMode::Cruise;
            self.state.set_speed = self.state.speed;
        } else if presses.acc {
            self.state.mode = DriveMode::Acc;
            self.state.constant = self.state.speed;
        } else {
            return None;
        }
        Some(self.state.mode)
    }

    fn update_normal(&mut self, presses: &ButtonPresses) -> (LedPattern, Option<Duration>) {
        let pause = if presses.increase {
            self.state.speed += 1;
            self.params.button_step
        } else if presses.decrease {
            self.state.speed -= 1;
            self.params.button_step
        } else {
            self.state.speed -= 1;
            self.params.idle_decay
        };
        self.state.speed = self.state.speed.max(0);

        (LedPattern::NORMAL, Some(pause))
    }

    fn update_cruise(&mut self, presses: &ButtonPresses) -> (LedPattern, Option<Duration>) {
        let pause = if presses.increase {
            self.state.speed += 1;
            self.state.set_speed = self.state.speed;
            Some(self.params.button_step)
        } else if presses.decrease {
            self.state.speed -= 1;
            self.state.set_speed = self.state.speed;
            Some(self.params.button_step)
        } else {
            self.state.speed = self.state.set_speed;
            None
        };
        self.state.speed = self.state.speed.max(0);

        (LedPattern::CRUISE, pause)
    }

    fn update_acc(&mut self) -> (LedPattern, Option<Duration>) {
        let near = self.obstacle_near();

        let leds = if near {
            self.state.blink_state = !self.state.blink_state;
            LedPattern::blink(self.state.blink_state)
        } else {
            LedPattern::BOTH_ON
        };

        if near {
            self.state.speed -= 1;
        } else {
            self.state.speed += 1;
        }
        self.state.speed = self.state.speed.min(self.state.constant).max(0);

        (leds, None)
    }

    /// Clamp into the duty range and pick forward or stop.
    /// The clamped speed is kept as the new state.
    fn motor_stage(&mut self) -> HBridgeCommand {
        let max_speed = self.params.max_speed;
        self.state.speed = self.state.speed.clamp(0, max_speed);

        if self.state.speed > 0 {
            HBridgeCommand::forward(self.state.speed as f64 / max_speed as f64)
        } else {
            HBridgeCommand::stop()
        }
    }
}
