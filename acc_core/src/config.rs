//! Controller configuration
//!
//! Loaded from a TOML file. Every section and field has a default matching
//! the reference Uno wiring, so a partial file only overrides what it names.
//!
//! ```toml
//! [board]
//! port = "/dev/ttyACM0"
//!
//! [pins]
//! led1 = "D13"
//!
//! [control]
//! obstacle_distance_m = 0.2
//! ```

use crate::error::{AccError, AccResult};
use crate::hal::Pin;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccConfig {
    pub board: BoardConfig,
    pub pins: PinConfig,
    pub control: ControlConfig,
    pub timing: TimingConfig,
}

/// Serial link to the Firmata-driven board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub port: String,
    pub baud_rate: u32,
    /// The Uno resets when the port opens; wait this long before talking to it
    pub startup_delay_ms: u64,
    /// Longest wait for a first analog or sonar sample
    pub read_timeout_ms: u64,
    pub sampling_interval_ms: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinConfig {
    pub increase: Pin,
    pub decrease: Pin,
    pub cancel: Pin,
    pub set: Pin,
    pub acc: Pin,
    pub ultrasonic_trigger: Pin,
    pub ultrasonic_echo: Pin,
    pub motor_in1: Pin,
    pub motor_in2: Pin,
    pub motor_enable: Pin,
    pub led1: Pin,
    pub led2: Pin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// A button counts as pressed at or above this voltage
    pub press_threshold_volts: f64,
    /// ACC brakes and blinks below this distance
    pub obstacle_distance_m: f64,
    /// Speed that maps to a 100% duty cycle
    pub max_speed: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Pause after a speed step from a button in Normal and Cruise
    pub button_step_ms: u64,
    /// Pause after the passive decay step in Normal
    pub idle_decay_ms: u64,
    /// End-of-iteration pause while blinking in ACC
    pub blink_period_ms: u64,
    /// End-of-iteration pause otherwise
    pub loop_period_ms: u64,
}

impl AccConfig {
    /// Reference wiring for the Arduino Uno demo rig
    pub fn uno_default() -> Self {
        Self {
            board: BoardConfig::default(),
            pins: PinConfig::default(),
            control: ControlConfig::default(),
            timing: TimingConfig::default(),
        }
    }

    /// Load and validate a configuration file
    pub fn load(path: &Path) -> AccResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            AccError::config(format!("cannot read '{}': {}", path.display(), e))
        })?;
        let config = Self::from_toml(&text)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn from_toml(text: &str) -> AccResult<Self> {
        let config: AccConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> AccResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write the configuration to disk, creating parent directories
    pub fn save(&self, path: &Path) -> AccResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn validate(&self) -> AccResult<()> {
        let c = &self.control;
        if !(c.press_threshold_volts > 0.0 && c.press_threshold_volts <= 5.0) {
            return Err(AccError::config(format!(
                "press_threshold_volts must be in (0, 5], got {}",
                c.press_threshold_volts
            )));
        }
        if !(c.obstacle_distance_m > 0.0) {
            return Err(AccError::config(format!(
                "obstacle_distance_m must be positive, got {}",
                c.obstacle_distance_m
            )));
        }
        if c.max_speed <= 0 {
            return Err(AccError::config(format!(
                "max_speed must be positive, got {}",
                c.max_speed
            )));
        }
        if self.board.baud_rate == 0 {
            return Err(AccError::config("baud_rate must be non-zero"));
        }

        let p = &self.pins;
        for (name, pin) in p.all() {
            if !pin.is_on_uno() {
                return Err(AccError::config(format!(
                    "'{}' is on {}, which is not an Uno pin (D0-D13, A0-A5)",
                    name, pin
                )));
            }
        }

        for (name, pin) in p.buttons() {
            if !pin.is_analog() {
                return Err(AccError::config(format!(
                    "button '{}' must be on an analog pin, got {}",
                    name, pin
                )));
            }
        }

        let mut seen = HashSet::new();
        for (name, pin) in p.digital() {
            if pin.is_analog() {
                return Err(AccError::config(format!(
                    "'{}' must be on a digital pin, got {}",
                    name, pin
                )));
            }
            if !seen.insert(pin) {
                return Err(AccError::config(format!(
                    "pin {} is assigned more than once ('{}')",
                    pin, name
                )));
            }
        }

        Ok(())
    }
}

impl Default for AccConfig {
    fn default() -> Self {
        Self::uno_default()
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        let port = if cfg!(windows) { "COM4" } else { "/dev/ttyACM0" };
        Self {
            port: port.to_string(),
            baud_rate: 57_600,
            startup_delay_ms: 2000,
            read_timeout_ms: 1000,
            sampling_interval_ms: 19,
        }
    }
}

impl PinConfig {
    /// Button inputs in sampling order
    pub fn buttons(&self) -> [(&'static str, Pin); 5] {
        [
            ("increase", self.increase),
            ("decrease", self.decrease),
            ("cancel", self.cancel),
            ("set", self.set),
            ("acc", self.acc),
        ]
    }

    /// Digital pins: the sonar pair, the H-bridge, and the LEDs
    pub fn digital(&self) -> [(&'static str, Pin); 7] {
        [
            ("ultrasonic_trigger", self.ultrasonic_trigger),
            ("ultrasonic_echo", self.ultrasonic_echo),
            ("motor_in1", self.motor_in1),
            ("motor_in2", self.motor_in2),
            ("motor_enable", self.motor_enable),
            ("led1", self.led1),
            ("led2", self.led2),
        ]
    }

    pub fn all(&self) -> impl Iterator<Item = (&'static str, Pin)> {
        self.buttons().into_iter().chain(self.digital())
    }
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            increase: Pin::Analog(0),
            decrease: Pin::Analog(1),
            cancel: Pin::Analog(2),
            set: Pin::Analog(3),
            acc: Pin::Analog(4),
            ultrasonic_trigger: Pin::Digital(10),
            ultrasonic_echo: Pin::Digital(8),
            motor_in1: Pin::Digital(5),
            motor_in2: Pin::Digital(6),
            motor_enable: Pin::Digital(9),
            led1: Pin::Digital(13),
            led2: Pin::Digital(12),
        }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            press_threshold_volts: 4.0,
            obstacle_distance_m: 0.2,
            max_speed: 100,
        }
    }
}

impl TimingConfig {
    pub fn button_step(&self) -> Duration {
        Duration::from_millis(self.button_step_ms)
    }

    pub fn idle_decay(&self) -> Duration {
        Duration::from_millis(self.idle_decay_ms)
    }

    pub fn blink_period(&self) -> Duration {
        Duration::from_millis(self.blink_period_ms)
    }

    pub fn loop_period(&self) -> Duration {
        Duration::from_millis(self.loop_period_ms)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            button_step_ms: 100,
            idle_decay_ms: 500,
            blink_period_ms: 100,
            loop_period_ms: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults() {
        let config = AccConfig::uno_default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pins.motor_enable, Pin::Digital(9));
        assert_eq!(config.pins.cancel, Pin::Analog(2));
        assert_relative_eq!(config.control.obstacle_distance_m, 0.2);
        assert_eq!(config.timing.idle_decay(), Duration::from_millis(500));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = AccConfig::from_toml(
            r#"
            [board]
            port = "/dev/ttyUSB1"

            [pins]
            led1 = "D7"

            [control]
            obstacle_distance_m = 0.35
            "#,
        )
        .unwrap();

        assert_eq!(config.board.port, "/dev/ttyUSB1");
        assert_eq!(config.board.baud_rate, 57_600);
        assert_eq!(config.pins.led1, Pin::Digital(7));
        assert_eq!(config.pins.led2, Pin::Digital(12));
        assert_relative_eq!(config.control.obstacle_distance_m, 0.35);
        assert_relative_eq!(config.control.press_threshold_volts, 4.0);
    }

    #[test]
    fn test_validation() {
        let mut config = AccConfig::uno_default();
        config.control.press_threshold_volts = 6.0;
        assert!(config.validate().is_err());

        config = AccConfig::uno_default();
        config.control.obstacle_distance_m = 0.0;
        assert!(config.validate().is_err());

        config = AccConfig::uno_default();
        config.pins.led2 = config.pins.led1;
        assert!(config.validate().is_err());

        config = AccConfig::uno_default();
        config.pins.set = Pin::Digital(3);
        assert!(config.validate().is_err());

        config = AccConfig::uno_default();
        config.pins.motor_in1 = Pin::Analog(5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_echo_pin_must_be_unique() {
        let err = AccConfig::from_toml("[pins]\nultrasonic_echo = \"D13\"\n").unwrap_err();
        assert!(matches!(err, AccError::Config(ref msg) if msg.contains("D13")));

        let mut config = AccConfig::uno_default();
        config.pins.ultrasonic_echo = config.pins.motor_enable;
        assert!(config.validate().is_err());

        config = AccConfig::uno_default();
        config.pins.ultrasonic_echo = Pin::Analog(5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_pins_outside_uno_rejected() {
        let err = AccConfig::from_toml("[pins]\nled1 = \"D200\"\n").unwrap_err();
        assert!(matches!(err, AccError::Config(ref msg) if msg.contains("D200")));

        assert!(AccConfig::from_toml("[pins]\nmotor_enable = \"D14\"\n").is_err());
        assert!(AccConfig::from_toml("[pins]\nacc = \"A6\"\n").is_err());
        assert!(AccConfig::from_toml("[pins]\nincrease = \"A7\"\n").is_err());

        let config = AccConfig::from_toml("[pins]\nacc = \"A5\"\nled1 = \"D2\"\n").unwrap();
        assert_eq!(config.pins.acc, Pin::Analog(5));
    }

    #[test]
    fn test_bad_pin_name_rejected() {
        let err = AccConfig::from_toml("[pins]\nled1 = \"Q1\"\n").unwrap_err();
        assert!(matches!(err, AccError::TomlDe(_)));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("acc.toml");

        let mut config = AccConfig::uno_default();
        config.timing.loop_period_ms = 20;
        config.save(&path).unwrap();

        let loaded = AccConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
