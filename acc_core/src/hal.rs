// Hardware Abstraction Layer for the control loop
//
// The loop never talks to a board directly. Everything it reads or writes
// goes through these traits so the same loop runs against a Firmata-driven
// Uno, the simulator, or a test double.

use crate::error::{AccError, AccResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// First digital pin number of the Uno analog header (A0 == D14)
pub const UNO_ANALOG_PIN_OFFSET: u8 = 14;

/// Analog header channels on the Uno (A0..A5)
pub const UNO_ANALOG_CHANNELS: u8 = 6;

/// Board pin, named the way the Arduino silkscreen names it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Pin {
    Digital(u8),
    Analog(u8),
}

impl Pin {
    /// Physical pin number as seen by the microcontroller
    pub fn number(&self) -> u8 {
        match self {
            Pin::Digital(n) => *n,
            Pin::Analog(ch) => UNO_ANALOG_PIN_OFFSET + ch,
        }
    }

    /// Analog channel, if this is an analog header pin
    pub fn analog_channel(&self) -> Option<u8> {
        match self {
            Pin::Analog(ch) => Some(*ch),
            Pin::Digital(_) => None,
        }
    }

    pub fn is_analog(&self) -> bool {
        matches!(self, Pin::Analog(_))
    }

    /// True if the pin exists on an Uno header: D0..D13 or A0..A5
    pub fn is_on_uno(&self) -> bool {
        match self {
            Pin::Digital(n) => *n < UNO_ANALOG_PIN_OFFSET,
            Pin::Analog(ch) => *ch < UNO_ANALOG_CHANNELS,
        }
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pin::Digital(n) => write!(f, "D{}", n),
            Pin::Analog(ch) => write!(f, "A{}", ch),
        }
    }
}

impl FromStr for Pin {
    type Err = AccError;

    fn from_str(s: &str) -> AccResult<Self> {
        let s = s.trim();
        let (kind, digits) = s.split_at(s.chars().next().map_or(0, |c| c.len_utf8()));
        let number: u8 = digits
            .parse()
            .map_err(|_| AccError::InvalidInput(format!("invalid pin name '{}'", s)))?;

        match kind {
            "D" | "d" => Ok(Pin::Digital(number)),
            "A" | "a" if number < 8 => Ok(Pin::Analog(number)),
            "A" | "a" => Err(AccError::InvalidInput(format!(
                "analog channel out of range in '{}'",
                s
            ))),
            _ => Err(AccError::InvalidInput(format!("invalid pin name '{}'", s))),
        }
    }
}

impl TryFrom<String> for Pin {
    type Error = AccError;

    fn try_from(value: String) -> AccResult<Self> {
        value.parse()
    }
}

impl From<Pin> for String {
    fn from(pin: Pin) -> Self {
        pin.to_string()
    }
}

/// Pin mode requested from the board before use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    DigitalOutput,
    Pwm,
    AnalogInput,
}

/// Voltage reads on the analog header
pub trait AnalogInput {
    /// Read a pin as volts in [0, 5]
    fn read_voltage(&mut self, pin: Pin) -> AccResult<f64>;
}

/// Ultrasonic ranging
pub trait DistanceSensor {
    /// Latest distance in meters. Values are passed through unfiltered.
    fn read_distance(&mut self) -> AccResult<f64>;
}

/// Digital output pins (LEDs, H-bridge direction inputs)
pub trait DigitalOutput {
    fn write_digital(&mut self, pin: Pin, high: bool) -> AccResult<()>;
}

/// PWM-capable output pins
pub trait PwmOutput {
    /// Set duty cycle (0.0 to 1.0)
    fn write_pwm_duty_cycle(&mut self, pin: Pin, duty: f64) -> AccResult<()>;
}

/// Blocking pause between loop steps
pub trait Delay {
    fn pause(&mut self, duration: Duration);
}

/// Everything the control loop needs from a board
pub trait Board: AnalogInput + DistanceSensor + DigitalOutput + PwmOutput + Delay + Send {
    /// Human readable board description for logs
    fn board_name(&self) -> &str;

    /// Prepare a pin for the given use. Boards that need no setup keep the default.
    fn configure_pin(&mut self, _pin: Pin, _mode: PinMode) -> AccResult<()> {
        Ok(())
    }
}

/// `Delay` backed by `std::thread::sleep`
#[derive(Debug, Clone, Copy, Default)]
pub struct StdDelay;

impl Delay for StdDelay {
    fn pause(&mut self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_parsing() {
        assert_eq!("D13".parse::<Pin>().unwrap(), Pin::Digital(13));
        assert_eq!("a4".parse::<Pin>().unwrap(), Pin::Analog(4));
        assert_eq!(" D5 ".parse::<Pin>().unwrap(), Pin::Digital(5));

        assert!("A9".parse::<Pin>().is_err());
        assert!("X3".parse::<Pin>().is_err());
        assert!("D".parse::<Pin>().is_err());
        assert!("".parse::<Pin>().is_err());
    }

    #[test]
    fn test_pin_numbers() {
        assert_eq!(Pin::Analog(0).number(), 14);
        assert_eq!(Pin::Analog(4).number(), 18);
        assert_eq!(Pin::Digital(9).number(), 9);
        assert_eq!(Pin::Analog(3).analog_channel(), Some(3));
        assert_eq!(Pin::Digital(3).analog_channel(), None);
    }

    #[test]
    fn test_uno_header_range() {
        assert!(Pin::Digital(0).is_on_uno());
        assert!(Pin::Digital(13).is_on_uno());
        assert!(Pin::Analog(5).is_on_uno());

        assert!(!Pin::Digital(14).is_on_uno());
        assert!(!Pin::Digital(200).is_on_uno());
        assert!(!Pin::Analog(6).is_on_uno());
        assert!(!"A7".parse::<Pin>().unwrap().is_on_uno());
    }

    #[test]
    fn test_pin_display_round_trip() {
        for name in ["D10", "A0", "D8"] {
            let pin: Pin = name.parse().unwrap();
            assert_eq!(pin.to_string(), name);
        }
    }
}
