//! Board backends
//!
//! - `firmata`: a real Arduino Uno running FirmataExpress over serial
//! - `sim`: a scripted in-process board for tests and dry runs

pub mod firmata;
pub mod sim;

pub use firmata::FirmataBoard;
pub use sim::{SimBoard, SimFrame, SimWrite};
