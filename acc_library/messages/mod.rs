//! Message types exchanged between the controller, the node and the board
//!
//! - Control: driving mode, LED pattern, H-bridge command
//! - IO: raw input samples, button presses, console status line

pub mod control;
pub mod io;

pub use control::{DriveMode, HBridgeCommand, LedPattern};
pub use io::{ButtonPresses, ControlInputs, StatusLine};
