//! # ACC Library
//!
//! Messages, nodes and board backends for the adaptive cruise control demo.
//!
//! ## Structure
//!
//! ```text
//! acc_library/
//! ── messages/       # Input samples, modes, LED and motor commands
//! ── nodes/          # Cruise control loop and DC motor driver
//! ── hardware/       # Firmata board and simulated board
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use acc_core::{AccConfig, Scheduler};
//! use acc_library::{hardware::SimBoard, CruiseControlNode};
//!
//! let config = AccConfig::uno_default();
//! let mut scheduler = Scheduler::new();
//! scheduler.add(Box::new(CruiseControlNode::new(SimBoard::new(), &config)), 0, Some(true));
//! scheduler.run_ticks(100)?;
//! ```

pub mod hardware;
pub mod messages;
pub mod nodes;

pub use acc_core::core::LogSummary;

// Re-export message types at the crate root for convenience
pub use messages::*;

pub use nodes::{CruiseControlNode, CruiseController, DcMotorDriver, TraceRecorder};
