//! # ACC Core
//!
//! Runtime pieces shared by the adaptive cruise control demo:
//!
//! - **Nodes**: units of work with an init / tick / shutdown lifecycle
//! - **HAL**: traits for the board I/O the control loop depends on
//! - **Config**: TOML configuration for wiring, thresholds and timing
//! - **Scheduling**: the single-threaded polling loop that drives nodes

pub mod config;
pub mod core;
pub mod error;
pub mod hal;
pub mod scheduling;

pub use crate::core::{LogSummary, Node, NodeConfig, NodeInfo, NodeInfoExt, NodeState};
pub use config::AccConfig;
pub use error::{AccError, AccResult};
pub use hal::{AnalogInput, Board, Delay, DigitalOutput, DistanceSensor, Pin, PinMode, PwmOutput};
pub use scheduling::{RunSummary, Scheduler, StopHandle, StopReason};
