//! Control loop nodes
//!
//! ## Control
//! - `CruiseControlNode` - Three-mode cruise control loop against a `Board`
//!
//! ## Actuation
//! - `DcMotorDriver` - Forward/stop H-bridge driver used by the loop
//!
//! ```rust,ignore
//! use acc_library::hardware::sim::SimBoard;
//! use acc_library::nodes::CruiseControlNode;
//!
//! let node = CruiseControlNode::new(SimBoard::new(), &AccConfig::uno_default());
//! ```

pub mod cruise_control;
pub mod dc_motor;

pub use cruise_control::{
    ControlParams, ControlState, CruiseControlNode, CruiseController, StepOutput, TraceRecorder,
};
pub use dc_motor::DcMotorDriver;
