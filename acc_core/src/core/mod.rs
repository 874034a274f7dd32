//! # Core types and traits
//!
//! - **Node**: a unit of work ticked by the scheduler
//! - **NodeInfo**: runtime context handed to a node (logging, metrics, state)
//!
//! ## Node Lifecycle
//!
//! 1. **Construction** - node is created with its configuration and hardware
//! 2. **Initialization** - `init()` is called once
//! 3. **Execution** - `tick()` is called until the run ends or a tick fails
//! 4. **Shutdown** - `shutdown()` is called to leave hardware in a safe state

pub mod node;
pub mod node_info_ext;

pub use node::{LogLevel, LogSummary, Node, NodeConfig, NodeInfo, NodeMetrics, NodeState};
pub use node_info_ext::NodeInfoExt;
