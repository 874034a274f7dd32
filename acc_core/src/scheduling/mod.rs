//! # Scheduling
//!
//! The scheduler owns the nodes and drives the polling loop:
//!
//! ```rust,ignore
//! use acc_core::Scheduler;
//!
//! let mut scheduler = Scheduler::new().with_signal_handler();
//! scheduler.add(Box::new(control_node), 0, Some(true));
//! scheduler.run()?; // until Ctrl+C or a fatal tick error
//! ```
//!
//! There is one thread and no overlap between iterations. Cancellation is
//! observed only between full passes over the nodes.

pub mod scheduler;

pub use scheduler::{RunSummary, Scheduler, StopHandle, StopReason};
