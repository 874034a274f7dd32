use crate::error::AccResult;
use colored::Colorize;
use std::fmt;
use std::io::{self, Write};
use std::time::Instant;

/// Compact one-line rendering of a message for logs and console output
pub trait LogSummary {
    fn log_summary(&self) -> String;

    /// Console rendering, may carry color. Defaults to the plain summary.
    fn log_console(&self) -> String {
        self.log_summary()
    }
}

/// Node states for lifecycle tracking
#[derive(Debug, Clone, PartialEq)]
pub enum NodeState {
    Uninitialized,
    Initializing,
    Running,
    Stopping,
    Stopped,
    Error(String),
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeState::Uninitialized => write!(f, "Uninitialized"),
            NodeState::Initializing => write!(f, "Initializing"),
            NodeState::Running => write!(f, "Running"),
            NodeState::Stopping => write!(f, "Stopping"),
            NodeState::Stopped => write!(f, "Stopped"),
            NodeState::Error(msg) => write!(f, "Error: {}", msg),
        }
    }
}

/// Console verbosity for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Quiet,
    Info,
    Debug,
}

/// Execution metrics for a node
#[derive(Debug, Clone, Default)]
pub struct NodeMetrics {
    pub total_ticks: u64,
    pub successful_ticks: u64,
    pub failed_ticks: u64,
    pub avg_tick_duration_ms: f64,
    pub max_tick_duration_ms: f64,
    pub last_tick_duration_ms: f64,
    pub warnings_count: u64,
    pub errors_count: u64,
}

/// Per-node behavior switches
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Print status lines and log messages to the console
    pub enable_logging: bool,
    pub log_level: LogLevel,
}

impl Default for NodeConfig {
    fn default() -> Self {
        NodeConfig {
            enable_logging: true,
            log_level: LogLevel::Info,
        }
    }
}

/// Runtime context handed to a node by the scheduler
pub struct NodeInfo {
    name: String,
    state: NodeState,
    config: NodeConfig,
    metrics: NodeMetrics,
    tick_start_time: Option<Instant>,
}

impl NodeInfo {
    pub fn new(node_name: String, logging_enabled: bool) -> Self {
        let config = NodeConfig {
            enable_logging: logging_enabled,
            ..Default::default()
        };
        Self::new_with_config(node_name, config)
    }

    pub fn new_with_config(node_name: String, config: NodeConfig) -> Self {
        Self {
            name: node_name,
            state: NodeState::Uninitialized,
            config,
            metrics: NodeMetrics::default(),
            tick_start_time: None,
        }
    }

    pub fn state(&self) -> &NodeState {
        &self.state
    }

    pub fn set_state(&mut self, new_state: NodeState) {
        if self.state != new_state {
            tracing::debug!(node = %self.name, from = %self.state, to = %new_state, "state change");
            self.state = new_state;
        }
    }

    pub fn transition_to_error(&mut self, error_msg: String) {
        self.log_error(&error_msg);
        self.set_state(NodeState::Error(error_msg));
    }

    // Tick Management
    pub fn start_tick(&mut self) {
        self.tick_start_time = Some(Instant::now());
    }

    pub fn record_tick(&mut self) {
        if let Some(start_time) = self.tick_start_time.take() {
            let duration_ms = start_time.elapsed().as_secs_f64() * 1000.0;

            self.metrics.total_ticks += 1;
            self.metrics.successful_ticks += 1;
            self.metrics.last_tick_duration_ms = duration_ms;
            if duration_ms > self.metrics.max_tick_duration_ms {
                self.metrics.max_tick_duration_ms = duration_ms;
            }

            let n = self.metrics.successful_ticks as f64;
            self.metrics.avg_tick_duration_ms += (duration_ms - self.metrics.avg_tick_duration_ms) / n;
        }
    }

    pub fn record_tick_failure(&mut self, error_msg: String) {
        self.metrics.total_ticks += 1;
        self.metrics.failed_ticks += 1;
        if let Some(start_time) = self.tick_start_time.take() {
            self.metrics.last_tick_duration_ms = start_time.elapsed().as_secs_f64() * 1000.0;
        }
        self.transition_to_error(error_msg);
    }

    // Logging

    /// Print the node's per-iteration status line to stdout
    pub fn log_status<T: LogSummary>(&mut self, status: &T) {
        if self.config.enable_logging && self.config.log_level != LogLevel::Quiet {
            let mut out = io::stdout().lock();
            let _ = writeln!(out, "{}", status.log_console());
            let _ = out.flush();
        }
        tracing::trace!(node = %self.name, status = %status.log_summary());
    }

    pub fn log_info(&self, message: &str) {
        if self.config.enable_logging && self.config.log_level >= LogLevel::Info {
            eprintln!("{} {} {}", "[INFO]".blue(), format!("[{}]", self.name).yellow(), message);
        }
        tracing::info!(node = %self.name, "{}", message);
    }

    pub fn log_warning(&mut self, message: &str) {
        if self.config.enable_logging {
            eprintln!("{} {} {}", "[WARN]".yellow(), format!("[{}]", self.name).yellow(), message);
        }
        tracing::warn!(node = %self.name, "{}", message);
        self.metrics.warnings_count += 1;
    }

    pub fn log_error(&mut self, message: &str) {
        if self.config.enable_logging {
            eprintln!("{} {} {}", "[ERROR]".red(), format!("[{}]", self.name).yellow(), message);
        }
        tracing::error!(node = %self.name, "{}", message);
        self.metrics.errors_count += 1;
    }

    pub fn log_debug(&mut self, message: &str) {
        if self.config.enable_logging && self.config.log_level == LogLevel::Debug {
            eprintln!("{} {} {}", "[DEBUG]".bright_black(), format!("[{}]", self.name).yellow(), message);
        }
        tracing::debug!(node = %self.name, "{}", message);
    }

    pub fn metrics(&self) -> &NodeMetrics {
        &self.metrics
    }
}

/// A unit of work driven by the scheduler
pub trait Node: Send {
    fn name(&self) -> &'static str;

    /// Called once before the first tick
    fn init(&mut self, ctx: &mut NodeInfo) -> AccResult<()> {
        ctx.log_info("Node initialized successfully");
        Ok(())
    }

    /// One iteration of work. An error here is fatal for the whole run.
    fn tick(&mut self, ctx: Option<&mut NodeInfo>) -> AccResult<()>;

    /// Called once after the last tick, including after a failed tick
    fn shutdown(&mut self, ctx: &mut NodeInfo) -> AccResult<()> {
        ctx.log_info("Node shutdown successfully");
        Ok(())
    }
}

impl LogSummary for f64 {
    fn log_summary(&self) -> String {
        format!("{:.3}", self)
    }
}

impl LogSummary for i32 {
    fn log_summary(&self) -> String {
        self.to_string()
    }
}

impl LogSummary for bool {
    fn log_summary(&self) -> String {
        self.to_string()
    }
}

impl LogSummary for String {
    fn log_summary(&self) -> String {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_metrics() {
        let mut info = NodeInfo::new("test".to_string(), false);

        info.start_tick();
        info.record_tick();
        info.start_tick();
        info.record_tick();
        assert_eq!(info.metrics().total_ticks, 2);
        assert_eq!(info.metrics().successful_ticks, 2);

        info.start_tick();
        info.record_tick_failure("sensor gone".to_string());
        assert_eq!(info.metrics().failed_ticks, 1);
        assert_eq!(info.metrics().errors_count, 1);
        assert_eq!(info.state(), &NodeState::Error("sensor gone".to_string()));
    }

    #[test]
    fn test_record_tick_without_start_is_ignored() {
        let mut info = NodeInfo::new("test".to_string(), false);
        info.record_tick();
        assert_eq!(info.metrics().total_ticks, 0);
    }

    #[test]
    fn test_warning_count() {
        let mut info = NodeInfo::new("test".to_string(), false);
        info.log_warning("late sample");
        info.log_warning("late sample");
        assert_eq!(info.metrics().warnings_count, 2);
    }
}
