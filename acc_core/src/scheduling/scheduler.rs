use crate::core::{Node, NodeConfig, NodeInfo, NodeMetrics, NodeState};
use crate::error::{AccError, AccResult};
use colored::Colorize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

struct RegisteredNode {
    node: Box<dyn Node>,
    priority: u32,
    initialized: bool,
    context: NodeInfo,
}

/// Cancellation token checked once per iteration boundary
#[derive(Debug, Clone)]
pub struct StopHandle {
    running: Arc<AtomicBool>,
}

impl StopHandle {
    /// Request the run to end after the current iteration
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        !self.running.load(Ordering::SeqCst)
    }
}

/// Why a run ended without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Stop handle or Ctrl+C
    Cancelled,
    DurationElapsed,
    TickLimitReached,
}

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub iterations: u64,
    pub elapsed: Duration,
    pub reason: StopReason,
}

#[derive(Debug, Clone, Copy)]
enum RunLimit {
    None,
    Duration(Duration),
    Ticks(u64),
}

/// Drives registered nodes in priority order, one full pass per iteration.
///
/// Nodes pace themselves through the `Delay` of their board, so the
/// scheduler adds no sleep of its own between passes.
pub struct Scheduler {
    nodes: Vec<RegisteredNode>,
    running: Arc<AtomicBool>,
    scheduler_name: String,
    handle_signals: bool,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            running: Arc::new(AtomicBool::new(true)),
            scheduler_name: "DefaultScheduler".to_string(),
            handle_signals: false,
        }
    }

    /// Set scheduler name (for logging)
    pub fn with_name(mut self, name: &str) -> Self {
        self.scheduler_name = name.to_string();
        self
    }

    /// Install a Ctrl+C handler that stops the run at the next iteration boundary.
    ///
    /// Only one handler can exist per process; a second install is logged and ignored.
    pub fn with_signal_handler(mut self) -> Self {
        self.handle_signals = true;
        self
    }

    /// Add a node. Lower priority numbers tick first.
    pub fn add(
        &mut self,
        node: Box<dyn Node>,
        priority: u32,
        logging_enabled: Option<bool>,
    ) -> &mut Self {
        let config = NodeConfig {
            enable_logging: logging_enabled.unwrap_or(false),
            ..Default::default()
        };
        self.add_with_config(node, priority, config)
    }

    pub fn add_with_config(
        &mut self,
        node: Box<dyn Node>,
        priority: u32,
        config: NodeConfig,
    ) -> &mut Self {
        let node_name = node.name().to_string();
        tracing::debug!(
            scheduler = %self.scheduler_name,
            node = %node_name,
            priority,
            logging = config.enable_logging,
            "added node"
        );

        let context = NodeInfo::new_with_config(node_name, config);
        self.nodes.push(RegisteredNode {
            node,
            priority,
            initialized: false,
            context,
        });
        self.nodes.sort_by_key(|registered| registered.priority);
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            running: self.running.clone(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Run until stopped or until a tick fails
    pub fn run(&mut self) -> AccResult<RunSummary> {
        self.run_with_limit(RunLimit::None)
    }

    /// Run for at most `duration`, checked at iteration boundaries
    pub fn run_for(&mut self, duration: Duration) -> AccResult<RunSummary> {
        self.run_with_limit(RunLimit::Duration(duration))
    }

    /// Run exactly `ticks` iterations unless stopped earlier
    pub fn run_ticks(&mut self, ticks: u64) -> AccResult<RunSummary> {
        self.run_with_limit(RunLimit::Ticks(ticks))
    }

    pub fn get_node_list(&self) -> Vec<String> {
        self.nodes
            .iter()
            .map(|registered| registered.node.name().to_string())
            .collect()
    }

    pub fn node_state(&self, name: &str) -> Option<&NodeState> {
        self.find(name).map(|registered| registered.context.state())
    }

    pub fn node_metrics(&self, name: &str) -> Option<&NodeMetrics> {
        self.find(name).map(|registered| registered.context.metrics())
    }

    fn find(&self, name: &str) -> Option<&RegisteredNode> {
        self.nodes
            .iter()
            .find(|registered| registered.node.name() == name)
    }

    fn install_signal_handler(&self) {
        let running = self.running.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            eprintln!("{}", "\nCtrl+C received! Stopping control loop...".red());
            running.store(false, Ordering::SeqCst);
        }) {
            tracing::warn!("failed to set signal handler: {}", e);
        }
    }

    fn run_with_limit(&mut self, limit: RunLimit) -> AccResult<RunSummary> {
        if self.handle_signals {
            self.install_signal_handler();
        }

        let start_time = Instant::now();
        let mut iterations: u64 = 0;

        if let Err(e) = self.initialize_nodes() {
            self.shutdown_nodes();
            return Err(e);
        }

        let outcome: AccResult<StopReason> = loop {
            if !self.is_running() {
                break Ok(StopReason::Cancelled);
            }
            match limit {
                RunLimit::Duration(max) if start_time.elapsed() >= max => {
                    break Ok(StopReason::DurationElapsed);
                }
                RunLimit::Ticks(max) if iterations >= max => {
                    break Ok(StopReason::TickLimitReached);
                }
                _ => {}
            }

            if let Err(e) = self.tick_all() {
                break Err(e);
            }
            iterations += 1;
        };

        self.shutdown_nodes();

        let reason = outcome.map_err(|e| {
            eprintln!(
                "{} {}",
                format!("[{}]", self.scheduler_name).red(),
                format!("aborted after {} iterations: {}", iterations, e).red()
            );
            e
        })?;

        let summary = RunSummary {
            iterations,
            elapsed: start_time.elapsed(),
            reason,
        };
        tracing::info!(
            scheduler = %self.scheduler_name,
            iterations = summary.iterations,
            reason = ?summary.reason,
            "run complete"
        );
        Ok(summary)
    }

    fn initialize_nodes(&mut self) -> AccResult<()> {
        for registered in self.nodes.iter_mut() {
            if registered.initialized {
                continue;
            }
            let node_name = registered.node.name();
            registered.context.set_state(NodeState::Initializing);
            match registered.node.init(&mut registered.context) {
                Ok(()) => {
                    registered.initialized = true;
                    registered.context.set_state(NodeState::Running);
                    tracing::debug!(node = node_name, "initialized");
                }
                Err(e) => {
                    registered
                        .context
                        .transition_to_error(format!("Initialization failed: {}", e));
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    fn tick_all(&mut self) -> AccResult<()> {
        for registered in self.nodes.iter_mut() {
            if !registered.initialized {
                continue;
            }

            let context = &mut registered.context;
            let node = &mut registered.node;
            context.start_tick();

            let tick_result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                node.tick(Some(&mut *context))
            }))
            .unwrap_or_else(|panic_err| {
                let msg = if let Some(s) = panic_err.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_err.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "unknown panic".to_string()
                };
                Err(AccError::Internal(format!("node panicked: {}", msg)))
            });

            match tick_result {
                Ok(()) => context.record_tick(),
                Err(e) => {
                    context.record_tick_failure(e.to_string());
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    fn shutdown_nodes(&mut self) {
        for registered in self.nodes.iter_mut().rev() {
            if !registered.initialized {
                continue;
            }
            let node_name = registered.node.name();
            let failed = matches!(registered.context.state(), NodeState::Error(_));
            if !failed {
                registered.context.set_state(NodeState::Stopping);
            }

            if let Err(e) = registered.node.shutdown(&mut registered.context) {
                registered
                    .context
                    .log_error(&format!("Error shutting down node '{}': {}", node_name, e));
            } else if !failed {
                registered.context.set_state(NodeState::Stopped);
            }
            registered.initialized = false;
        }
    }
}
