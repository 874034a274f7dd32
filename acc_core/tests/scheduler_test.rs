// Scheduler lifecycle tests
use acc_core::core::{Node, NodeInfo, NodeState};
use acc_core::error::{AccError, AccResult as Result};
use acc_core::scheduling::{Scheduler, StopHandle, StopReason};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Records lifecycle calls into a shared journal
struct TestNode {
    name: &'static str,
    journal: Arc<Mutex<Vec<String>>>,
    tick_count: usize,
    fail_at: Option<usize>,
    stop_at: Option<(usize, StopHandle)>,
}

impl TestNode {
    fn new(name: &'static str, journal: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            name,
            journal,
            tick_count: 0,
            fail_at: None,
            stop_at: None,
        }
    }

    fn record(&self, event: &str) {
        self.journal
            .lock()
            .unwrap()
            .push(format!("{}:{}", self.name, event));
    }
}

impl Node for TestNode {
    fn name(&self) -> &'static str {
        self.name
    }

    fn init(&mut self, _ctx: &mut NodeInfo) -> Result<()> {
        self.record("init");
        Ok(())
    }

    fn tick(&mut self, _ctx: Option<&mut NodeInfo>) -> Result<()> {
        self.tick_count += 1;
        self.record(&format!("tick{}", self.tick_count));

        if let Some((at, ref handle)) = self.stop_at {
            if self.tick_count == at {
                handle.stop();
            }
        }
        if self.fail_at == Some(self.tick_count) {
            return Err(AccError::sensor("A0", "unplugged"));
        }
        Ok(())
    }

    fn shutdown(&mut self, _ctx: &mut NodeInfo) -> Result<()> {
        self.record("shutdown");
        Ok(())
    }
}

fn journal() -> Arc<Mutex<Vec<String>>> {
    Arc::new(Mutex::new(Vec::new()))
}

#[test]
fn test_run_ticks_exact_count() {
    let events = journal();
    let mut scheduler = Scheduler::new();
    scheduler.add(Box::new(TestNode::new("loop", events.clone())), 0, None);

    let summary = scheduler.run_ticks(3).unwrap();
    assert_eq!(summary.iterations, 3);
    assert_eq!(summary.reason, StopReason::TickLimitReached);

    let events = events.lock().unwrap();
    assert_eq!(
        *events,
        vec!["loop:init", "loop:tick1", "loop:tick2", "loop:tick3", "loop:shutdown"]
    );
    assert_eq!(scheduler.node_state("loop"), Some(&NodeState::Stopped));
    assert_eq!(scheduler.node_metrics("loop").unwrap().successful_ticks, 3);
}

#[test]
fn test_priority_order() {
    let events = journal();
    let mut scheduler = Scheduler::new();
    scheduler
        .add(Box::new(TestNode::new("late", events.clone())), 20, None)
        .add(Box::new(TestNode::new("early", events.clone())), 1, None);

    assert_eq!(scheduler.get_node_list(), vec!["early", "late"]);
    scheduler.run_ticks(1).unwrap();

    let events = events.lock().unwrap();
    assert_eq!(events[2], "early:tick1");
    assert_eq!(events[3], "late:tick1");
    // Shutdown runs in reverse order
    assert_eq!(events[4], "late:shutdown");
    assert_eq!(events[5], "early:shutdown");
}

#[test]
fn test_failed_tick_aborts_and_shuts_down() {
    let events = journal();
    let mut node = TestNode::new("loop", events.clone());
    node.fail_at = Some(2);

    let mut scheduler = Scheduler::new();
    scheduler.add(Box::new(node), 0, None);

    let err = scheduler.run().unwrap_err();
    assert!(matches!(err, AccError::SensorReadFailure { .. }));

    let events = events.lock().unwrap();
    assert_eq!(events.last().unwrap(), "loop:shutdown");
    assert!(!events.contains(&"loop:tick3".to_string()));
    assert!(matches!(
        scheduler.node_state("loop"),
        Some(NodeState::Error(_))
    ));
}

#[test]
fn test_failed_tick_is_an_error_not_a_stop() {
    let events = journal();
    let mut node = TestNode::new("loop", events.clone());
    node.fail_at = Some(2);

    let mut scheduler = Scheduler::new();
    scheduler.add(Box::new(node), 0, None);

    // A bounded run that fails early must not report a normal stop
    let result = scheduler.run_ticks(5);
    assert!(matches!(result, Err(AccError::SensorReadFailure { .. })));
    assert_eq!(scheduler.node_metrics("loop").unwrap().successful_ticks, 1);
    assert_eq!(
        *events.lock().unwrap(),
        vec!["loop:init", "loop:tick1", "loop:tick2", "loop:shutdown"]
    );
}

#[test]
fn test_stop_handle_cancels_at_iteration_boundary() {
    let events = journal();
    let mut scheduler = Scheduler::new();
    let mut node = TestNode::new("loop", events.clone());
    node.stop_at = Some((4, scheduler.stop_handle()));
    scheduler.add(Box::new(node), 0, None);

    let summary = scheduler.run().unwrap();
    assert_eq!(summary.iterations, 4);
    assert_eq!(summary.reason, StopReason::Cancelled);
}

#[test]
fn test_stop_before_run() {
    let events = journal();
    let mut scheduler = Scheduler::new();
    scheduler.add(Box::new(TestNode::new("loop", events.clone())), 0, None);
    scheduler.stop_handle().stop();

    let summary = scheduler.run().unwrap();
    assert_eq!(summary.iterations, 0);
    assert_eq!(*events.lock().unwrap(), vec!["loop:init", "loop:shutdown"]);
}

#[test]
fn test_run_for_duration() {
    let events = journal();
    let mut scheduler = Scheduler::new();
    scheduler.add(Box::new(TestNode::new("loop", events)), 0, None);

    let summary = scheduler.run_for(Duration::from_millis(20)).unwrap();
    assert_eq!(summary.reason, StopReason::DurationElapsed);
    assert!(summary.elapsed >= Duration::from_millis(20));
}

#[test]
fn test_panicking_node_is_reported_as_error() {
    struct PanicNode;
    impl Node for PanicNode {
        fn name(&self) -> &'static str {
            "panic_node"
        }
        fn tick(&mut self, _ctx: Option<&mut NodeInfo>) -> Result<()> {
            panic!("boom");
        }
    }

    let mut scheduler = Scheduler::new();
    scheduler.add(Box::new(PanicNode), 0, None);
    let err = scheduler.run().unwrap_err();
    assert!(matches!(err, AccError::Internal(ref msg) if msg.contains("boom")));
}
