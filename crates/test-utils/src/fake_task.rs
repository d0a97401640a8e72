use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;
use treerun::dag::Package;
use treerun::engine::TaskOutcome;
use treerun::exec::PackageTask;

/// What the fake task observed, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEvent {
    Started(String),
    Finished(String),
}

/// A fake package task that:
/// - records when each package starts and finishes
/// - tracks the maximum number of packages in flight at once
/// - fails, panics, sleeps or blocks on a gate for configured packages
#[derive(Debug, Default)]
pub struct FakeTask {
    failing: HashMap<String, i32>,
    panicking: HashSet<String>,
    delays: HashMap<String, Duration>,
    default_delay: Duration,
    gates: HashMap<String, Arc<Notify>>,
    events: Mutex<Vec<TaskEvent>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeTask {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `package` fail with `code`.
    pub fn fail(mut self, package: &str, code: i32) -> Self {
        self.failing.insert(package.to_string(), code);
        self
    }

    /// Make `package` panic instead of returning.
    pub fn panic_on(mut self, package: &str) -> Self {
        self.panicking.insert(package.to_string());
        self
    }

    /// Sleep for `delay` while running `package`.
    pub fn delay(mut self, package: &str, delay: Duration) -> Self {
        self.delays.insert(package.to_string(), delay);
        self
    }

    /// Sleep for `delay` in every package without a specific delay.
    pub fn default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    /// Block `package` after it starts until [`open_gate`](Self::open_gate).
    pub fn gate(mut self, package: &str) -> Self {
        self.gates
            .insert(package.to_string(), Arc::new(Notify::new()));
        self
    }

    pub fn open_gate(&self, package: &str) {
        if let Some(gate) = self.gates.get(package) {
            gate.notify_one();
        }
    }

    pub fn events(&self) -> Vec<TaskEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Package names in start order.
    pub fn started(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                TaskEvent::Started(name) => Some(name),
                TaskEvent::Finished(_) => None,
            })
            .collect()
    }

    /// Package names in finish order.
    pub fn finished(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                TaskEvent::Finished(name) => Some(name),
                TaskEvent::Started(_) => None,
            })
            .collect()
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Poll until `package` has started.
    pub async fn wait_until_started(&self, package: &str) {
        while !self.started().iter().any(|p| p == package) {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    fn record(&self, event: TaskEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl PackageTask for FakeTask {
    fn run(&self, package: Package) -> Pin<Box<dyn Future<Output = TaskOutcome> + Send + '_>> {
        Box::pin(async move {
            let name = package.name;
            self.record(TaskEvent::Started(name.clone()));
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            if let Some(gate) = self.gates.get(&name) {
                gate.notified().await;
            }

            let delay = self.delays.get(&name).copied().unwrap_or(self.default_delay);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.record(TaskEvent::Finished(name.clone()));

            if self.panicking.contains(&name) {
                panic!("fake task panicked in package {name}");
            }

            match self.failing.get(&name) {
                Some(&code) => TaskOutcome::Failed(code),
                None => TaskOutcome::Success,
            }
        })
    }
}
