//! Conformance test suite for `EventLog` implementations.
//!
//! Checks, independent of any backend, for the guarantees a runner relies
//! on from its log:
//!
//! - **Publish**: offsets, unique event ids, payload and pointer fidelity
//! - **Subscribe**: history replay, live delivery, one total order
//! - **Filter**: tag and event type selection, for subscriptions and history
//!
//! # Usage
//!
//! Pass [`run_conformance_suite`] a factory producing a fresh, empty log; it
//! is called once per check:
//!
//! ```ignore
//! use swarm_log::conformance::run_conformance_suite;
//!
//! #[tokio::test]
//! async fn my_log_conformance() {
//!     let report = run_conformance_suite(|| async { MyLog::connect().await }).await;
//!     assert!(report.is_conformant(), "{report}");
//! }
//! ```

mod filter;
mod publish;
mod subscribe;

use std::fmt;
use std::future::Future;
use std::time::Duration;

use crate::traits::EventSubscription;
use crate::EventLog;
use serde_json::json;
use swarm_interchange::{EventEnvelope, MachineEvent};

/// How long a test waits for an expected delivery.
const DELIVERY_TIMEOUT: Duration = Duration::from_secs(2);

/// Outcome of one conformance check, identified as `category::name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestResult {
    pub category: &'static str,
    pub name: &'static str,
    pub outcome: Result<(), String>,
}

impl TestResult {
    fn new(category: &'static str, name: &'static str, outcome: Result<(), String>) -> Self {
        Self {
            category,
            name,
            outcome,
        }
    }

    pub fn passed(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Every check of one suite run, in execution order.
#[derive(Debug, Clone, Default)]
pub struct ConformanceReport {
    pub results: Vec<TestResult>,
}

impl ConformanceReport {
    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn failures(&self) -> impl Iterator<Item = &TestResult> {
        self.results.iter().filter(|r| !r.passed())
    }

    pub fn is_conformant(&self) -> bool {
        self.failures().next().is_none()
    }
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let failed = self.failures().count();
        writeln!(
            f,
            "event log conformance: {} of {} checks failed",
            failed,
            self.total()
        )?;
        for r in self.failures() {
            if let Err(msg) = &r.outcome {
                writeln!(f, "  {}::{}: {}", r.category, r.name, msg)?;
            }
        }
        Ok(())
    }
}

/// Run the full conformance suite against an event log backend.
///
pub async fn run_conformance_suite<L, F, Fut>(factory: F) -> ConformanceReport
where
    L: EventLog,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let mut results = Vec::new();

    results.extend(publish::run_publish_tests(&factory).await);
    results.extend(subscribe::run_subscribe_tests(&factory).await);
    results.extend(filter::run_filter_tests(&factory).await);

    let report = ConformanceReport { results };
    tracing::debug!(
        total = report.total(),
        failed = report.failures().count(),
        "conformance suite finished"
    );
    report
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn make_event(event_type: &str, n: u64) -> MachineEvent {
    match json!({ "n": n }) {
        serde_json::Value::Object(fields) => MachineEvent::with_fields(event_type, fields),
        _ => MachineEvent::new(event_type),
    }
}

async fn receive(sub: &mut EventSubscription) -> Result<EventEnvelope, String> {
    match tokio::time::timeout(DELIVERY_TIMEOUT, sub.next()).await {
        Ok(Some(envelope)) => Ok(envelope),
        Ok(None) => Err("subscription ended unexpectedly".to_string()),
        Err(_) => Err(format!("no delivery within {:?}", DELIVERY_TIMEOUT)),
    }
}

async fn receive_n(sub: &mut EventSubscription, n: usize) -> Result<Vec<EventEnvelope>, String> {
    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        out.push(receive(sub).await?);
    }
    Ok(out)
}

fn types_of(envelopes: &[EventEnvelope]) -> Vec<String> {
    envelopes
        .iter()
        .map(|e| e.payload.event_type.to_string())
        .collect()
}
