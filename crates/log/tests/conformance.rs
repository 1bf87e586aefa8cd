//! Runs the backend-agnostic conformance suite against `InMemoryLog`.

use swarm_log::conformance::run_conformance_suite;
use swarm_log::InMemoryLog;

#[tokio::test]
async fn in_memory_log_conformance() {
    let report = run_conformance_suite(|| async { InMemoryLog::new("conformance") }).await;
    assert!(report.total() > 0);
    assert!(report.is_conformant(), "{report}");
}
