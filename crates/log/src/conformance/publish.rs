use std::collections::BTreeSet;
use std::future::Future;

use super::{make_event, TestResult};
use crate::{EventLog, SubscriptionFilter, Tags};
use swarm_interchange::MachineEvent;

pub(super) async fn run_publish_tests<L, F, Fut>(factory: &F) -> Vec<TestResult>
where
    L: EventLog,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    vec![
        TestResult::new(
            "publish",
            "publish_returns_one_meta_per_event",
            publish_returns_one_meta_per_event(factory).await,
        ),
        TestResult::new(
            "publish",
            "publish_assigns_increasing_offsets",
            publish_assigns_increasing_offsets(factory).await,
        ),
        TestResult::new(
            "publish",
            "publish_assigns_unique_event_ids",
            publish_assigns_unique_event_ids(factory).await,
        ),
        TestResult::new(
            "publish",
            "publish_preserves_payload_and_pointer",
            publish_preserves_payload_and_pointer(factory).await,
        ),
        TestResult::new(
            "publish",
            "publish_records_tags",
            publish_records_tags(factory).await,
        ),
        TestResult::new(
            "publish",
            "publish_empty_batch_is_a_no_op",
            publish_empty_batch_is_a_no_op(factory).await,
        ),
    ]
}

async fn publish_returns_one_meta_per_event<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: EventLog,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let log = factory().await;
    let metas = log
        .publish(
            &Tags::default(),
            vec![make_event("a", 0), make_event("b", 1), make_event("c", 2)],
        )
        .await
        .map_err(|e| format!("publish failed: {e}"))?;
    if metas.len() != 3 {
        return Err(format!("expected 3 metas, got {}", metas.len()));
    }
    Ok(())
}

async fn publish_assigns_increasing_offsets<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: EventLog,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let log = factory().await;
    let mut offsets = Vec::new();
    for n in 0..3 {
        let metas = log
            .publish(&Tags::default(), vec![make_event("a", n), make_event("b", n)])
            .await
            .map_err(|e| format!("publish failed: {e}"))?;
        offsets.extend(metas.iter().map(|m| m.offset));
    }
    if offsets.windows(2).any(|w| w[0] >= w[1]) {
        return Err(format!("offsets not strictly increasing: {offsets:?}"));
    }
    Ok(())
}

async fn publish_assigns_unique_event_ids<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: EventLog,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let log = factory().await;
    let mut ids = BTreeSet::new();
    for n in 0..5 {
        let metas = log
            .publish(&Tags::default(), vec![make_event("a", n)])
            .await
            .map_err(|e| format!("publish failed: {e}"))?;
        for meta in metas {
            if !ids.insert(meta.event_id.clone()) {
                return Err(format!("event id {} assigned twice", meta.event_id));
            }
        }
    }
    Ok(())
}

async fn publish_preserves_payload_and_pointer<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: EventLog,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let log = factory().await;
    let event = make_event("partReq", 7).with_causal_pointer(Some("peer-3".into()));
    log.publish(&Tags::default(), vec![event.clone()])
        .await
        .map_err(|e| format!("publish failed: {e}"))?;

    let history = log
        .history(&SubscriptionFilter::all())
        .await
        .map_err(|e| format!("history failed: {e}"))?;
    match history.as_slice() {
        [only] if only.payload == event => Ok(()),
        [only] => Err(format!("payload changed: {:?}", only.payload)),
        other => Err(format!("expected 1 event in history, got {}", other.len())),
    }
}

async fn publish_records_tags<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: EventLog,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let log = factory().await;
    let tags = Tags::new(["warehouse"]).with_id("w1");
    let metas = log
        .publish(&tags, vec![MachineEvent::new("a")])
        .await
        .map_err(|e| format!("publish failed: {e}"))?;
    let meta = metas.first().ok_or("no meta returned")?;
    if !tags.is_subset_of(&meta.tags) {
        return Err(format!("meta tags {:?} missing some of {}", meta.tags, tags));
    }
    Ok(())
}

async fn publish_empty_batch_is_a_no_op<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: EventLog,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let log = factory().await;
    let metas = log
        .publish(&Tags::default(), vec![])
        .await
        .map_err(|e| format!("publish failed: {e}"))?;
    if !metas.is_empty() {
        return Err(format!("expected no metas, got {}", metas.len()));
    }
    let history = log
        .history(&SubscriptionFilter::all())
        .await
        .map_err(|e| format!("history failed: {e}"))?;
    if !history.is_empty() {
        return Err(format!("expected empty history, got {}", history.len()));
    }
    Ok(())
}
