use std::future::Future;
use std::time::Duration;

use super::{make_event, receive, types_of, TestResult};
use crate::{EventLog, SubscriptionFilter, Tags};

pub(super) async fn run_filter_tests<L, F, Fut>(factory: &F) -> Vec<TestResult>
where
    L: EventLog,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    vec![
        TestResult::new(
            "filter",
            "tag_filter_selects_tagged_events",
            tag_filter_selects_tagged_events(factory).await,
        ),
        TestResult::new(
            "filter",
            "event_type_filter_selects_types",
            event_type_filter_selects_types(factory).await,
        ),
        TestResult::new(
            "filter",
            "history_respects_filter",
            history_respects_filter(factory).await,
        ),
    ]
}

async fn tag_filter_selects_tagged_events<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: EventLog,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let log = factory().await;
    let mut sub = log
        .subscribe(SubscriptionFilter::tagged(Tags::new(["warehouse"])))
        .await
        .map_err(|e| format!("subscribe failed: {e}"))?;

    log.publish(&Tags::new(["factory"]), vec![make_event("skip", 0)])
        .await
        .map_err(|e| format!("publish failed: {e}"))?;
    log.publish(
        &Tags::new(["warehouse", "factory"]),
        vec![make_event("take", 1)],
    )
    .await
    .map_err(|e| format!("publish failed: {e}"))?;

    let envelope = receive(&mut sub).await?;
    if envelope.payload.event_type != "take" {
        return Err(format!(
            "expected 'take', got '{}'",
            envelope.payload.event_type
        ));
    }
    Ok(())
}

async fn event_type_filter_selects_types<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: EventLog,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let log = factory().await;
    let mut sub = log
        .subscribe(SubscriptionFilter::all().with_event_types(["partReq", "partOK"]))
        .await
        .map_err(|e| format!("subscribe failed: {e}"))?;

    log.publish(
        &Tags::default(),
        vec![
            make_event("partReq", 0),
            make_event("car", 1),
            make_event("partOK", 2),
        ],
    )
    .await
    .map_err(|e| format!("publish failed: {e}"))?;

    let first = receive(&mut sub).await?;
    let second = receive(&mut sub).await?;
    let got = types_of(&[first, second]);
    if got != ["partReq", "partOK"] {
        return Err(format!("expected [partReq, partOK], got {got:?}"));
    }
    if let Ok(Some(extra)) = tokio::time::timeout(Duration::from_millis(50), sub.next()).await {
        return Err(format!(
            "unexpected delivery of '{}'",
            extra.payload.event_type
        ));
    }
    Ok(())
}

async fn history_respects_filter<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: EventLog,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let log = factory().await;
    log.publish(&Tags::new(["a"]), vec![make_event("x", 0)])
        .await
        .map_err(|e| format!("publish failed: {e}"))?;
    log.publish(&Tags::new(["b"]), vec![make_event("y", 1)])
        .await
        .map_err(|e| format!("publish failed: {e}"))?;

    let history = log
        .history(&SubscriptionFilter::tagged(Tags::new(["b"])))
        .await
        .map_err(|e| format!("history failed: {e}"))?;
    let got = types_of(&history);
    if got != ["y"] {
        return Err(format!("expected [y], got {got:?}"));
    }
    Ok(())
}
