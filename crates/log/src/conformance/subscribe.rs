use std::future::Future;

use super::{make_event, receive, receive_n, types_of, TestResult};
use crate::{EventLog, SubscriptionFilter, Tags};

pub(super) async fn run_subscribe_tests<L, F, Fut>(factory: &F) -> Vec<TestResult>
where
    L: EventLog,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    vec![
        TestResult::new(
            "subscribe",
            "subscribe_replays_history_in_order",
            subscribe_replays_history_in_order(factory).await,
        ),
        TestResult::new(
            "subscribe",
            "subscribe_receives_live_events",
            subscribe_receives_live_events(factory).await,
        ),
        TestResult::new(
            "subscribe",
            "history_then_live_without_gaps",
            history_then_live_without_gaps(factory).await,
        ),
        TestResult::new(
            "subscribe",
            "subscribers_observe_one_order",
            subscribers_observe_one_order(factory).await,
        ),
        TestResult::new(
            "subscribe",
            "dropped_subscription_does_not_block_publish",
            dropped_subscription_does_not_block_publish(factory).await,
        ),
    ]
}

async fn subscribe_replays_history_in_order<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: EventLog,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let log = factory().await;
    log.publish(
        &Tags::default(),
        vec![make_event("a", 0), make_event("b", 1), make_event("c", 2)],
    )
    .await
    .map_err(|e| format!("publish failed: {e}"))?;

    let mut sub = log
        .subscribe(SubscriptionFilter::all())
        .await
        .map_err(|e| format!("subscribe failed: {e}"))?;
    let got = types_of(&receive_n(&mut sub, 3).await?);
    if got != ["a", "b", "c"] {
        return Err(format!("expected [a, b, c], got {got:?}"));
    }
    Ok(())
}

async fn subscribe_receives_live_events<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: EventLog,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let log = factory().await;
    let mut sub = log
        .subscribe(SubscriptionFilter::all())
        .await
        .map_err(|e| format!("subscribe failed: {e}"))?;
    let metas = log
        .publish(&Tags::default(), vec![make_event("live", 0)])
        .await
        .map_err(|e| format!("publish failed: {e}"))?;

    let envelope = receive(&mut sub).await?;
    if envelope.meta.event_id != metas[0].event_id {
        return Err(format!(
            "delivered event id {} differs from published {}",
            envelope.meta.event_id, metas[0].event_id
        ));
    }
    Ok(())
}

async fn history_then_live_without_gaps<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: EventLog,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let log = factory().await;
    log.publish(&Tags::default(), vec![make_event("old", 0)])
        .await
        .map_err(|e| format!("publish failed: {e}"))?;
    let mut sub = log
        .subscribe(SubscriptionFilter::all())
        .await
        .map_err(|e| format!("subscribe failed: {e}"))?;
    log.publish(&Tags::default(), vec![make_event("new", 1)])
        .await
        .map_err(|e| format!("publish failed: {e}"))?;

    let got = types_of(&receive_n(&mut sub, 2).await?);
    if got != ["old", "new"] {
        return Err(format!("expected [old, new], got {got:?}"));
    }
    Ok(())
}

async fn subscribers_observe_one_order<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: EventLog,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let log = factory().await;
    let mut first = log
        .subscribe(SubscriptionFilter::all())
        .await
        .map_err(|e| format!("subscribe failed: {e}"))?;
    for n in 0..4 {
        log.publish(&Tags::default(), vec![make_event("e", n)])
            .await
            .map_err(|e| format!("publish failed: {e}"))?;
    }
    let mut second = log
        .subscribe(SubscriptionFilter::all())
        .await
        .map_err(|e| format!("subscribe failed: {e}"))?;

    let a: Vec<_> = receive_n(&mut first, 4)
        .await?
        .into_iter()
        .map(|e| e.meta.event_id)
        .collect();
    let b: Vec<_> = receive_n(&mut second, 4)
        .await?
        .into_iter()
        .map(|e| e.meta.event_id)
        .collect();
    if a != b {
        return Err(format!("subscribers disagree on order: {a:?} vs {b:?}"));
    }
    Ok(())
}

async fn dropped_subscription_does_not_block_publish<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: EventLog,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let log = factory().await;
    let sub = log
        .subscribe(SubscriptionFilter::all())
        .await
        .map_err(|e| format!("subscribe failed: {e}"))?;
    drop(sub);
    for n in 0..3 {
        log.publish(&Tags::default(), vec![make_event("after-drop", n)])
            .await
            .map_err(|e| format!("publish after drop failed: {e}"))?;
    }
    Ok(())
}
