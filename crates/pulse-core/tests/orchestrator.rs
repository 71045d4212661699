//! Integration tests for panel orchestration against mock transport.
//!
//! Fetch ordering is controlled with `MockQueryExecutor::gate`, so each
//! test decides exactly when a request settles.

use std::sync::Arc;
use std::time::Duration;

use pulse_core::fetch::mock::{MockDecoder, MockQueryExecutor, test_table};
use pulse_core::panel::SkipReason;
use pulse_core::{
    FetchDispatch, FetchError, FetchOutcome, InMemoryReporter, LoadingPhase, PanelError,
    PanelProps, PanelRender, PanelSession, Query, QueryOrchestrator, RefreshClock,
};

struct Harness {
    clock: Arc<RefreshClock>,
    executor: Arc<MockQueryExecutor>,
    decoder: Arc<MockDecoder>,
    reporter: Arc<InMemoryReporter>,
    panel: QueryOrchestrator,
}

fn harness(executor: MockQueryExecutor, decoder: MockDecoder) -> Harness {
    let clock = Arc::new(RefreshClock::new(Duration::from_secs(10)));
    let executor = Arc::new(executor);
    let decoder = Arc::new(decoder);
    let reporter = Arc::new(InMemoryReporter::new());
    let panel = QueryOrchestrator::builder("cpu", clock.clone(), executor.clone(), decoder.clone())
        .reporter(reporter.clone())
        .build()
        .unwrap();

    Harness {
        clock,
        executor,
        decoder,
        reporter,
        panel,
    }
}

fn props(texts: &[&str]) -> PanelProps {
    PanelProps::new("/query", texts.iter().map(|t| Query::new(*t)).collect())
}

/// Yield until the executor has seen `n` calls.
async fn wait_for_calls(executor: &MockQueryExecutor, n: usize) {
    for _ in 0..1000 {
        if executor.call_count() >= n {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!(
        "executor saw {} calls, expected {n}",
        executor.call_count()
    );
}

async fn wait_for_phase(panel: &QueryOrchestrator, phase: LoadingPhase) -> PanelSession {
    let mut rx = panel.watch();
    let session = tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|s| s.phase == phase))
        .await
        .expect("timed out waiting for phase")
        .expect("session channel closed");
    session.clone()
}

#[tokio::test]
async fn test_single_query_with_rows_renders_ready() {
    let h = harness(
        MockQueryExecutor::new().with_response("q1", "body"),
        MockDecoder::new().with_tables("body", vec![test_table("t", 3)]),
    );

    let pending = h.panel.activate(props(&["q1"])).unwrap().into_pending().unwrap();
    assert_eq!(h.panel.render(), Some(PanelRender::Loading));

    let outcome = pending.outcome().await.unwrap();
    assert_eq!(
        outcome,
        FetchOutcome::Applied {
            generation: 1,
            table_count: 1
        }
    );

    let session = h.panel.session().unwrap();
    assert_eq!(session.phase, LoadingPhase::Done);
    assert!(session.is_first_fetch);
    assert!(session.last_updated.is_some());
    match h.panel.render().unwrap() {
        PanelRender::Ready(view) => assert_eq!(view.tables[0].row_count(), 3),
        other => panic!("expected Ready, got {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_queries_finish_without_fetching() {
    let h = harness(MockQueryExecutor::new(), MockDecoder::new());

    let dispatch = h.panel.activate(props(&[])).unwrap();
    assert!(matches!(dispatch, FetchDispatch::Cleared));

    let session = h.panel.session().unwrap();
    assert_eq!(session.phase, LoadingPhase::Done);
    assert!(session.tables.is_empty());
    assert_eq!(h.executor.call_count(), 0);
    assert_eq!(h.panel.render(), Some(PanelRender::Empty));
}

#[tokio::test]
async fn test_identical_props_are_a_no_op() {
    let h = harness(
        MockQueryExecutor::new()
            .with_response("a", "body")
            .with_response("b", "body"),
        MockDecoder::new().with_tables("body", vec![test_table("t", 1)]),
    );

    let pending = h.panel.activate(props(&["a", "b"])).unwrap().into_pending().unwrap();
    pending.outcome().await.unwrap();
    let before = h.panel.session().unwrap();

    let dispatch = h.panel.on_props_changed(props(&["b", "a"])).unwrap();
    assert!(matches!(dispatch, FetchDispatch::Skipped(SkipReason::Unchanged)));
    assert_eq!(h.executor.call_count(), 2);
    assert_eq!(h.panel.session().unwrap(), before);
}

#[tokio::test]
async fn test_changed_query_set_refetches() {
    let h = harness(
        MockQueryExecutor::new()
            .with_response("a", "body")
            .with_response("b", "body")
            .with_response("c", "body"),
        MockDecoder::new().with_tables("body", vec![test_table("t", 1)]),
    );

    let pending = h.panel.activate(props(&["a", "b"])).unwrap().into_pending().unwrap();
    pending.outcome().await.unwrap();

    let pending = h
        .panel
        .on_props_changed(props(&["b", "c"]))
        .unwrap()
        .into_pending()
        .unwrap();
    assert!(!h.panel.session().unwrap().is_first_fetch);
    assert!(pending.outcome().await.unwrap().is_applied());

    let queried: Vec<String> = h.executor.calls().into_iter().map(|c| c.query).collect();
    assert_eq!(queried, vec!["a", "b", "b", "c"]);
}

#[tokio::test]
async fn test_newer_fetch_wins_when_older_settles_last() {
    let h = harness(
        MockQueryExecutor::new(),
        MockDecoder::new()
            .with_tables("old", vec![test_table("old", 1)])
            .with_tables("new", vec![test_table("new", 2)]),
    );

    let first_gate = h.executor.gate();
    let second_gate = h.executor.gate();

    let first = h.panel.activate(props(&["q"])).unwrap().into_pending().unwrap();
    wait_for_calls(&h.executor, 1).await;
    let second = h.panel.refresh().into_pending().unwrap();
    wait_for_calls(&h.executor, 2).await;
    assert!(second.generation() > first.generation());

    second_gate.resolve("new");
    assert!(second.outcome().await.unwrap().is_applied());

    first_gate.resolve("old");
    assert!(first.outcome().await.unwrap().is_stale());

    let session = h.panel.session().unwrap();
    assert_eq!(session.phase, LoadingPhase::Done);
    assert_eq!(session.tables[0].id, "new");
    assert_eq!(h.decoder.decode_count(), 1);
}

#[tokio::test]
async fn test_deactivate_while_loading_discards_result() {
    let h = harness(
        MockQueryExecutor::new(),
        MockDecoder::new().with_tables("body", vec![test_table("t", 1)]),
    );
    let gate = h.executor.gate();

    let pending = h.panel.activate(props(&["q"])).unwrap().into_pending().unwrap();
    wait_for_calls(&h.executor, 1).await;

    let mut rx = h.panel.watch();
    rx.borrow_and_update();

    let last = h.panel.deactivate().unwrap();
    assert_eq!(last.phase, LoadingPhase::Loading);
    assert!(!h.panel.is_active());
    assert_eq!(h.clock.subscriber_count(), 0);

    gate.resolve("body");
    assert!(pending.outcome().await.unwrap().is_stale());
    assert!(!rx.has_changed().unwrap());
    assert_eq!(h.decoder.decode_count(), 0);
    assert!(h.panel.session().is_none());
}

#[tokio::test]
async fn test_transport_failure_leaves_panel_loading() {
    let h = harness(
        MockQueryExecutor::new().with_error(
            "q",
            FetchError::Transport {
                message: "connection reset".to_string(),
            },
        ),
        MockDecoder::new(),
    );

    let pending = h.panel.activate(props(&["q"])).unwrap().into_pending().unwrap();
    match pending.outcome().await.unwrap() {
        FetchOutcome::Failed { error, .. } => {
            assert!(matches!(error, FetchError::Transport { .. }));
        }
        other => panic!("expected Failed, got {other:?}"),
    }

    let session = h.panel.session().unwrap();
    assert_eq!(session.phase, LoadingPhase::Loading);
    assert!(session.fault.is_none());
    assert_eq!(h.reporter.count(), 0);
}

#[tokio::test]
async fn test_decode_fault_moves_panel_to_error() {
    let h = harness(
        MockQueryExecutor::new().with_response("q", "garbage"),
        MockDecoder::new(),
    );

    let pending = h.panel.activate(props(&["q"])).unwrap().into_pending().unwrap();
    let result = pending.outcome().await;
    assert!(matches!(result, Err(PanelError::DecodeFault { generation: 1, .. })));

    let session = h.panel.session().unwrap();
    assert_eq!(session.phase, LoadingPhase::Error);
    assert!(session.fault.unwrap().contains("garbage"));

    let reports = h.reporter.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].component, "panel:cpu");
    assert_eq!(reports[0].error_code, "PANEL_DECODE_FAULT");
}

#[tokio::test]
async fn test_hidden_panel_skips_fetches_until_shown() {
    let h = harness(
        MockQueryExecutor::new().with_response("q", "body"),
        MockDecoder::new().with_tables("body", vec![test_table("t", 1)]),
    );

    let dispatch = h.panel.activate(props(&["q"]).with_visible(false)).unwrap();
    assert!(matches!(dispatch, FetchDispatch::Skipped(SkipReason::Hidden)));
    assert_eq!(h.panel.session().unwrap().phase, LoadingPhase::NotStarted);

    h.clock.tick();
    assert!(matches!(h.panel.refresh(), FetchDispatch::Skipped(SkipReason::Hidden)));
    assert_eq!(h.executor.call_count(), 0);

    let pending = h
        .panel
        .on_props_changed(props(&["q"]))
        .unwrap()
        .into_pending()
        .unwrap();
    assert!(pending.outcome().await.unwrap().is_applied());
    assert_eq!(h.executor.call_count(), 1);
}

#[tokio::test]
async fn test_clock_tick_refetches_active_panel() {
    let h = harness(
        MockQueryExecutor::new().with_response("q", "body"),
        MockDecoder::new().with_tables("body", vec![test_table("t", 1)]),
    );

    let pending = h.panel.activate(props(&["q"])).unwrap().into_pending().unwrap();
    pending.outcome().await.unwrap();
    let first_update = h.panel.session().unwrap().last_updated;

    let summary = h.clock.tick();
    assert_eq!(summary.delivered, 1);

    let session = h.panel.session().unwrap();
    assert_eq!(session.phase, LoadingPhase::Loading);
    assert!(!session.is_first_fetch);
    // A refresh keeps showing the previous tables.
    assert!(matches!(h.panel.render(), Some(PanelRender::Ready(_))));

    let session = wait_for_phase(&h.panel, LoadingPhase::Done).await;
    assert_eq!(h.executor.call_count(), 2);
    assert!(session.last_updated >= first_update);
}

#[tokio::test]
async fn test_tick_after_deactivate_does_nothing() {
    let h = harness(
        MockQueryExecutor::new().with_response("q", "body"),
        MockDecoder::new().with_tables("body", vec![test_table("t", 1)]),
    );

    let pending = h.panel.activate(props(&["q"])).unwrap().into_pending().unwrap();
    pending.outcome().await.unwrap();
    h.panel.deactivate();

    let summary = h.clock.tick();
    assert_eq!(summary.delivered, 0);
    tokio::task::yield_now().await;
    assert_eq!(h.executor.call_count(), 1);
}

#[tokio::test]
async fn test_tick_fetch_goes_stale_after_deactivate() {
    let h = harness(
        MockQueryExecutor::new().with_response("q", "body"),
        MockDecoder::new().with_tables("body", vec![test_table("t", 1)]),
    );

    let pending = h.panel.activate(props(&["q"])).unwrap().into_pending().unwrap();
    pending.outcome().await.unwrap();

    let gate = h.executor.gate();
    h.clock.tick();
    wait_for_calls(&h.executor, 2).await;
    h.panel.deactivate();

    gate.resolve("body");
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert_eq!(h.decoder.decode_count(), 1);
}

#[tokio::test]
async fn test_second_activation_is_rejected_and_reported() {
    let h = harness(MockQueryExecutor::new(), MockDecoder::new());

    h.panel.activate(props(&[])).unwrap();
    let result = h.panel.activate(props(&[]));

    assert!(matches!(result, Err(PanelError::AlreadyActive { .. })));
    assert_eq!(h.reporter.reports()[0].error_code, "PANEL_ALREADY_ACTIVE");
    assert_eq!(h.clock.subscriber_count(), 1);
}

#[tokio::test]
async fn test_props_change_on_inactive_panel_fails() {
    let h = harness(MockQueryExecutor::new(), MockDecoder::new());

    let result = h.panel.on_props_changed(props(&["q"]));
    assert!(matches!(result, Err(PanelError::NotActive { .. })));
    assert!(matches!(h.panel.refresh(), FetchDispatch::Skipped(SkipReason::Inactive)));
    assert!(h.panel.deactivate().is_none());
}

#[tokio::test]
async fn test_clearing_queries_drops_in_flight_result() {
    let h = harness(
        MockQueryExecutor::new(),
        MockDecoder::new().with_tables("body", vec![test_table("t", 1)]),
    );
    let gate = h.executor.gate();

    let pending = h.panel.activate(props(&["q"])).unwrap().into_pending().unwrap();
    wait_for_calls(&h.executor, 1).await;

    let dispatch = h.panel.on_props_changed(props(&[])).unwrap();
    assert!(matches!(dispatch, FetchDispatch::Cleared));

    gate.resolve("body");
    assert!(pending.outcome().await.unwrap().is_stale());
    let session = h.panel.session().unwrap();
    assert_eq!(session.phase, LoadingPhase::Done);
    assert!(session.tables.is_empty());
}

#[tokio::test]
async fn test_hiding_with_new_link_discards_in_flight_result() {
    let h = harness(
        MockQueryExecutor::new(),
        MockDecoder::new().with_tables("old", vec![test_table("old", 1)]),
    );
    let gate = h.executor.gate();

    let activate = PanelProps::new("/source-a", vec![Query::new("old-q")]);
    let pending = h.panel.activate(activate).unwrap().into_pending().unwrap();
    wait_for_calls(&h.executor, 1).await;

    let hidden = PanelProps::new("/source-b", vec![Query::new("new-q")]).with_visible(false);
    let dispatch = h.panel.on_props_changed(hidden).unwrap();
    assert!(matches!(dispatch, FetchDispatch::Skipped(SkipReason::Hidden)));

    gate.resolve("old");
    assert!(pending.outcome().await.unwrap().is_stale());

    let session = h.panel.session().unwrap();
    assert_eq!(session.link, "/source-b");
    assert!(session.tables.is_empty());
    assert_eq!(h.decoder.decode_count(), 0);
}

#[tokio::test]
async fn test_dropping_orchestrator_unsubscribes() {
    let h = harness(MockQueryExecutor::new(), MockDecoder::new());
    h.panel.activate(props(&[])).unwrap();
    assert_eq!(h.clock.subscriber_count(), 1);

    let clock = h.clock.clone();
    drop(h);
    assert_eq!(clock.subscriber_count(), 0);
}

#[tokio::test]
async fn test_panels_share_one_clock() {
    let clock = Arc::new(RefreshClock::new(Duration::from_secs(10)));
    let executor = Arc::new(MockQueryExecutor::new().with_response("q", "body"));
    let decoder = Arc::new(MockDecoder::new().with_tables("body", vec![test_table("t", 1)]));

    let panels: Vec<QueryOrchestrator> = ["cpu", "mem", "disk"]
        .iter()
        .map(|id| {
            QueryOrchestrator::new(*id, clock.clone(), executor.clone(), decoder.clone()).unwrap()
        })
        .collect();

    for panel in &panels {
        panel
            .activate(props(&["q"]))
            .unwrap()
            .into_pending()
            .unwrap()
            .outcome()
            .await
            .unwrap();
    }
    assert_eq!(clock.subscriber_count(), 3);

    let summary = clock.tick();
    assert_eq!(summary.delivered, 3);
    wait_for_calls(&executor, 6).await;

    panels[1].deactivate();
    assert_eq!(clock.tick().delivered, 2);
}
