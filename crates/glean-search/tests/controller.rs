//! Query controller behaviour under virtual time.
//!
//! # Scenarios covered
//!
//! 1. **Debounce coalescing**: a burst of `set_query` calls issues one search
//!    for the last value.
//! 2. **Idempotence**: repeating a search with unchanged query and text reuses
//!    the committed result. A repeat while the same query is still running
//!    re-issues it.
//! 3. **Last request wins**: a slow, superseded request never overwrites the
//!    newer committed result, even when it ignores cancellation.
//! 4. **Failure isolation**: backend errors are recorded, prior results stay.
//! 5. **Teardown**: `dispose` cancels in-flight work and is idempotent, and a
//!    search future dropped by its caller leaves the controller idle.

mod common;

use common::{ARTICLE, MockEmbedder, StubbornEcho, ms};
use glean_core::SearchItem;
use glean_search::controller::ItemSearch;
use glean_search::{
    ChunkOptions, ControllerConfig, Phase, QueryController, Ranker, SearchError,
    TextSearchController,
};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tokio::time::Instant;

fn text_controller(embedder: &Arc<MockEmbedder>) -> TextSearchController {
    TextSearchController::for_text(
        Ranker::with_embedder(embedder.clone()),
        ChunkOptions {
            min_score: 0.0,
            ..ChunkOptions::default()
        },
        ControllerConfig::text_search(),
        ARTICLE,
    )
}

#[tokio::test(start_paused = true)]
async fn burst_of_keystrokes_issues_one_search_for_last_value() {
    let embedder = MockEmbedder::new();
    let controller = text_controller(&embedder);

    for query in ["po", "poo", "pool", "pool ex", "pool exhaustion"] {
        controller.set_query(query);
        tokio::time::sleep(ms(120)).await;
    }
    assert_eq!(embedder.calls(), 0, "still inside the debounce window");
    assert_eq!(controller.phase(), Phase::Debouncing);
    assert_eq!(controller.query(), "pool exhaustion");

    tokio::time::sleep(ms(400)).await;
    assert_eq!(embedder.calls(), 1);
    assert_eq!(embedder.queries(), ["pool exhaustion"]);
    assert!(!controller.results().is_empty());
    assert_eq!(controller.phase(), Phase::Idle);
}

#[tokio::test(start_paused = true)]
async fn identical_search_reuses_committed_result() {
    let embedder = MockEmbedder::new();
    let controller = text_controller(&embedder);

    let first = controller.search(Some("connection pool")).await;
    let second = controller.search(Some("connection pool")).await;
    assert_eq!(first, second);
    assert_eq!(embedder.calls(), 1);

    controller.set_text(format!("{ARTICLE} Appended sentence about pools."));
    controller.search(None).await;
    assert_eq!(embedder.calls(), 2, "changed text invalidates the cache");
}

#[tokio::test(start_paused = true)]
async fn unchanged_text_keeps_committed_result() {
    let embedder = MockEmbedder::new();
    let controller = text_controller(&embedder);

    let first = controller.search(Some("connection pool")).await;
    controller.set_text(ARTICLE);
    assert_eq!(controller.phase(), Phase::Idle, "no search scheduled");

    let second = controller.search(None).await;
    assert_eq!(first, second);
    assert_eq!(embedder.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn repeated_search_while_running_reissues_and_returns_its_own_results() {
    let embedder = MockEmbedder::new();
    embedder.push_delays([ms(100), ms(100)]);
    let controller = text_controller(&embedder);

    let (first, second) = tokio::join!(controller.search(Some("scheduler retries")), async {
        tokio::time::sleep(ms(10)).await;
        controller.search(Some("scheduler retries")).await
    });
    assert!(first.is_empty(), "the earlier call was superseded");
    assert!(!second.is_empty());
    assert_eq!(controller.results(), second);
    assert_eq!(embedder.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn running_search_never_answers_with_previous_query_results() {
    let (backend, calls) = StubbornEcho::new([ms(0), ms(100), ms(100)]);
    let controller = QueryController::new(backend, ControllerConfig::text_search(), ());

    assert_eq!(controller.search(Some("alpha")).await, ["alpha"]);

    let (first, second) = tokio::join!(controller.search(Some("beta")), async {
        tokio::time::sleep(ms(10)).await;
        controller.search(Some("beta")).await
    });
    assert!(first.is_empty());
    assert_eq!(second, ["beta"]);
    assert_eq!(controller.results(), ["beta"]);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn search_dropped_by_caller_timeout_leaves_controller_idle() {
    let embedder = MockEmbedder::new();
    embedder.push_delays([ms(200)]);
    let controller = text_controller(&embedder);

    let timed_out =
        tokio::time::timeout(ms(50), controller.search(Some("connection pool"))).await;
    assert!(timed_out.is_err());
    assert_eq!(controller.phase(), Phase::Idle);

    tokio::time::sleep(ms(1000)).await;
    assert_eq!(controller.phase(), Phase::Idle);
    assert!(controller.results().is_empty());

    let retried = controller.search(Some("connection pool")).await;
    assert!(!retried.is_empty());
    assert_eq!(embedder.calls(), 2, "the retry reaches the backend");
}

#[tokio::test(start_paused = true)]
async fn superseded_search_is_cancelled_and_discarded() {
    let embedder = MockEmbedder::new();
    embedder.push_delays([ms(500), ms(20)]);
    let controller = text_controller(&embedder);

    let (stale, fresh) = tokio::join!(controller.search(Some("connection pool")), async {
        tokio::time::sleep(ms(50)).await;
        controller.search(Some("documentation code")).await
    });

    assert!(stale.is_empty(), "superseded search returns nothing");
    assert!(!fresh.is_empty());
    assert_eq!(controller.results(), fresh);
    assert!(controller.error().is_none(), "cancellation is not an error");
}

#[tokio::test(start_paused = true)]
async fn late_result_from_stubborn_backend_cannot_overwrite() {
    let (backend, calls) = StubbornEcho::new([ms(500), ms(20)]);
    let controller = QueryController::new(backend, ControllerConfig::text_search(), ());

    let (stale, fresh) = tokio::join!(controller.search(Some("first")), async {
        tokio::time::sleep(ms(50)).await;
        let fresh = controller.search(Some("second")).await;
        assert_eq!(controller.results(), ["second"]);
        fresh
    });

    // The first call ran to completion at t=500, long after "second" committed.
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(stale.is_empty());
    assert_eq!(fresh, ["second"]);
    assert_eq!(controller.results(), ["second"]);
    assert_eq!(controller.query(), "second");
    assert_eq!(controller.phase(), Phase::Idle);
}

#[tokio::test(start_paused = true)]
async fn debounced_search_supersedes_running_one() {
    let (backend, _) = StubbornEcho::new([ms(1_000), ms(10)]);
    let controller = QueryController::new(backend, ControllerConfig::text_search(), ());

    let (stale, ()) = tokio::join!(controller.search(Some("slow")), async {
        tokio::time::sleep(ms(50)).await;
        controller.set_query("quick");
        tokio::time::sleep(ms(400)).await;
        assert_eq!(controller.results(), ["quick"]);
    });

    assert!(stale.is_empty());
    assert_eq!(controller.results(), ["quick"]);
}

#[tokio::test(start_paused = true)]
async fn backend_failure_is_recorded_and_results_survive() {
    let embedder = MockEmbedder::new();
    let controller = text_controller(&embedder);

    let committed = controller.search(Some("connection pool")).await;
    assert!(!committed.is_empty());

    embedder.set_failing(true);
    let failed = controller.search(Some("request timeouts")).await;
    assert!(failed.is_empty());
    assert_eq!(controller.results(), committed);
    assert_eq!(controller.phase(), Phase::Idle);

    let err = controller.error().expect("failure should be visible");
    assert!(matches!(err, SearchError::BackendFailure(_)));
    assert_eq!(err.code().code(), "E3003");

    embedder.set_failing(false);
    controller.search(Some("request timeouts")).await;
    assert!(controller.error().is_none(), "success clears the error");
}

#[tokio::test(start_paused = true)]
async fn invalid_response_is_surfaced_for_passages() {
    let embedder = MockEmbedder::new();
    embedder.set_short_response(true);
    let controller = text_controller(&embedder);

    controller.search(Some("connection pool")).await;
    assert!(matches!(
        controller.error(),
        Some(SearchError::InvalidEmbeddingResponse(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn short_query_clears_without_searching() {
    let embedder = MockEmbedder::new();
    let controller = text_controller(&embedder);
    controller.search(Some("connection pool")).await;

    controller.set_query("c");
    assert!(controller.results().is_empty());
    assert_eq!(controller.phase(), Phase::Idle);

    tokio::time::sleep(ms(1_000)).await;
    assert_eq!(embedder.calls(), 1);
    assert_eq!(controller.query(), "c");
}

#[tokio::test(start_paused = true)]
async fn short_query_supersedes_running_search() {
    let embedder = MockEmbedder::new();
    embedder.push_delays([ms(300)]);
    let controller = text_controller(&embedder);
    let started = Instant::now();

    let (running, ()) = tokio::join!(controller.search(Some("connection pool")), async {
        tokio::time::sleep(ms(20)).await;
        controller.set_query("");
    });

    assert!(running.is_empty());
    assert!(controller.results().is_empty());
    assert!(started.elapsed() < ms(300), "embedding call was abandoned");
}

#[tokio::test(start_paused = true)]
async fn dispose_cancels_in_flight_and_is_idempotent() {
    let embedder = MockEmbedder::new();
    embedder.push_delays([ms(300)]);
    let controller = text_controller(&embedder);
    let started = Instant::now();

    let (result, ()) = tokio::join!(controller.search(Some("connection pool")), async {
        tokio::time::sleep(ms(20)).await;
        controller.dispose();
        controller.dispose();
    });

    assert!(result.is_empty());
    assert!(started.elapsed() < ms(300), "embedding call was abandoned");
    assert!(controller.results().is_empty());
    assert!(controller.error().is_none());
    assert!(controller.is_disposed());

    controller.set_query("documentation");
    tokio::time::sleep(ms(1_000)).await;
    assert_eq!(embedder.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn dropping_controller_cancels_pending_debounce() {
    let embedder = MockEmbedder::new();
    {
        let controller = text_controller(&embedder);
        controller.set_query("connection pool");
    }
    tokio::time::sleep(ms(1_000)).await;
    assert_eq!(embedder.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn item_selection_falls_back_to_lexical_on_failure() {
    let embedder = MockEmbedder::new();
    embedder.set_failing(true);
    let items: Vec<SearchItem> = vec![
        SearchItem::new("1", "Cat"),
        SearchItem::new("2", "Dog"),
    ];
    let controller = QueryController::new(
        ItemSearch::new(Ranker::with_embedder(embedder.clone())),
        ControllerConfig::item_select(),
        Arc::from(items),
    );

    let ranked = controller.search(Some("cat")).await;
    assert_eq!(ranked[0].item.label, "Cat");
    assert!((ranked[0].score - 1.0).abs() < 1e-6);
    assert!(controller.error().is_none());
    assert_eq!(embedder.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn snapshots_track_phase_transitions() {
    let embedder = MockEmbedder::new();
    embedder.push_delays([ms(100)]);
    let controller = text_controller(&embedder);
    let rx = controller.subscribe();

    controller.set_query("scheduler");
    assert_eq!(rx.borrow().phase, Phase::Debouncing);

    tokio::time::sleep(ms(350)).await;
    assert_eq!(rx.borrow().phase, Phase::Searching);
    assert_eq!(rx.borrow().query, "scheduler");

    tokio::time::sleep(ms(100)).await;
    let snapshot = rx.borrow().clone();
    assert_eq!(snapshot.phase, Phase::Idle);
    assert!(!snapshot.results.is_empty());
    assert_eq!(snapshot.results, controller.results());
}
