//! Integration tests for the combinator engine.
//!
//! Time is paused: sleeps advance virtual time, so latencies are exact.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use promise_rs::config::Options;
use promise_rs::engine::Engine;
use promise_rs::error::Failure;
use promise_rs::model::{Completion, Outcome, Workload};
use tokio::time::{Instant, sleep};

fn test_engine() -> Engine {
    Engine::new(Options::default())
}

/// Sleep `ms`, then succeed with `value`.
fn ok_after(value: i64, ms: u64) -> Workload<i64> {
    Workload::new(move || async move {
        sleep(Duration::from_millis(ms)).await;
        Outcome::Success(value)
    })
}

/// Sleep `ms`, then fail with `message`.
fn err_after(message: &'static str, ms: u64) -> Workload<i64> {
    Workload::new(move || async move {
        sleep(Duration::from_millis(ms)).await;
        Outcome::Failure(Failure::rejected(message))
    })
}

/// Sleep `ms`, succeed with `value`, and bump `finished` on the way out.
fn counted(value: i64, ms: u64, finished: &Arc<AtomicUsize>) -> Workload<i64> {
    let finished = Arc::clone(finished);
    Workload::new(move || {
        let finished = Arc::clone(&finished);
        async move {
            sleep(Duration::from_millis(ms)).await;
            finished.fetch_add(1, Ordering::SeqCst);
            Outcome::Success(value)
        }
    })
}

fn explode() -> Outcome<i64> {
    panic!("kaboom")
}

/// Panics while building its future, before anything is polled.
fn explode_on_call() -> Workload<i64> {
    Workload::new(|| -> std::future::Ready<Outcome<i64>> { panic!("kaboom before await") })
}

// ---------------------------------------------------------------------------
// all_settled
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn all_settled_returns_every_outcome_in_submission_order() {
    let engine = test_engine();
    let got = engine
        .all_settled(vec![
            ok_after(1, 300),
            err_after("second", 100),
            ok_after(3, 200),
        ])
        .await;

    assert_eq!(
        got,
        vec![
            Completion::success(0, 1),
            Completion::failure(1, Failure::rejected("second")),
            Completion::success(2, 3),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn all_settled_on_empty_input_is_empty() {
    let got = test_engine().all_settled(Vec::<Workload<i64>>::new()).await;
    assert!(got.is_empty());
}

#[tokio::test(start_paused = true)]
async fn all_settled_handles_many_workloads() {
    let workloads = (0..100).map(|i| ok_after(i, 1000)).collect();
    let got = test_engine().all_settled(workloads).await;

    assert_eq!(got.len(), 100);
    for (i, completion) in got.iter().enumerate() {
        assert_eq!(completion, &Completion::success(i, i as i64));
    }
}

#[tokio::test(start_paused = true)]
async fn all_settled_reports_panics_as_failures() {
    let got = test_engine()
        .all_settled(vec![ok_after(1, 10), Workload::new(|| async { explode() })])
        .await;

    assert_eq!(got.len(), 2);
    assert_eq!(got[0], Completion::success(0, 1));
    assert_eq!(got[1].idx, 1);
    assert!(matches!(
        got[1].outcome,
        Outcome::Failure(Failure::Panicked { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn all_settled_reports_panics_raised_before_the_future_exists() {
    let got = test_engine()
        .all_settled(vec![Workload::value(1), explode_on_call()])
        .await;

    assert_eq!(got.len(), 2);
    assert_eq!(got[0], Completion::success(0, 1));
    assert_eq!(got[1].idx, 1);
    assert!(matches!(
        got[1].outcome,
        Outcome::Failure(Failure::Panicked { .. })
    ));
}

// ---------------------------------------------------------------------------
// all
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn all_resolves_every_success_in_order() {
    let got = test_engine()
        .all(vec![ok_after(1, 1000), ok_after(2, 1000), ok_after(3, 1000)])
        .await;

    assert_eq!(
        got,
        vec![
            Completion::success(0, 1),
            Completion::success(1, 2),
            Completion::success(2, 3),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn all_rejects_on_first_failure_without_waiting() {
    let start = Instant::now();
    let got = test_engine()
        .all(vec![ok_after(1, 1000), err_after("2", 2000), ok_after(3, 3000)])
        .await;

    assert_eq!(got, vec![Completion::failure(1, Failure::rejected("2"))]);
    assert!(start.elapsed() < Duration::from_millis(3000));
}

#[tokio::test(start_paused = true)]
async fn all_with_many_failures_returns_exactly_one() {
    let workloads = (0..1000).map(|_| err_after("network", 1000)).collect();
    let got = test_engine().all(workloads).await;

    assert_eq!(got.len(), 1);
    assert_eq!(got[0].outcome, Outcome::Failure(Failure::rejected("network")));
}

#[tokio::test(start_paused = true)]
async fn all_rejects_with_an_immediate_failure() {
    let got = test_engine()
        .all(vec![
            ok_after(1, 1000),
            Workload::failing(Failure::rejected("now")),
        ])
        .await;

    assert_eq!(got, vec![Completion::failure(1, Failure::rejected("now"))]);
}

#[tokio::test(start_paused = true)]
async fn all_rejects_when_a_command_panics_on_call() {
    let got = test_engine()
        .all(vec![Workload::value(1), explode_on_call()])
        .await;

    assert_eq!(got.len(), 1);
    assert_eq!(got[0].idx, 1);
    assert!(matches!(
        got[0].outcome,
        Outcome::Failure(Failure::Panicked { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn all_on_empty_input_is_empty() {
    assert!(test_engine().all(Vec::<Workload<i64>>::new()).await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn survivors_keep_running_after_all_short_circuits() {
    let finished = Arc::new(AtomicUsize::new(0));
    let got = test_engine()
        .all(vec![
            counted(1, 500, &finished),
            err_after("early", 100),
            counted(3, 900, &finished),
        ])
        .await;

    assert_eq!(got, vec![Completion::failure(1, Failure::rejected("early"))]);
    assert_eq!(finished.load(Ordering::SeqCst), 0);

    sleep(Duration::from_millis(1000)).await;
    assert_eq!(finished.load(Ordering::SeqCst), 2);
}

// ---------------------------------------------------------------------------
// race
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn race_returns_fastest_outcome_at_index_zero() {
    let got = test_engine()
        .race(vec![ok_after(1, 2000), ok_after(2, 2000), err_after("fast", 1000)])
        .await;

    assert_eq!(
        got,
        Some(Completion::failure(0, Failure::rejected("fast")))
    );
}

#[tokio::test(start_paused = true)]
async fn race_of_successes_picks_fastest_value() {
    let got = test_engine()
        .race(vec![ok_after(1, 300), ok_after(2, 200), ok_after(3, 100)])
        .await;

    assert_eq!(got, Some(Completion::success(0, 3)));
}

#[tokio::test(start_paused = true)]
async fn race_indexed_reports_winning_position() {
    let got = test_engine()
        .race_indexed(vec![ok_after(1, 300), ok_after(2, 200), ok_after(3, 100)])
        .await;

    assert_eq!(got, Some(Completion::success(2, 3)));
}

#[tokio::test(start_paused = true)]
async fn race_on_empty_input_is_none() {
    assert_eq!(test_engine().race(Vec::<Workload<i64>>::new()).await, None);
}

#[tokio::test(start_paused = true)]
async fn race_losers_run_to_completion() {
    let finished = Arc::new(AtomicUsize::new(0));
    let workloads = (0..100).map(|i| counted(i, 100 + i as u64, &finished)).collect();

    let got = test_engine().race(workloads).await;
    assert_eq!(got, Some(Completion::success(0, 0)));

    sleep(Duration::from_millis(500)).await;
    assert_eq!(finished.load(Ordering::SeqCst), 100);
}

// ---------------------------------------------------------------------------
// any
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn any_returns_first_success() {
    let got = test_engine()
        .any(vec![
            ok_after(1, 1000),
            err_after("workload 2", 100),
            err_after("workload 3", 200),
        ])
        .await;

    assert_eq!(got, vec![Completion::success(0, 1)]);
}

#[tokio::test(start_paused = true)]
async fn any_returns_all_failures_when_nothing_succeeds() {
    let got = test_engine()
        .any(vec![
            err_after("workload 1", 300),
            err_after("workload 2", 100),
            err_after("workload 3", 200),
        ])
        .await;

    assert_eq!(
        got,
        vec![
            Completion::failure(0, Failure::rejected("workload 1")),
            Completion::failure(1, Failure::rejected("workload 2")),
            Completion::failure(2, Failure::rejected("workload 3")),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn any_on_empty_input_is_empty() {
    assert!(test_engine().any(Vec::<Workload<i64>>::new()).await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn any_with_many_workloads_returns_one() {
    let workloads = (0..100).map(|i| ok_after(i, 1000)).collect();
    assert_eq!(test_engine().any(workloads).await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn any_returns_the_panic_when_nothing_succeeds() {
    let got = test_engine()
        .any(vec![explode_on_call(), err_after("slow", 100)])
        .await;

    assert_eq!(got.len(), 2);
    assert!(matches!(
        got[0].outcome,
        Outcome::Failure(Failure::Panicked { .. })
    ));
    assert_eq!(got[1], Completion::failure(1, Failure::rejected("slow")));
}

// ---------------------------------------------------------------------------
// some
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn some_rejects_count_larger_than_input() {
    let got = test_engine()
        .some(vec![ok_after(1, 10), ok_after(2, 10), ok_after(3, 10)], 4)
        .await;

    assert_eq!(
        got,
        vec![Completion::failure(0, Failure::Range { count: 4, len: 3 })]
    );
}

#[tokio::test(start_paused = true)]
async fn some_rejects_empty_input() {
    let got = test_engine().some(Vec::<Workload<i64>>::new(), 1).await;
    assert_eq!(
        got,
        vec![Completion::failure(0, Failure::Range { count: 1, len: 0 })]
    );
}

#[tokio::test(start_paused = true)]
async fn some_with_zero_count_launches_nothing() {
    let finished = Arc::new(AtomicUsize::new(0));
    let got = test_engine()
        .some(vec![counted(1, 10, &finished), counted(2, 10, &finished)], 0)
        .await;

    assert!(got.is_empty());
    sleep(Duration::from_millis(100)).await;
    assert_eq!(finished.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn some_returns_fastest_successes_in_submission_order() {
    let got = test_engine()
        .some(vec![ok_after(1, 300), ok_after(2, 100), ok_after(3, 200)], 2)
        .await;

    assert_eq!(
        got,
        vec![Completion::success(1, 2), Completion::success(2, 3)]
    );
}

#[tokio::test(start_paused = true)]
async fn some_skips_failures_while_successes_are_reachable() {
    let got = test_engine()
        .some(
            vec![err_after("a", 10), ok_after(2, 200), ok_after(3, 100)],
            2,
        )
        .await;

    assert_eq!(
        got,
        vec![Completion::success(1, 2), Completion::success(2, 3)]
    );
}

#[tokio::test(start_paused = true)]
async fn some_rejects_with_all_failures_when_count_unreachable() {
    let got = test_engine()
        .some(vec![err_after("1", 100), err_after("2", 100), ok_after(3, 100)], 2)
        .await;

    assert_eq!(
        got,
        vec![
            Completion::failure(0, Failure::rejected("1")),
            Completion::failure(1, Failure::rejected("2")),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn some_rejects_when_last_completion_is_a_success() {
    let got = test_engine()
        .some(vec![err_after("1", 100), ok_after(2, 200)], 2)
        .await;

    assert_eq!(got, vec![Completion::failure(0, Failure::rejected("1"))]);
}

#[tokio::test(start_paused = true)]
async fn some_with_mixed_batch_returns_exact_count() {
    let workloads = (0..100)
        .map(|i| {
            if i < 50 {
                ok_after(i, 1000)
            } else {
                err_after("failed", 1000)
            }
        })
        .collect();

    let got = test_engine().some(workloads, 40).await;
    assert_eq!(got.len(), 40);
    assert!(got.iter().all(Completion::is_success));
    assert!(got.windows(2).all(|w| w[0].idx < w[1].idx));
}
