//! Behavioral checks for the waiting primitive and lifecycle surface that
//! don't need a live WebDriver service.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use squire_common::SquireError;
use squire_drivers::squire_browser::display::release_display;
use squire_drivers::squire_browser::driver::{DriverOptions, SquireDriver};
use squire_drivers::squire_browser::wait::{wait_until_true, WaitConfig};

#[tokio::test]
async fn predicate_true_on_third_poll_returns_after_two_steps() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let start = Instant::now();

    wait_until_true(
        move || {
            let calls = counter.clone();
            async move { calls.fetch_add(1, Ordering::SeqCst) + 1 >= 3 }
        },
        WaitConfig::new(Duration::from_secs(10), Duration::from_millis(100)),
        "third poll",
    )
    .await
    .expect("condition becomes true");

    // false, false, true at a 100ms step: two sleeps, so ~200ms.
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(200), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_millis(450), "elapsed {elapsed:?}");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn exhausted_budget_times_out_with_roughly_budget_over_step_evaluations() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let start = Instant::now();

    let result = wait_until_true(
        move || {
            let calls = counter.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                false
            }
        },
        WaitConfig::new(Duration::from_millis(500), Duration::from_millis(100)),
        "hopeless condition",
    )
    .await;

    assert!(matches!(result, Err(SquireError::WaitTimeout { .. })));
    assert!(start.elapsed() >= Duration::from_millis(500));
    let evaluations = calls.load(Ordering::SeqCst);
    assert!((3..=6).contains(&evaluations), "evaluations {evaluations}");
}

#[tokio::test]
async fn launching_an_unknown_browser_fails_before_any_connection() {
    let err = SquireDriver::launch_named("safari", DriverOptions::default())
        .await
        .expect_err("safari is not a supported browser");

    match err {
        SquireError::Config(message) => {
            assert!(message.contains("chrome"));
            assert!(message.contains("firefox"));
        }
        other => panic!("expected a configuration error, got {other:?}"),
    }
}

#[test]
fn releasing_an_absent_display_is_fine() {
    release_display(None);
}
