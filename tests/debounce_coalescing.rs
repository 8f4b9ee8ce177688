// tests/debounce_coalescing.rs
//
// Debounce windows: events open a pending instance, further events merge
// into it and push the deadline out, and exactly one launch happens per
// window with the union of all contributing paths.

mod common;
use crate::common::{harness, ms, paths_as_argv, touched};

use tokio::time::Instant;
use watchrun::task::TaskDescriptor;
use watchrun::watch::PathMatcher;

fn txt_task(name: &str, delay_ms: u64) -> TaskDescriptor {
    TaskDescriptor::new(name, paths_as_argv())
        .with_delay(ms(delay_ms))
        .with_filter(PathMatcher::predicate(|p| p.ends_with(".txt")))
}

#[tokio::test]
async fn single_event_launches_once_after_window() {
    common::init_tracing();
    let mut h = harness(vec![txt_task("build", 5_000)]);
    let t0 = Instant::now();

    h.changes.push(touched("a.txt"));
    h.scheduler.tick(t0, ms(0)).await;
    assert_eq!(h.scheduler.pending_count(), 1);
    assert_eq!(h.log.count_for("build"), 0);

    // Still inside the window.
    h.scheduler.tick(t0 + ms(4_000), ms(0)).await;
    assert_eq!(h.log.count_for("build"), 0);

    h.scheduler.tick(t0 + ms(5_000), ms(0)).await;
    assert_eq!(h.log.count_for("build"), 1);
    assert_eq!(h.log.launches()[0].argv, vec!["a.txt"]);
    assert_eq!(h.scheduler.pending_count(), 0);
}

#[tokio::test]
async fn second_event_merges_and_pushes_the_window() {
    common::init_tracing();
    let mut h = harness(vec![txt_task("build", 5_000)]);
    let t0 = Instant::now();

    h.changes.push(touched("a.txt"));
    h.scheduler.tick(t0, ms(0)).await;

    h.changes.push(touched("b.txt"));
    h.scheduler.tick(t0 + ms(1_000), ms(0)).await;

    // The window now ends 5s after the *second* event.
    assert_eq!(h.scheduler.pending_due("build"), Some(t0 + ms(6_000)));

    h.scheduler.tick(t0 + ms(5_500), ms(0)).await;
    assert_eq!(h.log.count_for("build"), 0);

    h.scheduler.tick(t0 + ms(6_000), ms(0)).await;
    assert_eq!(h.log.count_for("build"), 1);
    assert_eq!(h.log.launches()[0].argv, vec!["a.txt", "b.txt"]);
}

#[tokio::test]
async fn duplicate_paths_collapse() {
    common::init_tracing();
    let mut h = harness(vec![txt_task("build", 0)]);
    let t0 = Instant::now();

    h.changes.push(touched("a.txt"));
    h.changes.push(touched("a.txt"));
    h.changes.push(touched("a.txt"));
    h.scheduler.tick(t0, ms(0)).await;
    h.scheduler.tick(t0, ms(0)).await;

    assert_eq!(h.log.count_for("build"), 1);
    assert_eq!(h.log.launches()[0].argv, vec!["a.txt"]);
}

#[tokio::test]
async fn non_matching_events_are_ignored() {
    common::init_tracing();
    let mut h = harness(vec![txt_task("build", 0)]);
    let t0 = Instant::now();

    h.changes.push(touched("main.rs"));
    h.scheduler.tick(t0, ms(0)).await;

    assert_eq!(h.scheduler.pending_count(), 0);
    assert_eq!(h.log.count_for("build"), 0);
}

#[tokio::test]
async fn one_event_feeds_every_matching_task() {
    common::init_tracing();
    let mut h = harness(vec![txt_task("build", 0), txt_task("lint", 0)]);
    let t0 = Instant::now();

    h.changes.push(touched("a.txt"));
    h.scheduler.tick(t0, ms(0)).await;
    // Both pending instances are due; one promote pass launches both.
    h.scheduler.tick(t0, ms(0)).await;

    assert_eq!(h.log.count_for("build"), 1);
    assert_eq!(h.log.count_for("lint"), 1);
}

#[tokio::test]
async fn zero_delay_launches_on_the_next_tick() {
    common::init_tracing();
    let mut h = harness(vec![txt_task("build", 0)]);
    let t0 = Instant::now();

    h.changes.push(touched("a.txt"));
    // Dispatch happens at the end of the tick, so the launch lands on the
    // tick after the event was drained.
    h.scheduler.tick(t0, ms(0)).await;
    assert_eq!(h.log.count_for("build"), 0);
    h.scheduler.tick(t0, ms(0)).await;
    assert_eq!(h.log.count_for("build"), 1);
}
