// tests/continuations.rs
//
// on_success chains: scheduled exactly once per successful run, skipped
// when the continuation is already queued or running, and never scheduled
// after a failure or a launch error.

mod common;
use crate::common::{harness, ms, paths_as_argv, touched};

use tokio::time::Instant;
use watchrun::task::TaskDescriptor;
use watchrun::watch::PathMatcher;

fn tests_task(delay_ms: u64) -> TaskDescriptor {
    TaskDescriptor::new("tests", paths_as_argv())
        .with_delay(ms(delay_ms))
        .with_filter(PathMatcher::predicate(|p| p.ends_with(".txt")))
        .with_on_success("deploy")
}

fn deploy_task(delay_ms: u64) -> TaskDescriptor {
    // Reachable only through on_success.
    TaskDescriptor::new("deploy", paths_as_argv())
        .with_delay(ms(delay_ms))
        .with_filter(PathMatcher::predicate(|_| false))
}

#[tokio::test]
async fn success_schedules_the_continuation_once() {
    common::init_tracing();
    let mut h = harness(vec![tests_task(0), deploy_task(0)]);
    let t0 = Instant::now();

    h.changes.push(touched("a.txt"));
    h.scheduler.tick(t0, ms(0)).await;
    // tests launches and finishes; deploy becomes pending.
    h.scheduler.tick(t0, ms(0)).await;
    assert!(h.scheduler.has_pending("deploy"));
    // deploy launches and finishes; nothing follows it.
    h.scheduler.tick(t0, ms(0)).await;

    assert_eq!(h.log.names(), vec!["tests", "deploy"]);
    assert_eq!(h.scheduler.pending_count(), 0);
    assert_eq!(h.scheduler.running_count(), 0);
}

#[tokio::test]
async fn continuation_inherits_the_trigger_paths() {
    common::init_tracing();
    let mut h = harness(vec![tests_task(0), deploy_task(0)]);
    let t0 = Instant::now();

    h.changes.push(touched("a.txt"));
    h.changes.push(touched("b.txt"));
    h.scheduler.tick(t0, ms(0)).await;
    h.scheduler.tick(t0, ms(0)).await;
    h.scheduler.tick(t0, ms(0)).await;

    let launches = h.log.launches();
    assert_eq!(launches[1].name, "deploy");
    assert_eq!(launches[1].argv, vec!["a.txt", "b.txt"]);
}

#[tokio::test]
async fn failure_schedules_nothing() {
    common::init_tracing();
    let mut h = harness(vec![tests_task(0), deploy_task(0)]);
    h.script.exit_with("tests", 1);
    let t0 = Instant::now();

    h.changes.push(touched("a.txt"));
    for _ in 0..4 {
        h.scheduler.tick(t0, ms(0)).await;
    }

    assert_eq!(h.log.count_for("tests"), 1);
    assert_eq!(h.log.count_for("deploy"), 0);
    assert!(!h.scheduler.has_pending("deploy"));
    assert!(!h.scheduler.is_running("deploy"));
    assert_eq!(h.report.finishes_for("tests"), vec![1]);
}

#[tokio::test]
async fn already_pending_continuation_is_refreshed_not_duplicated() {
    common::init_tracing();
    // deploy also watches .cfg files, so it can be pending on its own.
    let deploy = TaskDescriptor::new("deploy", paths_as_argv())
        .with_delay(ms(10_000))
        .with_filter(PathMatcher::predicate(|p| p.ends_with(".cfg")));
    let mut h = harness(vec![tests_task(0), deploy]);
    h.script.hold("tests");
    let t0 = Instant::now();

    h.changes.push(touched("a.txt"));
    h.changes.push(touched("site.cfg"));
    h.scheduler.tick(t0, ms(0)).await;
    h.scheduler.tick(t0, ms(0)).await;
    assert!(h.scheduler.is_running("tests"));
    assert_eq!(h.scheduler.pending_due("deploy"), Some(t0 + ms(10_000)));

    // tests succeeds later; the queued deploy window is pushed out, and no
    // second instance appears.
    h.script.release("tests", 0);
    let t1 = t0 + ms(2_000);
    h.scheduler.tick(t1, ms(0)).await;
    assert_eq!(h.scheduler.pending_due("deploy"), Some(t1 + ms(10_000)));
    assert_eq!(h.scheduler.pending_count(), 1);

    h.scheduler.tick(t1 + ms(10_000), ms(0)).await;
    h.scheduler.tick(t1 + ms(10_000), ms(0)).await;
    assert_eq!(h.log.count_for("deploy"), 1);
    // The organic window kept its own paths.
    assert_eq!(h.log.launches().last().unwrap().argv, vec!["site.cfg"]);
}

#[tokio::test]
async fn running_continuation_is_not_scheduled_again() {
    common::init_tracing();
    let deploy = TaskDescriptor::new("deploy", paths_as_argv())
        .with_delay(ms(0))
        .with_filter(PathMatcher::predicate(|p| p.ends_with(".cfg")));
    let mut h = harness(vec![tests_task(0), deploy]);
    h.script.hold("tests");
    h.script.hold("deploy");
    let t0 = Instant::now();

    h.changes.push(touched("site.cfg"));
    h.scheduler.tick(t0, ms(0)).await;
    h.scheduler.tick(t0, ms(0)).await;
    assert!(h.scheduler.is_running("deploy"));

    h.changes.push(touched("a.txt"));
    h.scheduler.tick(t0 + ms(10), ms(0)).await;
    h.scheduler.tick(t0 + ms(10), ms(0)).await;
    assert!(h.scheduler.is_running("tests"));

    // tests succeeds while deploy is still running: no new deploy window.
    h.script.release("tests", 0);
    h.scheduler.tick(t0 + ms(20), ms(0)).await;
    assert!(!h.scheduler.has_pending("deploy"));
    assert_eq!(h.log.count_for("deploy"), 1);
}

#[tokio::test]
async fn finished_task_with_queued_window_skips_its_continuation() {
    common::init_tracing();
    let mut h = harness(vec![tests_task(0), deploy_task(0)]);
    h.script.hold("tests");
    let t0 = Instant::now();

    h.changes.push(touched("a.txt"));
    h.scheduler.tick(t0, ms(0)).await;
    h.scheduler.tick(t0, ms(0)).await;

    // A new window for tests forms while the first run is held.
    h.changes.push(touched("b.txt"));
    h.scheduler.tick(t0 + ms(10), ms(0)).await;
    assert!(h.scheduler.has_pending("tests"));

    // The success flows into the queued rerun instead of the continuation.
    h.script.release("tests", 0);
    let t1 = t0 + ms(1_000);
    h.scheduler.tick(t1, ms(0)).await;
    assert!(!h.scheduler.has_pending("deploy"));
    assert_eq!(h.scheduler.pending_due("tests"), Some(t1));
}

#[tokio::test]
async fn self_continuation_reruns_while_successful() {
    common::init_tracing();
    let looper = TaskDescriptor::new("loop", paths_as_argv())
        .with_delay(ms(0))
        .with_filter(PathMatcher::predicate(|p| p.ends_with(".txt")))
        .with_on_success("loop");
    let mut h = harness(vec![looper]);
    let t0 = Instant::now();

    h.changes.push(touched("a.txt"));
    h.scheduler.tick(t0, ms(0)).await;
    for _ in 0..3 {
        h.scheduler.tick(t0, ms(0)).await;
        assert!(h.scheduler.running_count() <= 1);
    }
    assert_eq!(h.log.count_for("loop"), 3);

    // Once it fails, the loop stops.
    h.script.exit_with("loop", 2);
    h.scheduler.tick(t0, ms(0)).await;
    h.scheduler.tick(t0, ms(0)).await;
    assert_eq!(h.log.count_for("loop"), 4);
    assert!(!h.scheduler.has_pending("loop"));
}

#[tokio::test]
async fn launch_failure_is_reported_and_isolated() {
    common::init_tracing();
    let lint = TaskDescriptor::new("lint", paths_as_argv())
        .with_delay(ms(0))
        .with_filter(PathMatcher::predicate(|p| p.ends_with(".txt")));
    let mut h = harness(vec![tests_task(0), deploy_task(0), lint]);
    h.script.fail_launch("tests");
    let t0 = Instant::now();

    h.changes.push(touched("a.txt"));
    h.scheduler.tick(t0, ms(0)).await;
    h.scheduler.tick(t0, ms(0)).await;

    // The failed launch is a reported failure, not a crash, and no
    // continuation follows it.
    assert_eq!(h.report.begins_for("tests"), 1);
    assert_eq!(h.report.finishes_for("tests"), vec![-1]);
    assert!(!h.scheduler.is_running("tests"));
    assert!(!h.scheduler.has_pending("deploy"));

    // The sibling task in the same tick is unaffected.
    h.scheduler.tick(t0, ms(0)).await;
    assert_eq!(h.report.finishes_for("lint"), vec![0]);
}
