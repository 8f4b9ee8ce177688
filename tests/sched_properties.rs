// tests/sched_properties.rs
//
// Property tests over random event schedules: one launch per debounce
// window carrying the union of matched paths, and never more than one
// running instance per task type.

mod common;
use crate::common::{harness, ms, paths_as_argv, touched, Harness};

use std::collections::BTreeSet;

use proptest::prelude::*;
use tokio::time::Instant;
use watchrun::task::TaskDescriptor;
use watchrun::watch::PathMatcher;

fn rt() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("tokio runtime")
}

fn held_harness(names: &[&str], delay_ms: u64) -> Harness {
    let tasks = names
        .iter()
        .map(|name| {
            // Each task watches its own extension: task "t0" watches "*.t0".
            let ext = format!(".{name}");
            TaskDescriptor::new(*name, paths_as_argv())
                .with_delay(ms(delay_ms))
                .with_filter(PathMatcher::predicate(move |p| p.ends_with(&ext)))
        })
        .collect();
    harness(tasks)
}

proptest! {
    /// Any batch of events landing inside one debounce window produces
    /// exactly one launch whose argv is the sorted union of the matched
    /// paths.
    #[test]
    fn one_launch_per_window_with_the_union_of_paths(
        paths in proptest::collection::vec("[a-d]{1,3}", 1..20),
        gaps_ms in proptest::collection::vec(0u64..400, 1..20),
    ) {
        rt().block_on(async {
            let mut h = held_harness(&["t0"], 1_000);
            let t0 = Instant::now();

            // Deliver each event, ticking as time advances; every gap is
            // shorter than the window, so nothing may launch yet.
            let mut now = t0;
            let mut expected = BTreeSet::new();
            for (path, gap) in paths.iter().zip(gaps_ms.iter().cycle()) {
                let path = format!("{path}.t0");
                expected.insert(path.clone());
                h.changes.push(touched(&path));
                h.scheduler.tick(now, ms(0)).await;
                now += ms(*gap);
                h.scheduler.tick(now, ms(0)).await;
            }
            prop_assert_eq!(h.log.count_for("t0"), 0);

            // Let the window expire.
            now += ms(1_000);
            h.scheduler.tick(now, ms(0)).await;
            prop_assert_eq!(h.log.count_for("t0"), 1);

            let argv: Vec<String> = expected.into_iter().collect();
            prop_assert_eq!(h.log.launches()[0].argv.clone(), argv);
            Ok(())
        })?;
    }

    /// Whatever the event schedule, a held (never finishing) task type is
    /// launched at most once, and overall at most one instance per type
    /// runs at a time.
    #[test]
    fn at_most_one_running_instance_per_type(
        schedule in proptest::collection::vec((0usize..3, 0u64..200), 1..40),
    ) {
        rt().block_on(async {
            let names = ["t0", "t1", "t2"];
            let mut h = held_harness(&names, 50);
            for name in names {
                h.script.hold(name);
            }

            let mut now = Instant::now();
            for (task_idx, gap) in schedule {
                h.changes.push(touched(&format!("x.{}", names[task_idx])));
                now += ms(gap);
                h.scheduler.tick(now, ms(0)).await;
                prop_assert!(h.scheduler.running_count() <= names.len());
                for name in names {
                    prop_assert!(h.log.count_for(name) <= 1);
                }
            }

            // Drain every window; held tasks still never relaunch.
            now += ms(1_000);
            for _ in 0..3 {
                h.scheduler.tick(now, ms(0)).await;
            }
            for name in names {
                prop_assert!(h.log.count_for(name) <= 1);
            }
            Ok(())
        })?;
    }
}
