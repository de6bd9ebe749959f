// tests/watch_core.rs

use std::time::Duration;

use assetpipe::engine::{
    ChangeBatch, CoreCommand, FileChange, RunOutcome, RuntimeEvent, WatchCore, WatchOptions,
    WatchState,
};
use assetpipe::types::ChangeKind;

fn core() -> WatchCore {
    WatchCore::new(WatchOptions {
        debounce: Duration::from_millis(50),
    })
}

fn change(path: &str, kind: ChangeKind) -> RuntimeEvent {
    RuntimeEvent::FileChanged(FileChange::new(path, kind))
}

fn modified(path: &str) -> RuntimeEvent {
    change(path, ChangeKind::Modified)
}

fn completed() -> RuntimeEvent {
    RuntimeEvent::RunCompleted {
        outcome: RunOutcome::Succeeded,
    }
}

fn armed_generation(commands: &[CoreCommand]) -> u64 {
    match commands {
        [CoreCommand::ArmDebounce { generation, delay }] => {
            assert_eq!(*delay, Duration::from_millis(50));
            *generation
        }
        other => panic!("expected a single ArmDebounce, got {other:?}"),
    }
}

fn started_batch(commands: Vec<CoreCommand>) -> ChangeBatch {
    match commands.as_slice() {
        [CoreCommand::StartRun(batch)] => batch.clone(),
        other => panic!("expected a single StartRun, got {other:?}"),
    }
}

#[test]
fn first_change_arms_the_debounce_window() {
    let mut core = core();

    let step = core.step(modified("/p/lib/a.js"));

    assert!(step.keep_running);
    assert_eq!(armed_generation(&step.commands), 1);
    assert_eq!(core.state(), WatchState::Debouncing);
    assert_eq!(core.pending_len(), 1);
}

#[test]
fn rapid_changes_reset_the_window_and_start_one_run() {
    let mut core = core();

    let g1 = armed_generation(&core.step(modified("/p/lib/a.js")).commands);
    let g2 = armed_generation(&core.step(modified("/p/lib/b.js")).commands);
    let g3 = armed_generation(&core.step(modified("/p/lib/a.js")).commands);
    assert!(g1 < g2 && g2 < g3);

    // Timers from earlier arms are stale.
    for stale in [g1, g2] {
        let step = core.step(RuntimeEvent::DebounceElapsed { generation: stale });
        assert!(step.commands.is_empty());
        assert_eq!(core.state(), WatchState::Debouncing);
    }

    let step = core.step(RuntimeEvent::DebounceElapsed { generation: g3 });
    let batch = started_batch(step.commands);
    assert_eq!(batch.len(), 2);
    assert_eq!(core.state(), WatchState::Running);
    assert_eq!(core.pending_len(), 0);
}

#[test]
fn batch_keeps_the_last_kind_per_path() {
    let mut core = core();

    core.step(change("/p/lib/a.js", ChangeKind::Created));
    core.step(change("/p/lib/a.js", ChangeKind::Deleted));
    let g = armed_generation(&core.step(change("/p/lib/b.js", ChangeKind::Modified)).commands);

    let batch = started_batch(core.step(RuntimeEvent::DebounceElapsed { generation: g }).commands);

    assert_eq!(batch.kind_of("/p/lib/a.js".as_ref()), Some(ChangeKind::Deleted));
    assert_eq!(batch.kind_of("/p/lib/b.js".as_ref()), Some(ChangeKind::Modified));
    assert_eq!(batch.present_paths().len(), 1);
}

#[test]
fn completion_without_new_changes_returns_to_idle() {
    let mut core = core();
    let g = armed_generation(&core.step(modified("/p/a.js")).commands);
    core.step(RuntimeEvent::DebounceElapsed { generation: g });

    let step = core.step(completed());

    assert!(step.commands.is_empty());
    assert_eq!(core.state(), WatchState::Idle);
}

#[test]
fn changes_during_a_run_produce_exactly_one_follow_up() {
    let mut core = core();
    let g = armed_generation(&core.step(modified("/p/a.js")).commands);
    core.step(RuntimeEvent::DebounceElapsed { generation: g });

    for path in ["/p/b.js", "/p/c.js", "/p/b.js"] {
        let step = core.step(modified(path));
        assert!(step.commands.is_empty(), "no run may start while one is in flight");
        assert_eq!(core.state(), WatchState::RunningWithPendingChanges);
    }

    let g2 = armed_generation(&core.step(completed()).commands);
    assert_eq!(core.state(), WatchState::Debouncing);

    let batch = started_batch(core.step(RuntimeEvent::DebounceElapsed { generation: g2 }).commands);
    assert_eq!(batch.len(), 2);

    assert!(core.step(completed()).commands.is_empty());
    assert_eq!(core.state(), WatchState::Idle);
}

#[test]
fn failed_runs_do_not_stop_the_watcher() {
    let mut core = core();
    let g = armed_generation(&core.step(modified("/p/a.js")).commands);
    core.step(RuntimeEvent::DebounceElapsed { generation: g });

    let step = core.step(RuntimeEvent::RunCompleted {
        outcome: RunOutcome::Errored("invalid pattern".into()),
    });

    assert!(step.keep_running);
    assert_eq!(core.state(), WatchState::Idle);
}

#[test]
fn stop_while_debouncing_discards_the_batch() {
    let mut core = core();
    let g = armed_generation(&core.step(modified("/p/a.js")).commands);

    let step = core.step(RuntimeEvent::ShutdownRequested);
    assert!(!step.keep_running);
    assert_eq!(step.commands, vec![CoreCommand::RequestExit]);
    assert_eq!(core.state(), WatchState::Stopped);
    assert_eq!(core.pending_len(), 0);

    // A late timer does nothing.
    let late = core.step(RuntimeEvent::DebounceElapsed { generation: g });
    assert!(late.commands.is_empty());
    assert!(!late.keep_running);
}

#[test]
fn stop_while_idle_exits_immediately() {
    let mut core = core();
    let step = core.step(RuntimeEvent::ShutdownRequested);

    assert!(!step.keep_running);
    assert_eq!(core.state(), WatchState::Stopped);
}

#[test]
fn stop_during_a_run_waits_for_completion() {
    let mut core = core();
    let g = armed_generation(&core.step(modified("/p/a.js")).commands);
    core.step(RuntimeEvent::DebounceElapsed { generation: g });
    core.step(modified("/p/b.js"));

    let step = core.step(RuntimeEvent::ShutdownRequested);
    assert!(step.keep_running);
    assert!(step.commands.is_empty());
    assert!(core.stop_requested());
    assert_eq!(core.state(), WatchState::RunningWithPendingChanges);

    // Changes after the stop request are ignored.
    assert!(core.step(modified("/p/c.js")).commands.is_empty());

    let step = core.step(completed());
    assert!(!step.keep_running);
    assert_eq!(step.commands, vec![CoreCommand::RequestExit]);
    assert_eq!(core.state(), WatchState::Stopped);
}
