//! End-to-end tests for the sequence runner against real processes.

use std::sync::Arc;
use std::time::{Duration, Instant};

use sanity_suite::exec::{
    AsyncCommandRunner, CommandRunner, CommandSpec, ExecError, MockProcessRunner,
};

fn production_pool(workers: usize) -> AsyncCommandRunner {
    AsyncCommandRunner::with_workers(CommandRunner::production(), workers)
}

#[tokio::test]
async fn sequence_preserves_order_across_steps() {
    let pool = production_pool(2);
    let specs: Vec<CommandSpec> = (0..5)
        .map(|index| CommandSpec::cmd(format!("echo step-{index}")))
        .collect();

    let results = pool.run_sequence(specs, false).await.unwrap();
    assert_eq!(results.len(), 5);
    for (index, result) in results.iter().enumerate() {
        assert!(result.succeeded());
        assert_eq!(result.stdout.trim(), format!("step-{index}"));
    }
}

#[tokio::test]
async fn concurrent_sequences_do_not_interleave_results() {
    let pool = Arc::new(production_pool(4));
    let mut handles = Vec::new();

    for sequence in 0..4 {
        let specs = vec![
            CommandSpec::cmd(format!("echo {sequence}-a")),
            CommandSpec::cmd(format!("echo {sequence}-b")),
        ];
        handles.push((sequence, pool.submit_sequence(specs, false).unwrap()));
    }

    for (sequence, handle) in handles {
        let results = handle.wait().await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].stdout.trim(), format!("{sequence}-a"));
        assert_eq!(results[1].stdout.trim(), format!("{sequence}-b"));
    }
}

#[tokio::test]
async fn timeout_mid_sequence_keeps_earlier_results() {
    let pool = production_pool(1);
    let specs = vec![
        CommandSpec::cmd("echo before"),
        CommandSpec::cmd("sleep 5").timeout(Duration::from_millis(200)),
        CommandSpec::cmd("echo after"),
    ];

    let start = Instant::now();
    let error = pool.run_sequence(specs, false).await.unwrap_err();
    assert!(start.elapsed() < Duration::from_secs(2));

    assert_eq!(error.completed.len(), 1);
    assert_eq!(error.completed[0].stdout.trim(), "before");
    assert!(matches!(error.error, ExecError::CommandTimedOut { .. }));
}

#[tokio::test]
async fn cancelled_queued_sequence_never_runs() {
    // One worker, kept busy long enough for the second submission to
    // still be queued when it is cancelled.
    let pool = production_pool(1);
    let busy = pool
        .submit_sequence(vec![CommandSpec::cmd("sleep 0.5")], false)
        .unwrap();

    let marker = tempfile::tempdir().unwrap();
    let witness = marker.path().join("ran");
    let queued = pool
        .submit_sequence(
            vec![CommandSpec::cmd(format!("touch {}", witness.display()))],
            false,
        )
        .unwrap();
    queued.cancel();

    let error = queued.wait().await.unwrap_err();
    assert!(matches!(error.error, ExecError::Cancelled));
    assert!(busy.wait().await.is_ok());
    assert!(!witness.exists(), "cancelled sequence still executed");
}

#[tokio::test]
async fn shutdown_rejects_new_work_and_lets_running_finish() {
    let pool = production_pool(1);
    let running = pool
        .submit_sequence(vec![CommandSpec::cmd("sleep 0.3 && echo done")], false)
        .unwrap();

    // Let the worker dequeue the sequence so shutdown cannot cancel it.
    tokio::time::sleep(Duration::from_millis(100)).await;
    pool.shutdown();
    assert!(matches!(
        pool.submit_sequence(vec![CommandSpec::cmd("echo late")], false),
        Err(ExecError::PoolShutdown)
    ));

    let results = running.wait().await.unwrap();
    assert_eq!(results[0].stdout.trim(), "done");
}

#[tokio::test]
async fn admin_context_is_shared_across_the_sequence() {
    let mock = MockProcessRunner::new();
    let pool = AsyncCommandRunner::with_workers(CommandRunner::new(Arc::new(mock.clone())), 1);

    // Elevated spec passes when the sequence carries an admin context.
    mock.respond("elevated-step", 0, "");
    mock.respond("plain-step", 0, "");
    let specs = vec![
        CommandSpec::process("elevated-step").elevated(),
        CommandSpec::process("plain-step"),
    ];
    let results = pool.run_sequence(specs, true).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(mock.call_count(), 2);
}
