//! Workspace behavior: registry ids, round-robin dispatch, broadcast, and
//! ordered teardown. Also covers the self-scaling `AutoBranch` wrapper.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use arbor::{AutoBranch, Branch, Config, Limits, Supervisor, WaitStrategy, Workspace};

#[test]
fn attach_lookup_detach_roundtrip() {
    let workspace = Workspace::new();
    let a = workspace.attach_branch(Branch::new(1, WaitStrategy::Blocking));
    let b = workspace.attach_branch(Branch::new(1, WaitStrategy::Blocking));

    assert_ne!(a, b);
    assert_eq!(workspace.num_branches(), 2);
    assert!(workspace.branch(a).is_some());

    assert!(workspace.detach_branch(a));
    assert!(!workspace.detach_branch(a));
    assert!(workspace.branch(a).is_none());
    assert_eq!(workspace.num_branches(), 1);
}

#[test]
fn round_robin_reaches_every_branch() {
    let workspace = Workspace::new();
    workspace.attach_branch(Branch::new(1, WaitStrategy::Blocking));
    workspace.attach_branch(Branch::new(1, WaitStrategy::Blocking));

    let threads = Arc::new(Mutex::new(HashSet::new()));
    for _ in 0..4 {
        let threads = Arc::clone(&threads);
        workspace.submit(move || {
            threads.lock().insert(thread::current().id());
            thread::sleep(Duration::from_millis(50));
        });
    }

    workspace.for_each(|branch| {
        assert!(branch.wait_tasks(Duration::from_secs(5)));
    });

    // Each branch has a single worker, so two distinct executing threads
    // prove both branches received work.
    assert_eq!(threads.lock().len(), 2);
}

#[test]
fn for_each_broadcasts_over_branches() {
    let workspace = Workspace::new();
    workspace.attach_branch(Branch::new(1, WaitStrategy::Blocking));
    workspace.attach_branch(Branch::new(1, WaitStrategy::Blocking));
    workspace.attach_branch(Branch::new(1, WaitStrategy::Blocking));

    let mut visited = 0;
    workspace.for_each(|_| visited += 1);
    assert_eq!(visited, 3);
}

#[test]
fn supervisors_are_stopped_before_branches() {
    let workspace = Workspace::new();
    let id = workspace.attach_branch(Branch::new(1, WaitStrategy::Blocking));
    let branch = workspace.branch(id).unwrap();

    let supervisor = Supervisor::new(Config {
        limits: Limits::default(),
        tick_interval: Duration::from_millis(10),
    });
    supervisor.supervise_with(&branch, Limits::new(1, 4, Duration::from_millis(50)));
    workspace.attach_supervisor(supervisor);

    for _ in 0..50 {
        workspace.submit(|| thread::sleep(Duration::from_millis(5)));
    }
    drop(branch);

    // Teardown while the supervisor is actively resizing must not hang or
    // leave the supervisor observing a dead branch.
    drop(workspace);
}

#[test]
fn lookup_of_attached_supervisor_works() {
    let workspace = Workspace::new();
    let id = workspace.attach_supervisor(Supervisor::new(Config::default()));
    assert!(workspace.supervisor(id).is_some());
    assert!(workspace.detach_supervisor(id));
    assert!(workspace.supervisor(id).is_none());
}

#[test]
fn autobranch_scales_and_answers() {
    let pool = AutoBranch::new(
        Limits::new(1, 4, Duration::from_millis(200)),
        WaitStrategy::Blocking,
        Duration::from_millis(100),
    );

    let counter = Arc::new(AtomicUsize::new(0));
    for _ in 0..100 {
        let counter = Arc::clone(&counter);
        pool.submit(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(5));
        });
    }

    assert!(pool.wait_tasks(Duration::from_secs(10)));
    assert_eq!(counter.load(Ordering::SeqCst), 100);
    assert!(pool.num_workers() >= 1);

    let h = pool.submit_future(|| "alive");
    assert_eq!(h.get(), Ok("alive"));
}
