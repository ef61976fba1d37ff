//! Workspace dispatch: submissions spread over attached branches
//! round-robin; value-returning work goes through handles.
//!
//! Run with: `cargo run --example round_robin`

use std::thread;
use std::time::Duration;

use arbor::{Branch, HandleSet, WaitStrategy, Workspace};

fn main() {
    let workspace = Workspace::new();
    let first = workspace.attach_branch(Branch::new(2, WaitStrategy::Blocking));
    workspace.attach_branch(Branch::new(2, WaitStrategy::Blocking));

    for n in 0..8 {
        workspace.submit(move || {
            println!("task {n} on {:?}", thread::current().id());
            thread::sleep(Duration::from_millis(20));
        });
    }

    workspace.for_each(|branch| {
        branch.wait_tasks(Duration::from_secs(5));
    });

    // Direct submission to a specific branch, collecting results in bulk.
    let branch = workspace.branch(first).expect("branch is attached");
    let handles: HandleSet<u64> = (0..8).map(|n| branch.submit_future(move || n * n)).collect();
    println!("squares: {:?}", handles.get().expect("no task panicked"));
}
