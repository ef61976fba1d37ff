//! Autoscaling: a supervisor grows a one-worker branch toward `max` under
//! backlog and shrinks it back to `min` once the queue drains.
//!
//! Run with: `cargo run --example autoscale`

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use arbor::{Branch, Config, Limits, Supervisor, WaitStrategy};

fn main() {
    let branch = Arc::new(Branch::new(1, WaitStrategy::Blocking));
    let supervisor = Supervisor::new(Config {
        limits: Limits::default(),
        tick_interval: Duration::from_millis(250),
    });
    supervisor.supervise_with(&branch, Limits::new(1, 4, Duration::from_millis(500)));

    {
        let branch = Arc::clone(&branch);
        supervisor.set_tick_callback(move || {
            println!(
                "tick: workers={} queued={}",
                branch.num_workers(),
                branch.num_tasks()
            );
        });
    }

    for _ in 0..500 {
        branch.submit(|| thread::sleep(Duration::from_millis(10)));
    }

    branch.wait_tasks(Duration::from_secs(30));
    println!("drained with {} workers", branch.num_workers());

    // Idle workers past the timeout are retired down to min.
    thread::sleep(Duration::from_secs(2));
    println!("settled at {} workers", branch.num_workers());
}
