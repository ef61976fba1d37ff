//! Priority submission: urgent tasks jump the queue, sequences pack many
//! callables into one queue entry.
//!
//! Run with: `cargo run --example priority`

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use arbor::task::job;
use arbor::{Branch, Priority, WaitStrategy};

fn main() {
    let branch = Branch::new(1, WaitStrategy::Balanced);
    let order = Arc::new(Mutex::new(Vec::new()));

    // Pin the only worker so the submissions below stay queued.
    branch.submit(|| thread::sleep(Duration::from_millis(100)));

    for n in 1..=5 {
        let order = Arc::clone(&order);
        branch.submit(move || order.lock().push(n));
    }

    // Enqueued at the head: runs before every normal task still queued.
    {
        let order = Arc::clone(&order);
        branch.submit_with(Priority::Urgent, move || order.lock().push(0));
    }

    // Ten micro-tasks, one queue entry.
    let order2 = Arc::clone(&order);
    branch.submit_sequence((100..110).map(move |n| {
        let order = Arc::clone(&order2);
        job(move || order.lock().push(n))
    }));

    branch.wait_tasks(Duration::from_secs(5));
    println!("execution order: {:?}", order.lock());
}
