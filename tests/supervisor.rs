//! Supervisor behavior: autoscaling toward limits, idle shrink, tick
//! cadence, and fault isolation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use arbor::events::{Bus, Event, EventKind};
use arbor::subscribers::Subscribe;
use arbor::{Branch, Config, Limits, Supervisor, WaitStrategy};

/// Polls `probe` until it returns true or `timeout` elapses.
fn poll_until(timeout: Duration, mut probe: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if probe() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    probe()
}

struct Collector {
    events: Mutex<Vec<Event>>,
}

impl Collector {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
        })
    }

    fn count(&self, kind: EventKind) -> usize {
        self.events.lock().iter().filter(|e| e.kind == kind).count()
    }
}

impl Subscribe for Collector {
    fn on_event(&self, event: &Event) {
        self.events.lock().push(event.clone());
    }
}

#[test]
fn grows_under_load_and_shrinks_after_drain() {
    let collector = Collector::new();
    let bus = Bus::new();
    bus.attach(collector.clone());

    let branch = Arc::new(Branch::new(1, WaitStrategy::Blocking));
    let supervisor = Supervisor::with_bus(
        Config {
            limits: Limits::default(),
            tick_interval: Duration::from_millis(100),
        },
        bus,
    );
    supervisor.supervise_with(&branch, Limits::new(1, 4, Duration::from_millis(200)));

    for _ in 0..200 {
        branch.submit(|| thread::sleep(Duration::from_millis(10)));
    }

    assert!(
        poll_until(Duration::from_secs(3), || branch.num_workers() == 4),
        "pool should grow to max under backlog"
    );
    assert!(
        collector.count(EventKind::ScaleUp) >= 1,
        "growing must publish a scale-up event"
    );

    // Drain, then idle workers past the timeout get retired down to min —
    // and never below it.
    assert!(poll_until(Duration::from_secs(10), || {
        let n = branch.num_workers();
        assert!(n >= 1, "worker count fell below min");
        branch.num_tasks() == 0 && n == 1
    }));

    thread::sleep(Duration::from_millis(300));
    assert_eq!(branch.num_workers(), 1);
    assert!(
        collector.count(EventKind::ScaleDown) >= 1,
        "shrinking must publish a scale-down event"
    );
}

#[test]
fn never_exceeds_max_while_loaded() {
    let branch = Arc::new(Branch::new(1, WaitStrategy::Blocking));
    let supervisor = Supervisor::new(Config::default());
    supervisor.supervise_with(&branch, Limits::new(1, 3, Duration::from_millis(500)));

    for _ in 0..100 {
        branch.submit(|| thread::sleep(Duration::from_millis(5)));
    }

    let deadline = Instant::now() + Duration::from_secs(1);
    while Instant::now() < deadline {
        assert!(branch.num_workers() <= 3);
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn resupervising_replaces_the_limits() {
    let branch = Arc::new(Branch::new(1, WaitStrategy::Blocking));
    let supervisor = Supervisor::new(Config::default());
    supervisor.supervise_with(&branch, Limits::new(1, 2, Duration::from_secs(5)));

    let stop = Arc::new(AtomicUsize::new(0));
    let feeder = {
        let branch = Arc::clone(&branch);
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            while stop.load(Ordering::SeqCst) == 0 {
                for _ in 0..32 {
                    branch.submit(|| thread::sleep(Duration::from_millis(5)));
                }
                thread::sleep(Duration::from_millis(5));
            }
        })
    };

    assert!(poll_until(Duration::from_secs(3), || branch.num_workers() == 2));

    // Only the latest parameters are in effect.
    supervisor.supervise_with(&branch, Limits::new(1, 4, Duration::from_secs(5)));
    assert!(poll_until(Duration::from_secs(3), || branch.num_workers() == 4));

    stop.store(1, Ordering::SeqCst);
    feeder.join().unwrap();
    assert!(branch.wait_tasks(Duration::from_secs(10)));
}

#[test]
fn suspend_stretches_and_proceed_restores_tick_cadence() {
    let supervisor = Supervisor::new(Config {
        limits: Limits::default(),
        tick_interval: Duration::from_millis(50),
    });

    let ticks = Arc::new(AtomicUsize::new(0));
    {
        let ticks = Arc::clone(&ticks);
        supervisor.set_tick_callback(move || {
            ticks.fetch_add(1, Ordering::SeqCst);
        });
    }

    assert!(poll_until(Duration::from_secs(2), || {
        ticks.load(Ordering::SeqCst) >= 3
    }));

    supervisor.suspend(Duration::from_secs(600));
    thread::sleep(Duration::from_millis(100)); // let an in-flight tick land
    let frozen = ticks.load(Ordering::SeqCst);
    thread::sleep(Duration::from_millis(300));
    assert_eq!(ticks.load(Ordering::SeqCst), frozen);

    supervisor.proceed();
    assert!(poll_until(Duration::from_secs(2), || {
        ticks.load(Ordering::SeqCst) > frozen
    }));
}

#[test]
fn tick_panic_is_reported_and_the_loop_survives() {
    let collector = Collector::new();
    let bus = Bus::new();
    bus.attach(collector.clone());

    let supervisor = Supervisor::with_bus(
        Config {
            limits: Limits::default(),
            tick_interval: Duration::from_millis(50),
        },
        bus,
    );

    let ticks = Arc::new(AtomicUsize::new(0));
    {
        let ticks = Arc::clone(&ticks);
        supervisor.set_tick_callback(move || {
            if ticks.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("tick blew up");
            }
        });
    }

    // The first tick panics; later ticks still fire.
    assert!(poll_until(Duration::from_secs(2), || {
        ticks.load(Ordering::SeqCst) >= 3
    }));
    assert_eq!(collector.count(EventKind::SupervisorFault), 1);
}

#[test]
fn excess_workers_are_retired_toward_max() {
    let collector = Collector::new();
    let bus = Bus::new();
    bus.attach(collector.clone());

    let branch = Arc::new(Branch::new(6, WaitStrategy::Blocking));
    let supervisor = Supervisor::with_bus(Config::default(), bus);
    supervisor.supervise_with(&branch, Limits::new(1, 2, Duration::from_secs(5)));

    assert!(
        poll_until(Duration::from_secs(3), || branch.num_workers() == 2),
        "supervisor should trim an oversized pool to max"
    );
    assert!(
        collector.count(EventKind::ScaleDown) >= 1,
        "trimming past max must publish a scale-down event"
    );
}
