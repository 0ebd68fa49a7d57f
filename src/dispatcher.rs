//! # Dispatcher
//!
//! The run-loop. Each iteration looks up the active task, runs its function
//! to completion outside any critical section, then demotes it and
//! re-evaluates readiness inside one, so that another ready task can start
//! within the same tick.
//!
//! ```text
//! loop
//!   ├─► active task?  ── none ──► Hooks::idle(scheduler)
//!   │        │
//!   │        ▼
//!   ├─► task.function()             ← interrupts enabled, tick may fire
//!   │
//!   └─► critical_section {
//!           demote Active → Blocked
//!           evaluate()              ← gap filling
//!       }
//! ```

use crate::scheduler::SharedScheduler;
use crate::sync::{critical_section, with_scheduler};
use crate::task::TaskId;

// ---------------------------------------------------------------------------
// Instrumentation hooks
// ---------------------------------------------------------------------------

/// Instrumentation called by the run-loop. All methods default to no-ops,
/// except `idle`, which busy-waits.
pub trait Hooks {
    /// First idle iteration after running work.
    fn idle_entered(&mut self, _now: u32) {}

    /// First busy iteration after idling. `now` is truncated to 16 bits.
    fn idle_left(&mut self, _next: TaskId, _now: u16) {}

    fn task_started(&mut self, _id: TaskId, _now: u32) {}

    fn task_finished(&mut self, _id: TaskId, _now: u32) {}

    /// Called on every idle iteration, outside any critical section.
    ///
    /// An implementation that sleeps must re-check for an active task in
    /// the same critical section it sleeps in; see [`sleep_unless_active`].
    fn idle(&mut self, _scheduler: &SharedScheduler) {
        core::hint::spin_loop();
    }
}

/// Call `sleep` with interrupts masked, unless a task became active since
/// the run-loop last looked.
///
/// A tick that lands after the caller's idle check stays pending until the
/// mask is lifted, so `sleep` must be a wait that a pending interrupt ends
/// (`wfi` on Cortex-M). Returns whether `sleep` was called.
pub fn sleep_unless_active<F: FnOnce()>(scheduler: &SharedScheduler, sleep: F) -> bool {
    critical_section(|cs| {
        if scheduler.borrow_ref(cs).active_task().is_some() {
            return false;
        }
        sleep();
        true
    })
}

/// No instrumentation.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl Hooks for NoHooks {}

/// Traces idle transitions and task runs through the crate logger.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogHooks;

impl Hooks for LogHooks {
    fn idle_entered(&mut self, _now: u32) {
        log_trace!("idle at {}", _now);
    }

    fn idle_left(&mut self, _next: TaskId, _now: u16) {
        log_trace!("busy at {}, task {}", _now, _next);
    }

    fn task_started(&mut self, _id: TaskId, _now: u32) {
        log_trace!("task {} start at {}", _id, _now);
    }

    fn task_finished(&mut self, _id: TaskId, _now: u32) {
        log_trace!("task {} done at {}", _id, _now);
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Runs the tasks of a shared scheduler, one at a time.
pub struct Dispatcher<'a, H: Hooks = NoHooks> {
    scheduler: &'a SharedScheduler,
    hooks: H,
    idle: bool,
}

impl<'a> Dispatcher<'a, NoHooks> {
    /// # Panics
    /// If a dispatcher was already created for this scheduler.
    pub fn new(scheduler: &'a SharedScheduler) -> Self {
        Self::with_hooks(scheduler, NoHooks)
    }
}

impl<'a, H: Hooks> Dispatcher<'a, H> {
    /// Take over `scheduler` and close its registration phase.
    ///
    /// # Panics
    /// If a dispatcher was already created for this scheduler.
    pub fn with_hooks(scheduler: &'a SharedScheduler, hooks: H) -> Self {
        let first = with_scheduler(scheduler, |s| s.mark_started());
        assert!(first, "scheduler started twice");
        log_info!("dispatcher started");

        Self {
            scheduler,
            hooks,
            idle: false,
        }
    }

    /// Run forever.
    pub fn run(mut self) -> ! {
        loop {
            self.poll();
        }
    }

    /// One run-loop iteration. Returns the task that ran, if any.
    pub fn poll(&mut self) -> Option<TaskId> {
        let (active, now) = with_scheduler(self.scheduler, |s| (s.active_function(), s.now()));

        let Some((id, function)) = active else {
            if !self.idle {
                self.hooks.idle_entered(now);
                self.idle = true;
            }
            self.hooks.idle(self.scheduler);
            return None;
        };

        if self.idle {
            self.hooks.idle_left(id, now as u16);
            self.idle = false;
        }

        self.hooks.task_started(id, now);
        function();

        let now = with_scheduler(self.scheduler, |s| {
            s.finish(id);
            s.now()
        });
        self.hooks.task_finished(id, now);

        Some(id)
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn is_idle(&self) -> bool {
        self.idle
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::scheduler::Scheduler;
    use crate::task::{Period, TaskState};
    use std::cell::RefCell;
    use std::vec::Vec;

    std::thread_local! {
        static TRACE: RefCell<Vec<&'static str>> = const { RefCell::new(Vec::new()) };
    }

    fn record(name: &'static str) {
        TRACE.with(|t| t.borrow_mut().push(name));
    }

    fn take_trace() -> Vec<&'static str> {
        TRACE.with(|t| t.take())
    }

    fn task_a() {
        record("a");
    }

    fn task_b() {
        record("b");
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<(&'static str, u8, u32)>,
        idle_polls: u32,
    }

    impl Hooks for Recorder {
        fn idle_entered(&mut self, now: u32) {
            self.events.push(("idle", 0xFF, now));
        }

        fn idle_left(&mut self, next: TaskId, now: u16) {
            self.events.push(("busy", next.raw(), now as u32));
        }

        fn idle(&mut self, _scheduler: &SharedScheduler) {
            self.idle_polls += 1;
        }
    }

    #[test]
    fn test_idle_before_first_tick() {
        let shared = Scheduler::shared();
        with_scheduler(&shared, |s| s.register(task_a, Period::Every(10)).unwrap());
        let mut dispatcher = Dispatcher::new(&shared);

        assert_eq!(dispatcher.poll(), None);
        assert!(dispatcher.is_idle());
        assert!(take_trace().is_empty());
    }

    #[test]
    fn test_gap_filling_within_one_tick() {
        let shared = Scheduler::shared();
        let (a, b) = with_scheduler(&shared, |s| {
            (
                s.register(task_a, Period::Every(1000)).unwrap(),
                s.register(task_b, Period::Every(250)).unwrap(),
            )
        });
        let mut dispatcher = Dispatcher::new(&shared);

        with_scheduler(&shared, |s| s.tick());
        assert_eq!(dispatcher.poll(), Some(a));
        assert_eq!(dispatcher.poll(), Some(b));
        assert_eq!(dispatcher.poll(), None);

        assert_eq!(take_trace(), ["a", "b"]);
        with_scheduler(&shared, |s| {
            assert_eq!(s.now(), 1);
            assert_eq!(s.state(a), Some(TaskState::Blocked));
            assert_eq!(s.state(b), Some(TaskState::Blocked));
        });
    }

    #[test]
    fn test_idle_hooks_fire_on_transitions() {
        let shared = Scheduler::shared();
        let a = with_scheduler(&shared, |s| s.register(task_a, Period::Every(3)).unwrap());
        let mut dispatcher = Dispatcher::with_hooks(&shared, Recorder::default());

        dispatcher.poll();
        dispatcher.poll();
        with_scheduler(&shared, |s| s.tick());
        assert_eq!(dispatcher.poll(), Some(a));
        dispatcher.poll();

        let hooks = dispatcher.hooks();
        assert_eq!(
            hooks.events,
            [("idle", 0xFF, 0), ("busy", 0, 1), ("idle", 0xFF, 1)]
        );
        assert_eq!(hooks.idle_polls, 3);
        take_trace();
    }

    #[test]
    fn test_log_hooks_drive_the_run_loop() {
        let shared = Scheduler::shared();
        let a = with_scheduler(&shared, |s| s.register(task_a, Period::Every(2)).unwrap());
        let mut dispatcher = Dispatcher::with_hooks(&shared, LogHooks);

        assert_eq!(dispatcher.poll(), None);
        with_scheduler(&shared, |s| s.tick());
        assert_eq!(dispatcher.poll(), Some(a));
        assert_eq!(dispatcher.poll(), None);
        assert!(dispatcher.is_idle());
        assert_eq!(take_trace(), ["a"]);
    }

    #[test]
    fn test_sleep_skipped_when_tick_activated_a_task() {
        let shared = Scheduler::shared();
        let a = with_scheduler(&shared, |s| s.register(task_a, Period::Every(5)).unwrap());

        let mut sleeps = 0;
        assert!(sleep_unless_active(&shared, || sleeps += 1));
        assert_eq!(sleeps, 1);

        // tick between the run-loop's idle check and the sleep
        with_scheduler(&shared, |s| s.tick());
        assert_eq!(with_scheduler(&shared, |s| s.active_task()), Some(a));
        assert!(!sleep_unless_active(&shared, || sleeps += 1));
        assert_eq!(sleeps, 1);
    }

    #[test]
    fn test_sleeping_hook_sees_pending_work() {
        struct Sleeper {
            sleeps: u32,
        }

        impl Hooks for Sleeper {
            fn idle(&mut self, scheduler: &SharedScheduler) {
                // a tick arrives just before the hook masks interrupts
                with_scheduler(scheduler, |s| s.tick());
                sleep_unless_active(scheduler, || self.sleeps += 1);
            }
        }

        let shared = Scheduler::shared();
        let a = with_scheduler(&shared, |s| s.register(task_a, Period::Every(5)).unwrap());
        let mut dispatcher = Dispatcher::with_hooks(&shared, Sleeper { sleeps: 0 });

        assert_eq!(dispatcher.poll(), None);
        assert_eq!(dispatcher.hooks().sleeps, 0);
        assert_eq!(dispatcher.poll(), Some(a));
        assert_eq!(take_trace(), ["a"]);
    }

    #[test]
    #[should_panic(expected = "scheduler started twice")]
    fn test_second_dispatcher_panics() {
        let shared = Scheduler::shared();
        let _first = Dispatcher::new(&shared);
        let _second = Dispatcher::new(&shared);
    }

    #[test]
    fn test_registration_closed_after_start() {
        let shared = Scheduler::shared();
        let _dispatcher = Dispatcher::new(&shared);
        let result = with_scheduler(&shared, |s| s.register(task_a, Period::Every(1)));
        assert_eq!(result, Err(crate::error::Error::RegistrationClosed));
    }
}
