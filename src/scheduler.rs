//! # Scheduler
//!
//! Core scheduling logic for ReSCoS: the task table, the scheduler clock and
//! the readiness evaluator. Implements cooperative, strictly fixed-priority
//! scheduling where exactly one task runs at a time, to completion.
//!
//! ## Scheduling Algorithm
//!
//! The evaluator runs after every clock tick and again right after a task
//! returns, so the rest of the tick can be filled with other ready work.
//! One pass over the table in id order:
//! 1. **Wake**: blocked tasks whose start time has come become ready
//!    (see [`Task::is_due`] for the clock-reset rule)
//! 2. **Scan**: note the first active and the first ready task
//! 3. **Decide**: an active task is never preempted; otherwise the lowest
//!    ready id is activated and its next start time computed; otherwise the
//!    system is idle
//!
//! ## Clock
//!
//! The clock counts `0..=MAX_TICKS` and resets to `0` on the tick after
//! `MAX_TICKS`. Start times are computed with explicit arithmetic against
//! that bound, never through integer overflow.

use core::cell::RefCell;

use critical_section::Mutex;
use heapless::Vec;

use crate::config::{INFINITE_PERIOD, MAX_DELAY, MAX_TASKS, MAX_TICKS};
use crate::error::Error;
use crate::task::{Period, Task, TaskFn, TaskId, TaskState};

/// A scheduler shared between the tick interrupt and the run-loop.
pub type SharedScheduler = Mutex<RefCell<Scheduler>>;

// ---------------------------------------------------------------------------
// Scheduler struct
// ---------------------------------------------------------------------------

/// The central scheduler state: task table, clock and active task.
///
/// ## Design Notes
///
/// - All tasks are stored inline in a fixed-capacity vector (no heap)
/// - A task's index in `tasks` is its id and its priority
/// - `active_task` mirrors the single task in `TaskState::Active`, if any
pub struct Scheduler {
    tasks: Vec<Task, MAX_TASKS>,
    active_task: Option<TaskId>,
    now: u32,
    started: bool,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// Create an empty scheduler with the clock at zero.
    pub const fn new() -> Self {
        Self {
            tasks: Vec::new(),
            active_task: None,
            now: 0,
            started: false,
        }
    }

    /// Create an empty scheduler wrapped for sharing with an interrupt.
    pub const fn shared() -> SharedScheduler {
        Mutex::new(RefCell::new(Self::new()))
    }

    // -----------------------------------------------------------------------
    // Task table
    // -----------------------------------------------------------------------

    /// Register a new task. The first task registered has the highest
    /// priority.
    ///
    /// # Returns
    /// - `Ok(id)` — the next sequential id; the task starts out ready
    /// - `Err(RegistrationClosed)` — the run-loop has already started
    /// - `Err(PeriodOutOfRange)` — a finite period above `MAX_TASK_PERIOD`
    /// - `Err(CapacityExceeded)` — `MAX_TASKS` tasks already registered
    pub fn register(&mut self, function: TaskFn, period: Period) -> Result<TaskId, Error> {
        if self.started {
            log_error!("task registered after start");
            return Err(Error::RegistrationClosed);
        }
        let period = period.validate().inspect_err(|_e| {
            log_error!("rejected task: {}", _e);
        })?;

        let id = TaskId::from_raw(self.tasks.len() as u8);
        self.tasks
            .push(Task::new(id, function, period))
            .map_err(|_| {
                log_error!("task table full ({} tasks)", MAX_TASKS);
                Error::CapacityExceeded
            })?;

        log_info!("task {} registered, period {}", id, period);
        Ok(id)
    }

    /// Set the state of a task.
    ///
    /// `Active` is rejected: only the evaluator activates tasks. An id beyond
    /// the registered range is ignored.
    pub fn set_state(&mut self, id: TaskId, state: TaskState) -> Result<(), Error> {
        if state == TaskState::Active {
            log_error!("task {} cannot be set active", id);
            return Err(Error::ForcedActivation);
        }
        if !id.is_valid() {
            log_error!("set_state on invalid task id");
            return Err(Error::InvalidTaskId);
        }

        if let Some(task) = self.tasks.get_mut(id.index()) {
            log_debug!("task {}: {} -> {}", id, task.state, state);
            task.state = state;
        }
        Ok(())
    }

    /// Switch every task off.
    ///
    /// At least one task has to be reactivated afterwards, otherwise the
    /// run-loop idles forever.
    pub fn switch_all_off(&mut self) {
        log_warn!("switching all {} tasks off", self.tasks.len());
        for task in self.tasks.iter_mut() {
            task.state = TaskState::Off;
        }
    }

    /// Replace a task's period. An already scheduled start time is kept.
    pub fn set_period(&mut self, id: TaskId, period: Period) -> Result<(), Error> {
        let index = self.check_id(id)?;
        let period = period.validate().inspect_err(|_e| {
            log_error!("task {}: {}", id, _e);
        })?;

        log_debug!("task {} period -> {}", id, period);
        self.tasks[index].period = period.ticks();
        Ok(())
    }

    /// Start a task `delay` ticks from now.
    ///
    /// An `Off` task is switched to `Blocked` so the evaluator picks it up
    /// when the time comes; any other state only gets its start time moved.
    pub fn invoke_delayed(&mut self, id: TaskId, delay: u32) -> Result<(), Error> {
        let index = self.check_id(id)?;
        if delay >= MAX_DELAY {
            log_error!("task {}: delay {} overflows", id, delay);
            return Err(Error::DelayOverflow(delay));
        }

        // Cannot overflow: now <= MAX_TICKS and delay < u32::MAX - MAX_TICKS.
        let mut next_start = self.now + delay;
        if next_start > MAX_TICKS {
            next_start -= MAX_TICKS;
        }

        let task = &mut self.tasks[index];
        task.next_start_time = next_start;
        if task.state == TaskState::Off {
            task.state = TaskState::Blocked;
        }

        log_debug!("task {} delayed to {}", id, next_start);
        Ok(())
    }

    fn check_id(&self, id: TaskId) -> Result<usize, Error> {
        if !id.is_valid() {
            log_error!("invalid task id");
            return Err(Error::InvalidTaskId);
        }
        if id.index() >= self.tasks.len() {
            log_error!("task {} is not registered", id);
            return Err(Error::UnknownTask(id));
        }
        Ok(id.index())
    }

    // -----------------------------------------------------------------------
    // Clock and evaluation
    // -----------------------------------------------------------------------

    /// Advance the clock by one tick and re-evaluate readiness.
    ///
    /// Called from the 1 ms timer interrupt.
    pub fn tick(&mut self) {
        if self.now < MAX_TICKS {
            self.now += 1;
        } else {
            log_info!("scheduler clock reset");
            self.now = 0;
        }
        self.evaluate();
    }

    /// Readiness evaluator. Wakes due tasks and activates the highest
    /// priority ready task if nothing is running.
    pub fn evaluate(&mut self) {
        let now = self.now;
        let mut active = None;
        let mut ready = None;

        for task in self.tasks.iter_mut() {
            if task.state == TaskState::Blocked && task.is_due(now) {
                task.state = TaskState::Ready;
            }

            if active.is_none() && task.state == TaskState::Active {
                active = Some(task.id);
            }
            if ready.is_none() && task.state == TaskState::Ready {
                ready = Some(task.id);
            }
        }

        if active.is_some() {
            // No preemption.
            return;
        }

        match ready {
            Some(id) => self.activate(id),
            None => self.active_task = None,
        }
    }

    fn activate(&mut self, id: TaskId) {
        let now = self.now;
        let task = &mut self.tasks[id.index()];

        task.state = TaskState::Active;
        task.runs = task.runs.wrapping_add(1);
        task.next_start_time = if task.period == INFINITE_PERIOD {
            INFINITE_PERIOD
        } else {
            next_period_start(now, task.period)
        };

        self.active_task = Some(id);
    }

    /// Bookkeeping after `id`'s function returned: demote it to `Blocked`
    /// unless it changed its own state while running, then re-evaluate so a
    /// ready task can start within the same tick.
    ///
    /// Must run in the same critical section as the tick handler's
    /// evaluation, never interleaved with it.
    pub fn finish(&mut self, id: TaskId) {
        if let Some(task) = self.tasks.get_mut(id.index()) {
            if task.state == TaskState::Active {
                task.state = TaskState::Blocked;
            }
        }
        self.evaluate();
    }

    /// Close registration. Returns `false` if it was already closed.
    pub(crate) fn mark_started(&mut self) -> bool {
        !core::mem::replace(&mut self.started, true)
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    /// Current clock value.
    pub fn now(&self) -> u32 {
        self.now
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// The task currently chosen to run, `None` when idle.
    pub fn active_task(&self) -> Option<TaskId> {
        self.active_task
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(id.index())
    }

    pub fn state(&self, id: TaskId) -> Option<TaskState> {
        self.task(id).map(|t| t.state)
    }

    /// Body of the active task, if any.
    pub fn active_function(&self) -> Option<(TaskId, TaskFn)> {
        let id = self.active_task?;
        self.task(id).map(|t| (id, t.function))
    }
}

/// Clock value one period after `now`, folded back into `0..=MAX_TICKS`.
fn next_period_start(now: u32, period: u32) -> u32 {
    // Both operands are at most MAX_TICKS, so the sum fits in u32.
    if now + period <= MAX_TICKS {
        now + period
    } else {
        period - (MAX_TICKS - now)
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
