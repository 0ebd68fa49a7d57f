//! # Task Record
//!
//! Defines the task model for ReSCoS. A task is a plain function run to
//! completion each time the scheduler activates it, together with the
//! period it asks to be re-run at and the state the scheduler keeps for it.
//!
//! The task's id doubles as its fixed priority: ids are handed out in
//! registration order and a lower id always wins.

use crate::config::{INFINITE_PERIOD, INVALID_TASK_ID, MAX_TASK_PERIOD};
use crate::error::Error;

/// Task body. Runs to completion and must not block indefinitely.
pub type TaskFn = fn();

// ---------------------------------------------------------------------------
// Task identifier
// ---------------------------------------------------------------------------

/// Index of a task in the task table, and its scheduling priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskId(u8);

impl TaskId {
    /// "No task". Never handed out by registration.
    pub const INVALID: TaskId = TaskId(INVALID_TASK_ID);

    pub const fn from_raw(raw: u8) -> Self {
        TaskId(raw)
    }

    pub const fn raw(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != INVALID_TASK_ID
    }
}

// ---------------------------------------------------------------------------
// Task state machine
// ---------------------------------------------------------------------------

/// Scheduling state of a task.
///
/// ```text
///   register()                    evaluator: lowest id, nobody active
///  ──────────► ┌───────┐ ─────────────────────────────────► ┌────────┐
///              │ Ready │                                     │ Active │
///              └───────┘ ◄──────────┐                        └────────┘
///                                   │ now >= next_start_time      │
///   invoke_delayed() (from Off)  ┌─────────┐   function returned  │
///  ────────────────────────────► │ Blocked │ ◄────────────────────┘
///                                └─────────┘
///
///   set_state(Off) / switch_all_off() from any state ──► Off
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TaskState {
    /// Inert. Never considered by the evaluator.
    Off,
    /// Eligible to run as soon as no lower id is ready or active.
    Ready,
    /// Currently running. At most one task is in this state.
    Active,
    /// Waiting for the clock to reach its next start time.
    Blocked,
}

// ---------------------------------------------------------------------------
// Period
// ---------------------------------------------------------------------------

/// Requested re-invocation interval of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Period {
    /// Re-run every `n` milliseconds, `0..=MAX_TASK_PERIOD`.
    Every(u32),
    /// Run once, then stay blocked until explicitly reactivated.
    Once,
}

impl Period {
    /// Reconstruct a period from its raw tick representation.
    pub const fn from_ticks(ticks: u32) -> Self {
        if ticks == INFINITE_PERIOD {
            Period::Once
        } else {
            Period::Every(ticks)
        }
    }

    /// Raw tick value, with `INFINITE_PERIOD` standing in for `Once`.
    pub const fn ticks(self) -> u32 {
        match self {
            Period::Every(ms) => ms,
            Period::Once => INFINITE_PERIOD,
        }
    }

    pub fn validate(self) -> Result<Self, Error> {
        match self {
            Period::Every(ms) if ms > MAX_TASK_PERIOD => Err(Error::PeriodOutOfRange(ms)),
            _ => Ok(self),
        }
    }
}

// ---------------------------------------------------------------------------
// Task record
// ---------------------------------------------------------------------------

/// One entry of the task table.
#[derive(Debug, Clone, Copy)]
pub struct Task {
    /// Position in the table. Immutable after registration.
    pub id: TaskId,

    /// Current scheduling state.
    pub state: TaskState,

    /// Body run on each activation.
    pub function: TaskFn,

    /// Raw period in ticks, `INFINITE_PERIOD` for one-shot tasks.
    pub period: u32,

    /// Clock value at which a blocked task becomes ready again.
    /// Only meaningful while `state == Blocked`.
    pub next_start_time: u32,

    /// Number of times the evaluator has activated this task.
    pub runs: u32,
}

impl Task {
    /// A freshly registered task: ready, no start time pending.
    pub const fn new(id: TaskId, function: TaskFn, period: Period) -> Self {
        Self {
            id,
            state: TaskState::Ready,
            function,
            period: period.ticks(),
            next_start_time: 0,
            runs: 0,
        }
    }

    /// Whether a blocked task may become ready at clock value `now`.
    ///
    /// A start time below the period can only come from a target that
    /// crossed the clock's reset to zero. Such a target is honoured only
    /// once the clock has itself reset, i.e. `now` is below the period too.
    pub fn is_due(&self, now: u32) -> bool {
        if self.next_start_time > now {
            return false;
        }
        self.next_start_time >= self.period || now < self.period
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_TICKS;

    fn noop() {}

    fn blocked(period: u32, next_start_time: u32) -> Task {
        let mut task = Task::new(TaskId::from_raw(0), noop, Period::from_ticks(period));
        task.state = TaskState::Blocked;
        task.next_start_time = next_start_time;
        task
    }

    #[test]
    fn test_new_task_is_ready() {
        let task = Task::new(TaskId::from_raw(3), noop, Period::Every(250));
        assert_eq!(task.id.raw(), 3);
        assert_eq!(task.state, TaskState::Ready);
        assert_eq!(task.period, 250);
        assert_eq!(task.next_start_time, 0);
        assert_eq!(task.runs, 0);
    }

    #[test]
    fn test_period_ticks() {
        assert_eq!(Period::Once.ticks(), INFINITE_PERIOD);
        assert_eq!(Period::from_ticks(INFINITE_PERIOD), Period::Once);
        assert_eq!(Period::from_ticks(1000), Period::Every(1000));
    }

    #[test]
    fn test_period_validation() {
        assert_eq!(Period::Every(0).validate(), Ok(Period::Every(0)));
        assert_eq!(
            Period::Every(MAX_TASK_PERIOD).validate(),
            Ok(Period::Every(MAX_TASK_PERIOD))
        );
        assert_eq!(Period::Once.validate(), Ok(Period::Once));
        assert_eq!(
            Period::Every(MAX_TASK_PERIOD + 1).validate(),
            Err(Error::PeriodOutOfRange(MAX_TASK_PERIOD + 1))
        );
        // The raw sentinel is not a finite period.
        assert!(Period::Every(INFINITE_PERIOD).validate().is_err());
    }

    #[test]
    fn test_invalid_id() {
        assert!(!TaskId::INVALID.is_valid());
        assert!(TaskId::from_raw(11).is_valid());
    }

    #[test]
    fn test_due_without_wrap() {
        let task = blocked(100, 1100);
        assert!(!task.is_due(1099));
        assert!(task.is_due(1100));
        assert!(task.is_due(1500));
    }

    #[test]
    fn test_wrapped_target_waits_for_clock_reset() {
        // Activated at MAX_TICKS - 5 with period 10: target crossed the reset.
        let task = blocked(10, 5);
        assert!(!task.is_due(MAX_TICKS - 4));
        assert!(!task.is_due(MAX_TICKS));
        assert!(!task.is_due(4));
        assert!(task.is_due(5));
        assert!(task.is_due(9));
    }

    #[test]
    fn test_period_near_max_ticks() {
        // With a huge period almost every target looks wrapped, and the
        // check then degenerates to "the clock is below the period".
        let task = blocked(MAX_TICKS, 20);
        assert!(!task.is_due(19));
        assert!(task.is_due(20));
        assert!(task.is_due(MAX_TICKS - 1));
        assert!(!task.is_due(MAX_TICKS));
    }

    #[test]
    fn test_one_shot_never_due() {
        let task = blocked(INFINITE_PERIOD, INFINITE_PERIOD);
        assert!(!task.is_due(0));
        assert!(!task.is_due(MAX_TICKS));
    }
}
