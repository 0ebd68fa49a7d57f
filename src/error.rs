//! # Contract Violations
//!
//! Every way a caller can break the scheduler's configuration contract.
//! None of these are transient: the firmware treats any `Err` as fatal and
//! halts, because continuing would corrupt priority order or timing.

use core::fmt;

use crate::task::TaskId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The task table already holds `MAX_TASKS` tasks.
    CapacityExceeded,
    /// A finite period larger than `MAX_TASK_PERIOD`.
    PeriodOutOfRange(u32),
    /// A caller asked for `TaskState::Active`; only the evaluator may activate.
    ForcedActivation,
    /// `TaskId::INVALID` was passed where a registered task is required.
    InvalidTaskId,
    /// The id was never handed out by this scheduler.
    UnknownTask(TaskId),
    /// A delay large enough to leave the tick domain.
    DelayOverflow(u32),
    /// Tasks can only be registered before the run-loop starts.
    RegistrationClosed,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::CapacityExceeded => write!(f, "task table is full"),
            Error::PeriodOutOfRange(p) => write!(f, "period {} ms is out of range", p),
            Error::ForcedActivation => write!(f, "tasks cannot be set active directly"),
            Error::InvalidTaskId => write!(f, "invalid task id"),
            Error::UnknownTask(id) => write!(f, "task {} is not registered", id.raw()),
            Error::DelayOverflow(d) => write!(f, "delay {} ms overflows the tick domain", d),
            Error::RegistrationClosed => write!(f, "scheduler already started"),
        }
    }
}

impl core::error::Error for Error {}
