//! # ReSCoS — Really Simple Cooperative Scheduler
//!
//! A cooperative, fixed-priority task scheduler for resource-constrained
//! ARM Cortex-M microcontrollers.
//!
//! ## Overview
//!
//! The application registers a fixed set of periodic or one-shot functions
//! before starting the scheduler. A 1 ms tick drives the scheduler clock;
//! exactly one task runs at a time, always to completion, and among the
//! tasks that are ready the one registered first always runs first.
//!
//! - **No preemption**: a task is only ever interrupted by the tick, never
//!   by another task
//! - **Fixed priority**: registration order is priority order
//! - **Gap filling**: when a task returns, the next ready task starts
//!   immediately instead of waiting for the next tick
//! - **Wraparound safe**: the clock resets to zero after `MAX_TICKS` and
//!   start times are computed against that reset
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                    Application Tasks                    │
//! ├────────────────────────────────────────────────────────┤
//! │                 Kernel API (kernel.rs)                  │
//! │   create_task() · start() · tick() · set_state() · ... │
//! ├──────────────┬────────────────────┬───────────────────┤
//! │  Dispatcher  │   Scheduler        │  Sync Primitives  │
//! │ dispatcher.rs│   scheduler.rs     │  sync.rs          │
//! │  ─ poll()    │   ─ tick()         │  ─ critical_section│
//! │  ─ run()     │   ─ evaluate()     │  ─ BinarySemaphore│
//! │  ─ Hooks     │   ─ finish()       │  ─ CountingSema.. │
//! ├──────────────┴────────────────────┴───────────────────┤
//! │              Task Model (task.rs)                       │
//! │        Task · TaskId · TaskState · Period               │
//! ├────────────────────────────────────────────────────────┤
//! │            Arch Port (arch/cortex_m4.rs)                │
//! │              SysTick · Interrupt priority               │
//! ├────────────────────────────────────────────────────────┤
//! │         ARM Cortex-M4 Hardware (Thumb-2)                │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Memory Model
//!
//! - **No heap**: all state is statically allocated
//! - **Fixed-size task table**: `heapless::Vec<Task, MAX_TASKS>`
//! - **Critical sections**: the tick handler and the run-loop's
//!   demote-and-reevaluate step both run under `critical_section::with`
//!   and never interleave

#![no_std]

#[macro_use]
mod log;

pub mod arch;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod kernel;
pub mod scheduler;
pub mod sync;
pub mod task;

pub use dispatcher::{sleep_unless_active, Dispatcher, Hooks, LogHooks, NoHooks};
pub use error::Error;
pub use scheduler::{Scheduler, SharedScheduler};
pub use sync::{binary_take, counting_take, BinarySemaphore, CountingSemaphore};
pub use task::{Period, Task, TaskFn, TaskId, TaskState};
