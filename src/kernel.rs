//! # Kernel
//!
//! Top-level public API of ReSCoS, operating on the one scheduler instance
//! shared by the SysTick interrupt and the run-loop.
//!
//! Every function takes the critical section only for the duration of the
//! table access, so they may be called from task functions and from other
//! interrupt handlers alike.
//!
//! ## Startup Sequence
//!
//! ```text
//! reset_handler (cortex-m-rt)
//!   └─► main()
//!         ├─► kernel::create_task() ← Register tasks (×N), priority order
//!         └─► kernel::start()       ← Launch run-loop (no return)
//!               ├─► Configure SysTick at TICK_HZ
//!               ├─► Set SysTick priority
//!               └─► Dispatcher::run()
//!
//! SysTick ──► kernel::tick() ──► Scheduler::tick()
//! ```

use crate::dispatcher::{Dispatcher, Hooks};
use crate::error::Error;
use crate::scheduler::{Scheduler, SharedScheduler};
use crate::sync::with_scheduler;
use crate::task::{Period, TaskFn, TaskId, TaskState};

// ---------------------------------------------------------------------------
// Global scheduler instance
// ---------------------------------------------------------------------------

/// Global scheduler instance. Only ever accessed inside a critical section.
static SCHEDULER: SharedScheduler = Scheduler::shared();

/// The global scheduler, for callers that drive their own `Dispatcher`.
pub fn scheduler() -> &'static SharedScheduler {
    &SCHEDULER
}

// ---------------------------------------------------------------------------
// Kernel API
// ---------------------------------------------------------------------------

/// Create a new task. Tasks created first have the highest priority.
///
/// # Returns
/// - `Ok(task_id)` — the task's id, which is also its priority
/// - `Err(_)` — capacity exceeded, period out of range, or already started
///
/// # Example
/// ```ignore
/// let blink = kernel::create_task(toggle_led, Period::Every(500))
///     .expect("failed to create blink task");
/// ```
pub fn create_task(function: TaskFn, period: Period) -> Result<TaskId, Error> {
    with_scheduler(&SCHEDULER, |s| s.register(function, period))
}

/// Must be called from the 1 ms timer interrupt.
pub fn tick() {
    with_scheduler(&SCHEDULER, |s| s.tick());
}

/// Set a task's state. `TaskState::Active` is rejected.
pub fn set_state(id: TaskId, state: TaskState) -> Result<(), Error> {
    with_scheduler(&SCHEDULER, |s| s.set_state(id, state))
}

/// Switch every task off. Reactivate at least one afterwards, or the
/// run-loop idles forever.
pub fn switch_all_off() {
    with_scheduler(&SCHEDULER, |s| s.switch_all_off());
}

pub fn set_period(id: TaskId, period: Period) -> Result<(), Error> {
    with_scheduler(&SCHEDULER, |s| s.set_period(id, period))
}

/// Run a task `delay` ms from now, switching it on if it was off.
pub fn invoke_delayed(id: TaskId, delay: u32) -> Result<(), Error> {
    with_scheduler(&SCHEDULER, |s| s.invoke_delayed(id, delay))
}

/// Milliseconds since start, modulo the clock's reset.
pub fn now() -> u32 {
    with_scheduler(&SCHEDULER, |s| s.now())
}

pub fn state(id: TaskId) -> Option<TaskState> {
    with_scheduler(&SCHEDULER, |s| s.state(id))
}

/// Run the tasks of the global scheduler. **Does not return.**
///
/// Something must call [`tick`] every millisecond; [`start`] sets that up
/// on Cortex-M.
///
/// # Panics
/// If called more than once.
pub fn run<H: Hooks>(hooks: H) -> ! {
    Dispatcher::with_hooks(&SCHEDULER, hooks).run()
}

/// Start ReSCoS. **Does not return.**
///
/// Configures SysTick for a 1 ms tick at the lowest interrupt priority and
/// enters the run-loop, sleeping with `wfi` while no task is ready. With the
/// `defmt` feature the run-loop traces idle transitions and task runs.
///
/// # Panics
/// If called more than once.
#[cfg(all(target_arch = "arm", feature = "rt"))]
pub fn start(mut core_peripherals: cortex_m::Peripherals) -> ! {
    use crate::arch::cortex_m4;

    cortex_m4::configure_systick(&mut core_peripherals.SYST);
    cortex_m4::set_interrupt_priorities(&mut core_peripherals.SCB);

    #[cfg(feature = "defmt")]
    let hooks = cortex_m4::SleepHooks(crate::dispatcher::LogHooks);
    #[cfg(not(feature = "defmt"))]
    let hooks = cortex_m4::SleepHooks(crate::dispatcher::NoHooks);

    run(hooks)
}
