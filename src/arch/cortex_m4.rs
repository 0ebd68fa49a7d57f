//! # Cortex-M4 Port Layer
//!
//! SysTick configuration and exception handler for the ARM Cortex-M4
//! (LM4F120 / TM4C123 LaunchPad). The whole scheduler runs on the main
//! stack in Thread mode; the only asynchronous context is SysTick.
//!
//! ## Interrupt Priorities
//!
//! - SysTick: Priority 0xFF (lowest) — application interrupts that give
//!   semaphores are never delayed by the tick

use cortex_m::peripheral::scb::SystemHandler;
use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::peripheral::{SCB, SYST};
use cortex_m_rt::exception;

use crate::config::{SYSTEM_CLOCK_HZ, TICK_HZ};
use crate::dispatcher::{sleep_unless_active, Hooks, NoHooks};
use crate::kernel;
use crate::scheduler::SharedScheduler;
use crate::task::TaskId;

// ---------------------------------------------------------------------------
// SysTick configuration
// ---------------------------------------------------------------------------

/// Configure the SysTick timer for the scheduler tick.
///
/// Sets up SysTick to fire at `TICK_HZ` frequency using the processor
/// clock. Each tick triggers `SysTick` below, which calls `kernel::tick()`.
pub fn configure_systick(syst: &mut SYST) {
    let reload = SYSTEM_CLOCK_HZ / TICK_HZ - 1;
    syst.set_reload(reload);
    syst.clear_current();
    syst.set_clock_source(SystClkSource::Core);
    syst.enable_counter();
    syst.enable_interrupt();
}

// ---------------------------------------------------------------------------
// Interrupt priority configuration
// ---------------------------------------------------------------------------

/// Set SysTick to the lowest interrupt priority.
pub fn set_interrupt_priorities(scb: &mut SCB) {
    // Safety: SysTick shares no state with other handlers except through
    // critical sections, so lowering its priority cannot break a
    // priority-based locking scheme.
    unsafe {
        scb.set_priority(SystemHandler::SysTick, 0xFF);
    }
}

// ---------------------------------------------------------------------------
// Idle
// ---------------------------------------------------------------------------

/// Sleeps until the next interrupt while no task is ready, forwarding every
/// other hook to `H`.
///
/// `wfi` executes with PRIMASK set; a SysTick that fires after the idle
/// check still wakes the core, and is serviced once the mask is lifted.
#[derive(Debug, Default, Clone, Copy)]
pub struct SleepHooks<H: Hooks = NoHooks>(pub H);

impl<H: Hooks> Hooks for SleepHooks<H> {
    fn idle_entered(&mut self, now: u32) {
        self.0.idle_entered(now);
    }

    fn idle_left(&mut self, next: TaskId, now: u16) {
        self.0.idle_left(next, now);
    }

    fn task_started(&mut self, id: TaskId, now: u32) {
        self.0.task_started(id, now);
    }

    fn task_finished(&mut self, id: TaskId, now: u32) {
        self.0.task_finished(id, now);
    }

    fn idle(&mut self, scheduler: &SharedScheduler) {
        sleep_unless_active(scheduler, cortex_m::asm::wfi);
    }
}

// ---------------------------------------------------------------------------
// SysTick handler
// ---------------------------------------------------------------------------

/// SysTick exception handler — scheduler tick entry point.
#[exception]
fn SysTick() {
    kernel::tick();
}
