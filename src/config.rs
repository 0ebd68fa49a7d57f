//! # ReSCoS Configuration
//!
//! Compile-time constants governing the scheduler's time domain, task table
//! and tick source. All limits are fixed at compile time — no dynamic
//! allocation.

/// Largest value the scheduler clock reaches. One tick after this value the
/// clock resets to `0` instead of wrapping through the full `u32` range, and
/// every start-time computation is defined relative to this reset.
pub const MAX_TICKS: u32 = 0x7FFF_FFFF;

/// Longest finite period a task may request, in ticks.
pub const MAX_TASK_PERIOD: u32 = MAX_TICKS;

/// Sentinel period meaning "run once, then stay inactive until reactivated".
/// Also stored as the next start time of such a task, which puts it out of
/// reach of the clock for good.
pub const INFINITE_PERIOD: u32 = 0xFFFF_FFFF;

/// Capacity of the task table.
pub const MAX_TASKS: usize = 12;

/// Raw value of the "no task" identifier.
pub const INVALID_TASK_ID: u8 = 0xFF;

/// Exclusive upper bound for `invoke_delayed` delays. Any smaller delay
/// added to a clock value keeps the sum inside `u32`.
pub const MAX_DELAY: u32 = u32::MAX - MAX_TICKS;

/// SysTick frequency in Hz. One tick is one millisecond.
pub const TICK_HZ: u32 = 1000;

/// Core clock in Hz (16 MHz main oscillator, no PLL).
pub const SYSTEM_CLOCK_HZ: u32 = 16_000_000;

const _: () = assert!(MAX_TASKS < INVALID_TASK_ID as usize);
const _: () = assert!(MAX_TICKS < INFINITE_PERIOD);
