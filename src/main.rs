//! # ReSCoS Example Firmware
//!
//! Demonstrates the cooperative scheduler with five tasks:
//!
//! | Id | Task        | Period  | Behavior |
//! |----|-------------|---------|----------|
//! | 0  | `heartbeat` | 1000 ms | Toggles the heartbeat flag, signals `consumer` |
//! | 1  | `blink`     | 500 ms  | Toggles the blink flag |
//! | 2  | `sampler`   | 25 ms   | Counts samples, signals `consumer` every 40th |
//! | 3  | `consumer`  | 50 ms   | Drains the counting semaphore, schedules `report` |
//! | 4  | `report`    | once    | Runs at start, then only when `consumer` invokes it |
//!
//! Peripheral drivers are not part of this firmware: the tasks only touch
//! in-memory state, which is visible over RTT with the `defmt` feature.

#![no_std]
#![no_main]

use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

use cortex_m_rt::entry;
use panic_halt as _;

#[cfg(feature = "defmt")]
use defmt_rtt as _;

use rescos::kernel;
use rescos::{BinarySemaphore, CountingSemaphore, Period, TaskId};

static HEARTBEAT: AtomicBool = AtomicBool::new(false);
static BLINK: AtomicBool = AtomicBool::new(false);
static SAMPLES: AtomicU32 = AtomicU32::new(0);
static EVENTS: CountingSemaphore = CountingSemaphore::new();
static SECOND: BinarySemaphore = BinarySemaphore::new();
static HANDLED: AtomicU32 = AtomicU32::new(0);

/// Id of `report`, stored once registration hands it out.
static REPORT: AtomicU8 = AtomicU8::new(TaskId::INVALID.raw());

// ---------------------------------------------------------------------------
// Task entry points
// ---------------------------------------------------------------------------

fn heartbeat() {
    HEARTBEAT.fetch_xor(true, Ordering::Relaxed);
    SECOND.give();
}

fn blink() {
    BLINK.fetch_xor(true, Ordering::Relaxed);
}

fn sampler() {
    let n = SAMPLES.fetch_add(1, Ordering::Relaxed) + 1;
    if n % 40 == 0 {
        EVENTS.give();
    }
}

fn consumer() {
    while EVENTS.take() {
        HANDLED.fetch_add(1, Ordering::Relaxed);
    }
    if SECOND.take() {
        let id = TaskId::from_raw(REPORT.load(Ordering::Relaxed));
        kernel::invoke_delayed(id, 100).expect("report task missing");
    }
}

fn report() {
    #[cfg(feature = "defmt")]
    defmt::info!(
        "t={} samples={} handled={}",
        kernel::now(),
        SAMPLES.load(Ordering::Relaxed),
        HANDLED.load(Ordering::Relaxed)
    );
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

/// Firmware entry point. Registers tasks and starts the scheduler.
/// Does not return.
#[entry]
fn main() -> ! {
    let cp = cortex_m::Peripherals::take().unwrap();

    kernel::create_task(heartbeat, Period::Every(1000)).expect("Failed to create heartbeat");
    kernel::create_task(blink, Period::Every(500)).expect("Failed to create blink");
    kernel::create_task(sampler, Period::Every(25)).expect("Failed to create sampler");
    kernel::create_task(consumer, Period::Every(50)).expect("Failed to create consumer");
    let report_id = kernel::create_task(report, Period::Once).expect("Failed to create report");
    REPORT.store(report_id.raw(), Ordering::Relaxed);

    kernel::start(cp)
}
