//! # Architecture Abstraction Layer
//!
//! Hardware glue between the portable scheduler and the tick source.
//! Currently implements the Cortex-M4 port; other targets drive
//! `kernel::tick()` from their own 1 ms timer.

#[cfg(all(target_arch = "arm", feature = "rt"))]
pub mod cortex_m4;
