//! Logging macros, in scope for every module declared after this one.
//!
//! Forward to `defmt` when the `defmt` feature is enabled and compile to
//! nothing otherwise, so the scheduler core carries no formatting cost in
//! builds without a logger.

#[cfg(feature = "defmt")]
macro_rules! log_trace {
    ($($arg:tt)*) => {{ ::defmt::trace!($($arg)*); }};
}

#[cfg(feature = "defmt")]
macro_rules! log_debug {
    ($($arg:tt)*) => {{ ::defmt::debug!($($arg)*); }};
}

#[cfg(feature = "defmt")]
macro_rules! log_info {
    ($($arg:tt)*) => {{ ::defmt::info!($($arg)*); }};
}

#[cfg(feature = "defmt")]
macro_rules! log_warn {
    ($($arg:tt)*) => {{ ::defmt::warn!($($arg)*); }};
}

#[cfg(feature = "defmt")]
macro_rules! log_error {
    ($($arg:tt)*) => {{ ::defmt::error!($($arg)*); }};
}

// Stub macros when defmt is not available
#[cfg(not(feature = "defmt"))]
macro_rules! log_trace {
    ($($arg:tt)*) => {{}};
}

#[cfg(not(feature = "defmt"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {{}};
}

#[cfg(not(feature = "defmt"))]
macro_rules! log_info {
    ($($arg:tt)*) => {{}};
}

#[cfg(not(feature = "defmt"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {{}};
}

#[cfg(not(feature = "defmt"))]
macro_rules! log_error {
    ($($arg:tt)*) => {{}};
}
