//! Zero-cost logging facade.
//!
//! Mirrors `hdds::logging`: four severity macros over the `log` crate,
//! gated behind the `logging` feature. With the feature off every macro
//! expands to nothing and costs zero instructions.

#[cfg(feature = "logging")]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => { ::log::debug!($($arg)*) };
}
#[cfg(not(feature = "logging"))]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "logging")]
#[macro_export]
macro_rules! info_log {
    ($($arg:tt)*) => { ::log::info!($($arg)*) };
}
#[cfg(not(feature = "logging"))]
#[macro_export]
macro_rules! info_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "logging")]
#[macro_export]
macro_rules! warn_log {
    ($($arg:tt)*) => { ::log::warn!($($arg)*) };
}
#[cfg(not(feature = "logging"))]
#[macro_export]
macro_rules! warn_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "logging")]
#[macro_export]
macro_rules! error_log {
    ($($arg:tt)*) => { ::log::error!($($arg)*) };
}
#[cfg(not(feature = "logging"))]
#[macro_export]
macro_rules! error_log {
    ($($arg:tt)*) => {};
}
