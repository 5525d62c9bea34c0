//! Optional logging
//!
//! With the `log` feature the macros forward to the `log` crate. Without it
//! they only type-check their arguments, so `no_std` builds carry no
//! formatting code.

#[cfg(feature = "log")]
macro_rules! lc_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! lc_debug {
    ($($arg:tt)*) => { if false { let _ = format_args!($($arg)*); } };
}

#[cfg(feature = "log")]
macro_rules! lc_info {
    ($($arg:tt)*) => { log::info!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! lc_info {
    ($($arg:tt)*) => { if false { let _ = format_args!($($arg)*); } };
}

#[cfg(feature = "log")]
macro_rules! lc_warn {
    ($($arg:tt)*) => { log::warn!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! lc_warn {
    ($($arg:tt)*) => { if false { let _ = format_args!($($arg)*); } };
}

#[cfg(feature = "log")]
macro_rules! lc_error {
    ($($arg:tt)*) => { log::error!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! lc_error {
    ($($arg:tt)*) => { if false { let _ = format_args!($($arg)*); } };
}
