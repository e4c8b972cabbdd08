//! Browser console output

use web_sys::console;

use crate::constants::LOG_PREFIX;

pub fn log(message: &str) {
    console::log_1(&format!("{LOG_PREFIX} {message}").into());
}

pub fn warn(message: &str) {
    console::warn_1(&format!("{LOG_PREFIX} {message}").into());
}
