//! Snow effect constants
//!
//! Defaults apply until a remote settings document overrides them.

// Settings
pub const DEFAULT_CHARACTER: &str = "❄";
pub const DEFAULT_SPEED_MS: u32 = 40_000;
pub const DEFAULT_FREQUENCY_MS: u32 = 500;
pub const DEFAULT_COLOR: &str = "#Fa0000";
pub const DEFAULT_BLUR: bool = false;
pub const DEFAULT_ENABLED: bool = true;
pub const DEFAULT_SMALL_PX: f64 = 16.0;
pub const DEFAULT_LARGE_PX: f64 = 32.0;
pub const DEFAULT_WIND: f64 = 100.0;
pub const DEFAULT_WIND_VARIANCE: f64 = 50.0;
pub const DEFAULT_START_OPACITY: f64 = 1.0;
pub const DEFAULT_END_OPACITY: f64 = 0.0;
pub const DEFAULT_OVERFLOW: &str = "hidden";
pub const DEFAULT_Z_INDEX: u32 = 9999;

// Emitter
pub const MAX_SNOWFLAKES: usize = 100;

// Remote settings
pub const POLL_INTERVAL_MS: u32 = 5_000;

// DOM
pub const OVERLAY_CLASS: &str = "snow-container";
pub const BLUR_FILTER: &str = "blur(1px)";
pub const LOG_PREFIX: &str = "[SnowEffect]";
