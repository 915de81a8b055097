//! Configuration validation.
//!
//! Validates numeric ranges, collecting every error into a single
//! `ConfigError::ValidationError`.

use mirador_common::ConfigError;

use crate::schema::MiradorConfig;

/// Push an error if `value` is outside `[min, max]`.
fn validate_range(errors: &mut Vec<String>, name: &str, value: u64, min: u64, max: u64) {
    if value < min || value > max {
        errors.push(format!("{name} = {value} is out of range [{min}, {max}]"));
    }
}

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &MiradorConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_range(
        &mut errors,
        "window.titlebar_height",
        config.window.titlebar_height as u64,
        0,
        200,
    );
    validate_range(
        &mut errors,
        "window.tab_strip_height",
        config.window.tab_strip_height as u64,
        0,
        200,
    );
    validate_range(
        &mut errors,
        "window.sidebar_width",
        config.window.sidebar_width as u64,
        0,
        1000,
    );
    validate_range(
        &mut errors,
        "window.border_width",
        config.window.border_width as u64,
        0,
        20,
    );
    validate_range(
        &mut errors,
        "window.default_width",
        config.window.default_width as u64,
        100,
        10_000,
    );
    validate_range(
        &mut errors,
        "window.default_height",
        config.window.default_height as u64,
        100,
        10_000,
    );
    validate_range(
        &mut errors,
        "compositor.capture_timeout_ms",
        config.compositor.capture_timeout_ms,
        100,
        60_000,
    );
    validate_range(
        &mut errors,
        "compositor.bounds_flush_ms",
        config.compositor.bounds_flush_ms,
        1,
        1000,
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
