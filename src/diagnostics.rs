//! Structured solver diagnostics.
//!
//! The screening pipeline reports its derived quantities (thresholds,
//! active-set sizes, optimizer outcome) through an injectable observer
//! rather than printing them, so callers can route events wherever they
//! like. The default observer forwards to the `log` facade at debug level.

/// Receives structured events from the solver as `(name, numeric fields)`.
pub trait ScreeningObserver {
    fn record(&mut self, event: &str, fields: &[(&str, f64)]);
}

/// Forwards events to `log::debug!`.
pub struct LogObserver;

impl ScreeningObserver for LogObserver {
    fn record(&mut self, event: &str, fields: &[(&str, f64)]) {
        if log::log_enabled!(log::Level::Debug) {
            let rendered: Vec<String> = fields
                .iter()
                .map(|(key, value)| format!("{}={}", key, value))
                .collect();
            log::debug!("{} {}", event, rendered.join(" "));
        }
    }
}

/// Discards every event.
pub struct NullObserver;

impl ScreeningObserver for NullObserver {
    fn record(&mut self, _event: &str, _fields: &[(&str, f64)]) {}
}
