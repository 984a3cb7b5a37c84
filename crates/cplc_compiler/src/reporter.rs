use cplc_api::{LogSettings, LoggingCategory, MessagesListener};
use std::fmt;

/// Routes messages to the listener, filtered by the configured categories.
#[derive(Clone, Copy)]
pub struct Reporter<'a> {
    listener: &'a dyn MessagesListener,
    settings: &'a LogSettings,
}

impl<'a> Reporter<'a> {
    pub fn new(listener: &'a dyn MessagesListener, settings: &'a LogSettings) -> Self {
        Self { listener, settings }
    }

    pub fn enabled(&self, category: LoggingCategory) -> bool {
        self.settings.enables(category)
    }

    /// Formats and forwards `message` only when `category` is enabled.
    pub fn report(&self, category: LoggingCategory, message: impl fmt::Display) {
        if self.enabled(category) {
            self.listener.add_message(category, &message.to_string());
        }
    }

    /// Records one call made by the backend into the classpath view or a
    /// content cell.
    pub fn trace_call(&self, operation: &str, arguments: fmt::Arguments<'_>) {
        if self.settings.tracing {
            tracing::trace!(operation, "{arguments}");
        }
    }
}

impl fmt::Debug for Reporter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter")
            .field("settings", self.settings)
            .finish_non_exhaustive()
    }
}
