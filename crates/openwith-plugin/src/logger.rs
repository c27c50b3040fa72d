// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plugin logger: every line goes to `tracing`, and lines at or above the
// current verbosity are also forwarded to the JavaScript log sink as
// `"<level>:<message>"`.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex};

use openwith_core::types::LogLevel;

use crate::callback::{CallbackContext, PluginResult};

pub struct PluginLogger {
    name: String,
    verbosity: AtomicI32,
    sink: Mutex<Option<Arc<dyn CallbackContext>>>,
}

impl PluginLogger {
    pub fn new(name: impl Into<String>, verbosity: i32) -> Self {
        Self {
            name: name.into(),
            verbosity: AtomicI32::new(verbosity),
            sink: Mutex::new(None),
        }
    }

    pub fn verbosity(&self) -> i32 {
        self.verbosity.load(Ordering::SeqCst)
    }

    pub fn set_verbosity(&self, level: i32) {
        self.verbosity.store(level, Ordering::SeqCst);
    }

    /// Route forwarded lines to `sink`, replacing any previous one.
    pub fn set_sink(&self, sink: Arc<dyn CallbackContext>) {
        *self.sink.lock().expect("logger sink lock poisoned") = Some(sink);
    }

    pub fn has_sink(&self) -> bool {
        self.sink.lock().expect("logger sink lock poisoned").is_some()
    }

    /// Drop the sink and restore `verbosity`.
    pub fn reset(&self, verbosity: i32) {
        self.set_verbosity(verbosity);
        *self.sink.lock().expect("logger sink lock poisoned") = None;
    }

    pub fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Debug => tracing::debug!(plugin = %self.name, "{message}"),
            LogLevel::Info => tracing::info!(plugin = %self.name, "{message}"),
            LogLevel::Warn => tracing::warn!(plugin = %self.name, "{message}"),
            LogLevel::Error => tracing::error!(plugin = %self.name, "{message}"),
        }

        if level.as_i32() < self.verbosity() {
            return;
        }
        let sink = self.sink.lock().expect("logger sink lock poisoned").clone();
        if let Some(sink) = sink {
            sink.send(PluginResult::ok_text(format!("{}:{message}", level.as_i32())).keep());
        }
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::ChannelCallback;

    #[test]
    fn forwards_lines_at_or_above_verbosity() {
        let logger = PluginLogger::new("OpenWithPlugin", LogLevel::Info.as_i32());
        let (sink, mut rx) = ChannelCallback::new();
        logger.set_sink(sink);

        logger.debug("hidden");
        logger.info("shown");
        logger.error("also shown");

        let first = rx.try_recv().expect("info line");
        assert_eq!(first.text(), Some("10:shown"));
        assert!(first.keep_callback);
        assert_eq!(rx.try_recv().expect("error line").text(), Some("30:also shown"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn message_colons_are_preserved() {
        let logger = PluginLogger::new("OpenWithPlugin", 0);
        let (sink, mut rx) = ChannelCallback::new();
        logger.set_sink(sink);

        logger.warn("load() content://a:b -> ok");
        assert_eq!(
            rx.try_recv().expect("line").text(),
            Some("20:load() content://a:b -> ok")
        );
    }

    #[test]
    fn reset_drops_sink_and_restores_verbosity() {
        let logger = PluginLogger::new("OpenWithPlugin", 10);
        let (sink, mut rx) = ChannelCallback::new();
        logger.set_sink(sink);
        logger.set_verbosity(30);

        logger.reset(10);
        assert_eq!(logger.verbosity(), 10);
        assert!(!logger.has_sink());

        logger.error("nobody listens");
        assert!(rx.try_recv().is_err());
    }
}
