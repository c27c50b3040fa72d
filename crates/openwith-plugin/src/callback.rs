// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Callback channel between the native plugin and the JavaScript host.
//
// Every command receives a callback context. A result sent with
// `keep_callback` leaves the context open for further results (handler and
// logger registrations); any other result finishes it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Outcome reported to the JavaScript side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    NoResult,
    Ok,
    Error,
    InvalidAction,
}

/// Data attached to a result.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    None,
    Text(String),
    Json(Value),
}

/// One message on a callback context.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginResult {
    pub status: Status,
    pub payload: Payload,
    pub keep_callback: bool,
}

impl PluginResult {
    pub fn new(status: Status, payload: Payload) -> Self {
        Self {
            status,
            payload,
            keep_callback: false,
        }
    }

    pub fn ok() -> Self {
        Self::new(Status::Ok, Payload::None)
    }

    pub fn ok_text(text: impl Into<String>) -> Self {
        Self::new(Status::Ok, Payload::Text(text.into()))
    }

    pub fn ok_json(value: Value) -> Self {
        Self::new(Status::Ok, Payload::Json(value))
    }

    pub fn no_result() -> Self {
        Self::new(Status::NoResult, Payload::None)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Status::Error, Payload::Text(message.into()))
    }

    pub fn invalid_action() -> Self {
        Self::new(Status::InvalidAction, Payload::None)
    }

    /// Keep the context open after this result.
    pub fn keep(mut self) -> Self {
        self.keep_callback = true;
        self
    }

    pub fn text(&self) -> Option<&str> {
        match &self.payload {
            Payload::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Sink for results addressed to one JavaScript callback.
///
/// Sending is fire-and-forget: there is no acknowledgement channel.
pub trait CallbackContext: Send + Sync {
    fn send(&self, result: PluginResult);
}

/// Callback context backed by an unbounded tokio channel.
pub struct ChannelCallback {
    tx: UnboundedSender<PluginResult>,
    finished: AtomicBool,
}

impl ChannelCallback {
    /// Create a context and the receiver the host reads results from.
    pub fn new() -> (Arc<Self>, UnboundedReceiver<PluginResult>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let context = Arc::new(Self {
            tx,
            finished: AtomicBool::new(false),
        });
        (context, rx)
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }
}

impl CallbackContext for ChannelCallback {
    fn send(&self, result: PluginResult) {
        if self.finished.load(Ordering::SeqCst) {
            tracing::debug!(status = ?result.status, "dropping result for finished callback");
            return;
        }
        if !result.keep_callback {
            self.finished.store(true, Ordering::SeqCst);
        }
        if self.tx.send(result).is_err() {
            tracing::debug!("callback receiver dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kept_callbacks_stay_open() {
        let (context, mut rx) = ChannelCallback::new();
        context.send(PluginResult::ok_text("1").keep());
        context.send(PluginResult::ok_text("2").keep());
        assert!(!context.is_finished());

        assert_eq!(rx.try_recv().expect("first").text(), Some("1"));
        assert_eq!(rx.try_recv().expect("second").text(), Some("2"));
    }

    #[test]
    fn final_result_closes_the_callback() {
        let (context, mut rx) = ChannelCallback::new();
        context.send(PluginResult::ok());
        context.send(PluginResult::ok_text("late"));
        assert!(context.is_finished());

        assert_eq!(rx.try_recv().expect("first").status, Status::Ok);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn sending_after_receiver_dropped_is_silent() {
        let (context, rx) = ChannelCallback::new();
        drop(rx);
        context.send(PluginResult::ok().keep());
    }
}
