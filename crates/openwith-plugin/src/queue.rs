// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Delivery queue with late-binding handler registration.
//
// Share intents can arrive before the JavaScript side has registered its
// handler. Until then events are buffered; registering a handler flushes the
// buffer in arrival order and every later event is delivered immediately.
//
// The whole state sits behind one mutex and deliveries happen while it is
// held, so a flush can never interleave with a concurrent ingest. Handlers
// must therefore not call back into the queue.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use openwith_core::types::ShareEvent;
use tracing::{debug, error, info};

use crate::callback::{CallbackContext, PluginResult};

/// Consumer of delivered share events.
pub trait EventHandler: Send + Sync {
    fn deliver(&self, event: &ShareEvent);
}

impl<F> EventHandler for F
where
    F: Fn(&ShareEvent) + Send + Sync,
{
    fn deliver(&self, event: &ShareEvent) {
        self(event)
    }
}

/// Handler that pushes each event as JSON over a kept-open callback.
pub struct CallbackHandler {
    context: Arc<dyn CallbackContext>,
}

impl CallbackHandler {
    pub fn new(context: Arc<dyn CallbackContext>) -> Self {
        Self { context }
    }
}

impl EventHandler for CallbackHandler {
    fn deliver(&self, event: &ShareEvent) {
        match event.to_json() {
            Ok(json) => self.context.send(PluginResult::ok_json(json).keep()),
            Err(e) => error!(error = %e, "failed to serialize share event"),
        }
    }
}

/// What `ingest` did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingested {
    Delivered,
    Buffered,
}

enum QueueState {
    /// No handler yet: events wait here in arrival order.
    Unbound { pending: VecDeque<ShareEvent> },
    /// A handler is registered: events go straight to it.
    Bound { handler: Arc<dyn EventHandler> },
}

impl Default for QueueState {
    fn default() -> Self {
        Self::Unbound {
            pending: VecDeque::new(),
        }
    }
}

/// Buffers share events until a handler registers, then delivers directly.
#[derive(Default)]
pub struct DeliveryQueue {
    state: Mutex<QueueState>,
}

impl DeliveryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `event` to the handler, or buffer it if there is none yet.
    pub fn ingest(&self, event: ShareEvent) -> Ingested {
        let mut state = self.state.lock().expect("delivery queue lock poisoned");
        match &mut *state {
            QueueState::Bound { handler } => {
                handler.deliver(&event);
                debug!(action = %event.action(), "share event delivered");
                Ingested::Delivered
            }
            QueueState::Unbound { pending } => {
                pending.push_back(event);
                debug!(pending = pending.len(), "share event buffered until a handler registers");
                Ingested::Buffered
            }
        }
    }

    /// Install `handler`, flushing buffered events to it first.
    ///
    /// Replacing an existing handler redelivers nothing. Returns the number of
    /// events flushed.
    pub fn register_handler(&self, handler: Arc<dyn EventHandler>) -> usize {
        let mut state = self.state.lock().expect("delivery queue lock poisoned");
        let flushed = match std::mem::take(&mut *state) {
            QueueState::Unbound { pending } => {
                let count = pending.len();
                for event in &pending {
                    handler.deliver(event);
                }
                count
            }
            QueueState::Bound { .. } => {
                debug!("replacing registered share handler");
                0
            }
        };
        *state = QueueState::Bound { handler };
        if flushed > 0 {
            info!(flushed, "flushed buffered share events to new handler");
        }
        flushed
    }

    /// Drop the handler and any buffered events.
    pub fn clear(&self) {
        let mut state = self.state.lock().expect("delivery queue lock poisoned");
        *state = QueueState::default();
        debug!("delivery queue cleared");
    }

    pub fn is_bound(&self) -> bool {
        matches!(
            *self.state.lock().expect("delivery queue lock poisoned"),
            QueueState::Bound { .. }
        )
    }

    /// Number of events waiting for a handler.
    pub fn pending_len(&self) -> usize {
        match &*self.state.lock().expect("delivery queue lock poisoned") {
            QueueState::Unbound { pending } => pending.len(),
            QueueState::Bound { .. } => 0,
        }
    }
}
