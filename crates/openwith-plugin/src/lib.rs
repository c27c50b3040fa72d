// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OpenWith plugin: turns host share intents into normalized events, buffers
// them until the JavaScript side is listening, and serves the command
// surface (`setHandler`, `load`, `exit`, ...).  The platform specifics live
// behind the traits in `openwith-bridge`.

pub mod callback;
pub mod client;
pub mod command;
pub mod content;
pub mod logger;
pub mod normalizer;
pub mod plugin;
pub mod queue;

pub use callback::{CallbackContext, ChannelCallback, Payload, PluginResult, Status};
pub use client::{ClientError, OpenWithClient};
pub use command::Command;
pub use logger::PluginLogger;
pub use normalizer::normalize;
pub use plugin::OpenWithPlugin;
pub use queue::{DeliveryQueue, EventHandler};
