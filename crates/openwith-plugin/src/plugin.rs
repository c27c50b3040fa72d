// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Native side of the plugin: executes commands from JavaScript, ingests share
// intents from the host activity, and owns the session state (delivery queue
// and logger).
//
// One instance lives per application session. The host calls `on_reset` on
// navigation/reload, which drops the consumer and log sink and any buffered
// events.

use std::sync::Arc;

use openwith_bridge::PlatformBridge;
use openwith_core::error::Result;
use openwith_core::types::RawIntent;
use openwith_core::PluginConfig;
use serde_json::Value;
use tokio::runtime::Handle;

use crate::callback::{CallbackContext, PluginResult};
use crate::command::Command;
use crate::content::{self, LoadRequest};
use crate::logger::PluginLogger;
use crate::normalizer;
use crate::queue::{CallbackHandler, DeliveryQueue, Ingested};

pub struct OpenWithPlugin {
    bridge: Arc<dyn PlatformBridge>,
    config: PluginConfig,
    logger: Arc<PluginLogger>,
    queue: DeliveryQueue,
    /// Runtime the `load` worker is spawned on.
    runtime: Handle,
}

impl OpenWithPlugin {
    pub fn new(bridge: Arc<dyn PlatformBridge>, config: PluginConfig, runtime: Handle) -> Self {
        let logger = Arc::new(PluginLogger::new(
            config.plugin_name.clone(),
            config.default_verbosity,
        ));
        tracing::info!(platform = bridge.platform_name(), "openwith plugin created");
        Self {
            bridge,
            config,
            logger,
            queue: DeliveryQueue::new(),
            runtime,
        }
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    pub fn logger(&self) -> &PluginLogger {
        &self.logger
    }

    pub fn queue(&self) -> &DeliveryQueue {
        &self.queue
    }

    /// Run one command. Invalid calls reply `INVALID_ACTION` on `context`
    /// and return the parse error; valid ones reply as the command defines.
    pub fn execute(
        &self,
        action: &str,
        args: &[Value],
        context: Arc<dyn CallbackContext>,
    ) -> Result<()> {
        self.logger.debug(&format!(
            "execute() called with action:{action} and options: {}",
            Value::from(args.to_vec())
        ));

        let command = match Command::parse(action, args) {
            Ok(command) => command,
            Err(e) => {
                self.logger.warn(&format!("{action}() -> invalidAction ({e})"));
                context.send(PluginResult::invalid_action());
                return Err(e);
            }
        };

        let name = command.name();
        match command {
            Command::SetVerbosity(level) => {
                self.logger.set_verbosity(level);
                self.logger.debug(&format!("{name}() -> ok"));
                context.send(PluginResult::ok());
            }
            Command::Init => {
                self.init();
                self.logger.debug(&format!("{name}() -> ok"));
                context.send(PluginResult::ok());
            }
            Command::SetHandler => {
                context.send(PluginResult::no_result().keep());
                let flushed = self
                    .queue
                    .register_handler(Arc::new(CallbackHandler::new(context)));
                self.logger
                    .debug(&format!("{name}() -> ok, {flushed} pending event(s) flushed"));
            }
            Command::SetLogger => {
                self.logger.set_sink(Arc::clone(&context));
                self.logger.debug(&format!("{name}() -> ok"));
                context.send(PluginResult::no_result().keep());
            }
            Command::Load(descriptor) => self.load(descriptor, context),
            Command::Exit => {
                if let Err(e) = self.bridge.move_task_to_back() {
                    self.logger.error(&format!("{name}() -> {e}"));
                    context.send(PluginResult::error(e.to_string()));
                    return Err(e);
                }
                self.logger.debug(&format!("{name}() -> ok"));
                context.send(PluginResult::ok());
            }
        }
        Ok(())
    }

    /// Handle an intent delivered to the host activity.
    ///
    /// When the activity is not its task's root the intent is relaunched on
    /// a fresh activity instead, so the app runs as a single task.
    pub fn on_new_intent(&self, intent: RawIntent) {
        self.logger.debug(&format!("onNewIntent() {}", intent.action));

        if !self.bridge.is_task_root() {
            if let Err(e) = self.bridge.relaunch(&intent) {
                self.logger.error(&format!("failed to relaunch intent: {e}"));
            }
            return;
        }

        let Some(event) = normalizer::normalize(&*self.bridge, &intent) else {
            self.logger.debug("onNewIntent() -> no share event");
            return;
        };
        match self.queue.ingest(event) {
            Ingested::Delivered => self.logger.debug("onNewIntent() -> delivered"),
            Ingested::Buffered => self.logger.debug("onNewIntent() -> pending until setHandler"),
        }
    }

    /// Forget the consumer, the log sink and any pending events.
    pub fn on_reset(&self) {
        self.logger.reset(self.config.default_verbosity);
        self.queue.clear();
        tracing::debug!("openwith plugin reset");
    }

    fn init(&self) {
        match self.bridge.current_intent() {
            Ok(Some(intent)) => self.on_new_intent(intent),
            Ok(None) => self.logger.debug("init() no launch intent"),
            Err(e) => self.logger.warn(&format!("init() could not read launch intent: {e}")),
        }
    }

    /// Read the content on a blocking worker and reply exactly once.
    fn load(&self, descriptor: Value, context: Arc<dyn CallbackContext>) {
        self.logger.debug("load()");
        let bridge = Arc::clone(&self.bridge);
        let logger = Arc::clone(&self.logger);
        self.runtime.spawn_blocking(move || {
            let request = match LoadRequest::from_value(&descriptor) {
                Ok(request) => request,
                Err(e) => {
                    context.send(PluginResult::error(e.to_string()));
                    logger.debug("load() -> json error");
                    return;
                }
            };
            let data = content::load_base64(&*bridge, &request.uri);
            context.send(PluginResult::ok_text(data));
            logger.debug(&format!("load() {} -> ok", request.uri));
        });
    }
}
