// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Consumer side of the plugin, as seen by the hosted application.
//
// The client registers itself with the native plugin once (`init`), then fans
// every delivered share event out to its handlers. Events are remembered for
// the lifetime of the client so a handler added late still sees every file
// the app was opened with.

use std::sync::{Arc, Mutex};

use openwith_core::error::OpenWithError;
use openwith_core::types::{LogLevel, ShareEvent};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::callback::{ChannelCallback, Payload, PluginResult, Status};
use crate::plugin::OpenWithPlugin;

/// Callback receiving share events.
pub type FileHandler = Arc<dyn Fn(&ShareEvent) + Send + Sync>;

/// Destination for formatted client log lines.
pub type LogWriter = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid verbosity level: {0}")]
    InvalidVerbosity(i32),

    #[error("handler already defined")]
    HandlerAlreadyDefined,

    #[error("init should only be called once")]
    AlreadyInitialized,

    #[error("native init failed")]
    InitFailed,

    #[error(transparent)]
    Plugin(#[from] OpenWithError),
}

struct ClientState {
    verbosity: i32,
    handlers: Vec<FileHandler>,
    /// Every event received so far, never cleared except by `reset`.
    files: Vec<ShareEvent>,
    writer: LogWriter,
    init_called: bool,
}

impl ClientState {
    fn new() -> Self {
        Self {
            verbosity: LogLevel::Info.as_i32(),
            handlers: Vec::new(),
            files: Vec::new(),
            writer: Arc::new(|line: &str| tracing::info!(target: "openwith::client", "{line}")),
            init_called: false,
        }
    }
}

#[derive(Clone)]
pub struct OpenWithClient {
    plugin: Arc<OpenWithPlugin>,
    state: Arc<Mutex<ClientState>>,
}

impl OpenWithClient {
    pub fn new(plugin: Arc<OpenWithPlugin>) -> Self {
        Self {
            plugin,
            state: Arc::new(Mutex::new(ClientState::new())),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ClientState> {
        self.state.lock().expect("client state lock poisoned")
    }

    /// Restore defaults: no handlers, no remembered files, `Info` verbosity.
    pub fn reset(&self) {
        self.log(LogLevel::Debug.as_i32(), "reset");
        *self.lock() = ClientState::new();
    }

    pub fn set_logger(&self, writer: LogWriter) {
        self.lock().writer = writer;
    }

    /// Change the verbosity here and on the native side.
    pub fn set_verbosity(&self, level: i32) -> Result<(), ClientError> {
        self.log(LogLevel::Debug.as_i32(), "setVerbosity()");
        if LogLevel::from_i32(level).is_none() {
            return Err(ClientError::InvalidVerbosity(level));
        }
        self.lock().verbosity = level;
        let (context, _ignored) = ChannelCallback::new();
        self.plugin
            .execute("setVerbosity", &[level.into()], context)?;
        Ok(())
    }

    pub fn verbosity(&self) -> i32 {
        self.lock().verbosity
    }

    pub fn about(&self) -> &'static str {
        concat!("openwith ", env!("CARGO_PKG_VERSION"))
    }

    /// Register `handler` and replay every file received so far to it.
    ///
    /// Handlers run without the client lock held and may call back into the
    /// client.
    pub fn add_handler(&self, handler: FileHandler) -> Result<(), ClientError> {
        self.log(LogLevel::Debug.as_i32(), "addHandler()");
        let replay = {
            let mut state = self.lock();
            if state.handlers.iter().any(|known| Arc::ptr_eq(known, &handler)) {
                return Err(ClientError::HandlerAlreadyDefined);
            }
            state.handlers.push(Arc::clone(&handler));
            state.files.clone()
        };
        for file in &replay {
            handler(file);
        }
        Ok(())
    }

    pub fn num_handlers(&self) -> usize {
        self.lock().handlers.len()
    }

    /// Snapshot of every event received so far.
    pub fn files(&self) -> Vec<ShareEvent> {
        self.lock().files.clone()
    }

    /// Wire the client to the native plugin: log sink, event handler, then
    /// `init`. Resolves once the native side has answered `init`.
    pub async fn init(&self) -> Result<(), ClientError> {
        self.log(LogLevel::Debug.as_i32(), "init()");
        {
            let mut state = self.lock();
            if state.init_called {
                return Err(ClientError::AlreadyInitialized);
            }
            state.init_called = true;
        }

        let (logger, log_rx) = ChannelCallback::new();
        self.plugin.execute("setLogger", &[], logger)?;
        tokio::spawn(self.clone().pump_native_logs(log_rx));

        let (handler, event_rx) = ChannelCallback::new();
        self.plugin.execute("setHandler", &[], handler)?;
        tokio::spawn(self.clone().pump_events(event_rx));

        let (context, mut init_rx) = ChannelCallback::new();
        self.plugin.execute("init", &[], context)?;
        match init_rx.recv().await {
            Some(PluginResult {
                status: Status::Ok, ..
            }) => {
                self.log(LogLevel::Debug.as_i32(), "initSuccess()");
                Ok(())
            }
            _ => {
                self.log(LogLevel::Debug.as_i32(), "initError()");
                Err(ClientError::InitFailed)
            }
        }
    }

    fn on_new_file(&self, event: ShareEvent) {
        if let Ok(json) = serde_json::to_string(&event) {
            self.log(LogLevel::Debug.as_i32(), &format!("onNewFile({json})"));
        }
        // Recording the file and snapshotting the handlers under one lock
        // pairs with `add_handler`, so each handler sees each file once.
        let handlers = {
            let mut state = self.lock();
            state.files.push(event.clone());
            state.handlers.clone()
        };
        for handler in &handlers {
            handler(&event);
        }
    }

    async fn pump_events(self, mut rx: UnboundedReceiver<PluginResult>) {
        while let Some(result) = rx.recv().await {
            let Payload::Json(value) = result.payload else {
                continue;
            };
            match serde_json::from_value::<ShareEvent>(value) {
                Ok(event) => self.on_new_file(event),
                Err(e) => self.log(
                    LogLevel::Error.as_i32(),
                    &format!("malformed share event: {e}"),
                ),
            }
        }
    }

    /// Native lines arrive as `"<level>:<message>"`; anything else is dropped.
    async fn pump_native_logs(self, mut rx: UnboundedReceiver<PluginResult>) {
        while let Some(result) = rx.recv().await {
            let Some((level, message)) = result.text().and_then(|line| line.split_once(':'))
            else {
                continue;
            };
            if let Ok(level) = level.trim().parse::<i32>() {
                self.log(level, &format!("[native] {message}"));
            }
        }
    }

    fn log(&self, level: i32, message: &str) {
        let writer = {
            let state = self.lock();
            if level < state.verbosity {
                return;
            }
            Arc::clone(&state.writer)
        };
        writer(&format_line(level, message));
    }
}

/// `MM-DD HH:MM:SS <letter> openwith: <message>` in local time.
fn format_line(level: i32, message: &str) -> String {
    format!(
        "{} {} openwith: {message}",
        chrono::Local::now().format("%m-%d %H:%M:%S"),
        LogLevel::bucket(level).letter()
    )
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use openwith_bridge::stub::StubBridge;
    use openwith_core::PluginConfig;
    use openwith_core::types::{ACTION_SEND, ClipItem, RawIntent};
    use tokio::runtime::Handle;

    use super::*;

    fn setup() -> (Arc<StubBridge>, Arc<OpenWithPlugin>, OpenWithClient) {
        let bridge = Arc::new(StubBridge::new());
        let plugin = Arc::new(OpenWithPlugin::new(
            bridge.clone(),
            PluginConfig::default(),
            Handle::current(),
        ));
        let client = OpenWithClient::new(Arc::clone(&plugin));
        (bridge, plugin, client)
    }

    fn text_intent(text: &str) -> RawIntent {
        RawIntent::new(ACTION_SEND).with_clip_data(vec![ClipItem::text(text)])
    }

    fn first_text(event: &ShareEvent) -> String {
        event.items()[0].inline_text.clone().unwrap_or_default()
    }

    async fn eventually(mut check: impl FnMut() -> bool) {
        for _ in 0..400 {
            if check() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached in time");
    }

    fn recording_handler() -> (FileHandler, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handler: FileHandler = Arc::new(move |event: &ShareEvent| {
            sink.lock().expect("seen").push(first_text(event));
        });
        (handler, seen)
    }

    #[tokio::test]
    async fn launch_intent_reaches_client_after_init() {
        let (bridge, _plugin, client) = setup();
        bridge.set_current_intent(Some(text_intent("launch")));

        client.init().await.expect("init");
        eventually(|| client.files().len() == 1).await;
        assert_eq!(first_text(&client.files()[0]), "launch");
    }

    #[tokio::test]
    async fn late_handler_sees_earlier_files() {
        let (_bridge, plugin, client) = setup();
        client.init().await.expect("init");

        plugin.on_new_intent(text_intent("a"));
        plugin.on_new_intent(text_intent("b"));
        eventually(|| client.files().len() == 2).await;

        let (handler, seen) = recording_handler();
        client.add_handler(handler).expect("add");
        assert_eq!(*seen.lock().expect("seen"), vec!["a", "b"]);

        plugin.on_new_intent(text_intent("c"));
        eventually(|| seen.lock().expect("seen").len() == 3).await;
        assert_eq!(client.num_handlers(), 1);
    }

    #[tokio::test]
    async fn handlers_may_call_back_into_the_client() {
        let (_bridge, plugin, client) = setup();
        client.init().await.expect("init");
        plugin.on_new_intent(text_intent("before"));
        eventually(|| client.files().len() == 1).await;

        let observed = Arc::new(Mutex::new(Vec::<(usize, usize)>::new()));
        let handler: FileHandler = {
            let inner = client.clone();
            let observed = Arc::clone(&observed);
            Arc::new(move |_: &ShareEvent| {
                let seen = (inner.num_handlers(), inner.files().len());
                observed.lock().expect("observed").push(seen);
            })
        };

        // Replay path.
        let adder = client.clone();
        let added = tokio::time::timeout(
            Duration::from_secs(2),
            tokio::task::spawn_blocking(move || adder.add_handler(handler)),
        )
        .await
        .expect("add_handler returned in time")
        .expect("join");
        added.expect("add");
        assert_eq!(*observed.lock().expect("observed"), vec![(1, 1)]);

        // Pump path.
        plugin.on_new_intent(text_intent("after"));
        eventually(|| observed.lock().expect("observed").len() == 2).await;
        assert_eq!(observed.lock().expect("observed")[1], (1, 2));

        // The pump is still alive for later events.
        plugin.on_new_intent(text_intent("later"));
        eventually(|| client.files().len() == 3).await;
    }

    #[tokio::test]
    async fn handler_can_register_another_handler() {
        let (_bridge, plugin, client) = setup();
        client.init().await.expect("init");

        let (second, seen) = recording_handler();
        let first: FileHandler = {
            let inner = client.clone();
            Arc::new(move |_: &ShareEvent| {
                let _ = inner.add_handler(Arc::clone(&second));
            })
        };
        client.add_handler(first).expect("add");

        plugin.on_new_intent(text_intent("x"));
        eventually(|| client.num_handlers() == 2).await;
        eventually(|| seen.lock().expect("seen").len() == 1).await;
        assert_eq!(*seen.lock().expect("seen"), vec!["x"]);
    }

    #[tokio::test]
    async fn duplicate_handler_is_rejected() {
        let (_bridge, _plugin, client) = setup();
        let (handler, _seen) = recording_handler();
        client.add_handler(Arc::clone(&handler)).expect("first add");

        let err = client.add_handler(handler).unwrap_err();
        assert!(matches!(err, ClientError::HandlerAlreadyDefined));
        assert_eq!(client.num_handlers(), 1);
    }

    #[tokio::test]
    async fn init_only_once() {
        let (_bridge, _plugin, client) = setup();
        client.init().await.expect("init");
        assert!(matches!(client.init().await, Err(ClientError::AlreadyInitialized)));
    }

    #[tokio::test]
    async fn verbosity_is_validated_and_forwarded() {
        let (_bridge, plugin, client) = setup();
        assert!(matches!(
            client.set_verbosity(15),
            Err(ClientError::InvalidVerbosity(15))
        ));
        assert_eq!(client.verbosity(), 10);

        client.set_verbosity(20).expect("valid level");
        assert_eq!(client.verbosity(), 20);
        assert_eq!(plugin.logger().verbosity(), 20);
    }

    #[tokio::test]
    async fn native_log_lines_are_tagged_and_formatted() {
        let (_bridge, plugin, client) = setup();
        let lines = Arc::new(Mutex::new(Vec::<String>::new()));
        let sink = Arc::clone(&lines);
        client.set_logger(Arc::new(move |line: &str| {
            sink.lock().expect("lines").push(line.to_string());
        }));
        client.init().await.expect("init");

        plugin.logger().warn("disk: almost full");
        eventually(|| {
            lines
                .lock()
                .expect("lines")
                .iter()
                .any(|line| line.ends_with(" W openwith: [native] disk: almost full"))
        })
        .await;

        let lines = lines.lock().expect("lines");
        let line = lines
            .iter()
            .find(|line| line.contains("[native] disk"))
            .expect("native line");
        // "MM-DD HH:MM:SS" prefix.
        assert_eq!(&line[2..3], "-");
        assert_eq!(&line[5..6], " ");
        assert_eq!(&line[8..9], ":");
    }

    #[tokio::test]
    async fn reset_forgets_handlers_and_files() {
        let (_bridge, plugin, client) = setup();
        client.init().await.expect("init");
        plugin.on_new_intent(text_intent("a"));
        eventually(|| client.files().len() == 1).await;
        let (handler, _seen) = recording_handler();
        client.add_handler(handler).expect("add");

        client.reset();
        assert_eq!(client.num_handlers(), 0);
        assert!(client.files().is_empty());
        assert_eq!(client.verbosity(), 10);
    }

    #[test]
    fn letters_follow_level_buckets() {
        assert!(format_line(0, "m").contains(" D openwith: m"));
        assert!(format_line(10, "m").contains(" I openwith: m"));
        assert!(format_line(20, "m").contains(" W openwith: m"));
        assert!(format_line(30, "m").contains(" E openwith: m"));
    }
}
