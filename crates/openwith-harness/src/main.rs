// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OpenWith harness: drives the plugin against the filesystem stub bridge.
//
// The fixture is a JSON array of recorded intents. The first one is the
// launch intent, replayed by `init`; the rest arrive as new intents. Every
// delivered share event is printed to stdout as one JSON line.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use openwith_bridge::stub::StubBridge;
use openwith_core::error::Result;
use openwith_core::types::RawIntent;
use openwith_core::PluginConfig;
use openwith_plugin::{ChannelCallback, OpenWithPlugin, Payload, PluginResult};
use serde_json::{json, Value};
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedReceiver;

#[derive(Parser)]
#[command(name = "openwith-harness")]
#[command(about = "Replay recorded share intents through the OpenWith plugin", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON array of recorded intents; the first is the launch intent.
    fixture: PathBuf,

    /// Plugin configuration file (JSON).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Register the share handler only after every intent has arrived.
    #[arg(long)]
    late_handler: bool,

    /// Load this URI after the replay and print its base64 content.
    #[arg(long)]
    load: Option<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        tracing::error!(error = %e, "harness failed");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref());
    let intents = read_fixture(&cli.fixture)?;
    tracing::info!(
        fixture = %cli.fixture.display(),
        intents = intents.len(),
        late_handler = cli.late_handler,
        "replaying intents"
    );

    let bridge = Arc::new(StubBridge::new());
    let plugin = OpenWithPlugin::new(bridge.clone(), config, Handle::current());

    let (logger, mut log_rx) = ChannelCallback::new();
    plugin.execute("setLogger", &[], logger)?;

    for event in replay(&plugin, &bridge, intents, cli.late_handler)? {
        println!("{event}");
    }
    for line in drain(&mut log_rx).iter().filter_map(PluginResult::text) {
        tracing::debug!(target: "openwith::native", "{line}");
    }

    if let Some(uri) = cli.load {
        let (context, mut rx) = ChannelCallback::new();
        plugin.execute("load", &[json!({ "uri": uri })], context)?;
        match rx.recv().await {
            Some(result) => match result.payload {
                Payload::Text(encoded) if encoded.is_empty() => {
                    tracing::warn!(uri, "content could not be read");
                }
                Payload::Text(encoded) => println!("{encoded}"),
                other => tracing::warn!(uri, payload = ?other, "unexpected load reply"),
            },
            None => tracing::warn!(uri, "load never replied"),
        }
    }
    Ok(())
}

/// Feed `intents` through the plugin and return the delivered events.
///
/// With `late_handler` the handler is registered after every intent has been
/// seen, so all events come out of the pending buffer in one flush.
fn replay(
    plugin: &OpenWithPlugin,
    bridge: &StubBridge,
    intents: Vec<RawIntent>,
    late_handler: bool,
) -> Result<Vec<Value>> {
    let mut intents = intents.into_iter();
    bridge.set_current_intent(intents.next());

    let (handler, mut events) = ChannelCallback::new();
    let mut handler = Some(handler);
    if !late_handler {
        if let Some(handler) = handler.take() {
            plugin.execute("setHandler", &[], handler)?;
        }
    }

    let (init, _ignored) = ChannelCallback::new();
    plugin.execute("init", &[], init)?;
    for intent in intents {
        plugin.on_new_intent(intent);
    }

    if let Some(handler) = handler {
        tracing::info!(
            pending = plugin.queue().pending_len(),
            "registering late handler"
        );
        plugin.execute("setHandler", &[], handler)?;
    }

    Ok(drain(&mut events)
        .into_iter()
        .filter_map(|result| match result.payload {
            Payload::Json(value) => Some(value),
            _ => None,
        })
        .collect())
}

/// Everything already sent on a callback. Delivery is synchronous, so no
/// waiting is needed after the commands above returned.
fn drain(rx: &mut UnboundedReceiver<PluginResult>) -> Vec<PluginResult> {
    let mut results = Vec::new();
    while let Ok(result) = rx.try_recv() {
        results.push(result);
    }
    results
}

fn read_fixture(path: &Path) -> Result<Vec<RawIntent>> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

fn load_config(path: Option<&Path>) -> PluginConfig {
    let Some(path) = path else {
        return PluginConfig::default();
    };
    match PluginConfig::load(path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "using default plugin config");
            PluginConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = include_str!("../fixtures/share.json");

    fn fixture_intents() -> Vec<RawIntent> {
        serde_json::from_str(FIXTURE).expect("bundled fixture parses")
    }

    fn run_replay(late_handler: bool) -> Vec<Value> {
        let bridge = Arc::new(StubBridge::new());
        let plugin = OpenWithPlugin::new(bridge.clone(), PluginConfig::default(), Handle::current());
        replay(&plugin, &bridge, fixture_intents(), late_handler).expect("replay")
    }

    #[tokio::test]
    async fn early_and_late_handlers_see_the_same_events() {
        let early = run_replay(false);
        let late = run_replay(true);

        assert_eq!(early, late);
        // The MAIN intent carries no content and yields no event.
        assert_eq!(early.len(), 3);
        assert_eq!(early[0]["action"], "SEND");
        assert_eq!(early[0]["exit"], true);
        assert_eq!(early[0]["items"][0]["text"], "https://example.org/shared-link");
        assert_eq!(early[2]["action"], "VIEW");
    }

    #[test]
    fn fixture_is_read_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("intents.json");
        std::fs::write(&path, FIXTURE).expect("write fixture");

        assert_eq!(read_fixture(&path).expect("read"), fixture_intents());
    }

    #[test]
    fn malformed_fixture_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("intents.json");
        std::fs::write(&path, "{ not json").expect("write fixture");

        assert!(read_fixture(&path).is_err());
    }

    #[test]
    fn unreadable_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, "[]").expect("write config");

        assert_eq!(load_config(Some(&path)), PluginConfig::default());
        assert_eq!(load_config(None), PluginConfig::default());
    }
}
