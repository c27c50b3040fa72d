// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the OpenWith share bridge.

use serde::{Deserialize, Serialize};

/// Intent action sent by "Share" with a single payload.
pub const ACTION_SEND: &str = "android.intent.action.SEND";
/// Intent action sent by "Share" with several payloads.
pub const ACTION_SEND_MULTIPLE: &str = "android.intent.action.SEND_MULTIPLE";
/// Intent action sent by "Open with".
pub const ACTION_VIEW: &str = "android.intent.action.VIEW";

/// MIME type reported for inline text items.
pub const TEXT_PLAIN: &str = "text/plain";

// ---------------------------------------------------------------------------
// Log levels
// ---------------------------------------------------------------------------

/// Plugin log levels. The numeric values cross the JS boundary unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LogLevel {
    /// Maximal verbosity, log everything.
    Debug,
    /// Default verbosity, log interesting stuff only.
    Info,
    /// Log only warnings and errors.
    Warn,
    /// Log only errors.
    Error,
}

impl LogLevel {
    pub const ALL: [LogLevel; 4] = [Self::Debug, Self::Info, Self::Warn, Self::Error];

    pub fn as_i32(self) -> i32 {
        match self {
            Self::Debug => 0,
            Self::Info => 10,
            Self::Warn => 20,
            Self::Error => 30,
        }
    }

    /// Exact match on one of the four level numbers.
    pub fn from_i32(value: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|level| level.as_i32() == value)
    }

    /// Bucket an arbitrary number into the closest level at or above it.
    pub fn bucket(value: i32) -> Self {
        match value {
            v if v <= 0 => Self::Debug,
            v if v <= 10 => Self::Info,
            v if v <= 20 => Self::Warn,
            _ => Self::Error,
        }
    }

    /// Single-letter tag used in formatted log lines.
    pub fn letter(self) -> char {
        match self {
            Self::Debug => 'D',
            Self::Info => 'I',
            Self::Warn => 'W',
            Self::Error => 'E',
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_i32())
    }
}

// ---------------------------------------------------------------------------
// Raw platform intents
// ---------------------------------------------------------------------------

/// One entry of an intent's clip data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipItem {
    pub uri: Option<String>,
    pub text: Option<String>,
    pub html_text: Option<String>,
    /// Textual description of the item, used when it has no other content.
    pub label: Option<String>,
}

impl ClipItem {
    pub fn uri(uri: impl Into<String>) -> Self {
        Self {
            uri: Some(uri.into()),
            ..Self::default()
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }
}

/// The subset of intent extras the plugin reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntentExtras {
    /// `Intent.EXTRA_STREAM`, a content URI.
    pub stream: Option<String>,
    /// Set by the sharing app when it wants us to leave after handling.
    pub exit_on_sent: Option<bool>,
}

/// A platform share/view event as handed over by the bridge.
///
/// `clip_data` is `None` on platforms that cannot report clip data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawIntent {
    pub action: String,
    pub clip_data: Option<Vec<ClipItem>>,
    pub extras: Option<IntentExtras>,
    pub data: Option<String>,
}

impl RawIntent {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            ..Self::default()
        }
    }

    pub fn with_clip_data(mut self, items: Vec<ClipItem>) -> Self {
        self.clip_data = Some(items);
        self
    }

    pub fn with_stream(mut self, uri: impl Into<String>) -> Self {
        self.extras.get_or_insert_with(IntentExtras::default).stream = Some(uri.into());
        self
    }

    pub fn with_exit_on_sent(mut self, exit: bool) -> Self {
        self.extras.get_or_insert_with(IntentExtras::default).exit_on_sent = Some(exit);
        self
    }

    pub fn with_data(mut self, uri: impl Into<String>) -> Self {
        self.data = Some(uri.into());
        self
    }

    pub fn exit_on_sent(&self) -> bool {
        self.extras
            .as_ref()
            .and_then(|extras| extras.exit_on_sent)
            .unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// Normalized share events
// ---------------------------------------------------------------------------

/// Canonical action of a share event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Action {
    Send,
    View,
    /// Any other platform action, passed through untouched.
    Other(String),
}

impl Action {
    /// Map a platform intent action onto its canonical form.
    pub fn from_intent_action(raw: &str) -> Self {
        match raw {
            ACTION_SEND | ACTION_SEND_MULTIPLE => Self::Send,
            ACTION_VIEW => Self::View,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Send => "SEND",
            Self::View => "VIEW",
            Self::Other(raw) => raw,
        }
    }
}

impl From<Action> for String {
    fn from(action: Action) -> Self {
        match action {
            Action::Other(raw) => raw,
            canonical => canonical.as_str().to_string(),
        }
    }
}

impl From<String> for Action {
    fn from(value: String) -> Self {
        match value.as_str() {
            "SEND" => Self::Send,
            "VIEW" => Self::View,
            _ => Self::Other(value),
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One file, link or text snippet carried by a share event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareItem {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(rename = "uri", default, skip_serializing_if = "Option::is_none")]
    pub locator: Option<String>,
    #[serde(rename = "text", default, skip_serializing_if = "Option::is_none")]
    pub inline_text: Option<String>,
    #[serde(rename = "path", default, skip_serializing_if = "Option::is_none")]
    pub resolved_path: Option<String>,
}

impl ShareItem {
    /// Item pointing at content behind a URI. `resolved_path` may be empty.
    pub fn from_uri(
        uri: impl Into<String>,
        mime_type: Option<String>,
        resolved_path: impl Into<String>,
    ) -> Self {
        Self {
            mime_type,
            locator: Some(uri.into()),
            inline_text: None,
            resolved_path: Some(resolved_path.into()),
        }
    }

    /// Item carrying its text inline.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            mime_type: Some(TEXT_PLAIN.to_string()),
            locator: None,
            inline_text: Some(text.into()),
            resolved_path: None,
        }
    }
}

/// A normalized share event, ready to cross the JS boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareEvent {
    action: Action,
    #[serde(rename = "exit")]
    exit_after_send: bool,
    items: Vec<ShareItem>,
}

impl ShareEvent {
    pub fn new(action: Action, exit_after_send: bool, items: Vec<ShareItem>) -> Self {
        Self {
            action,
            exit_after_send,
            items,
        }
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn exit_after_send(&self) -> bool {
        self.exit_after_send
    }

    pub fn items(&self) -> &[ShareItem] {
        &self.items
    }

    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn send_variants_map_to_send() {
        assert_eq!(Action::from_intent_action(ACTION_SEND), Action::Send);
        assert_eq!(Action::from_intent_action(ACTION_SEND_MULTIPLE), Action::Send);
        assert_eq!(Action::from_intent_action(ACTION_VIEW), Action::View);
    }

    #[test]
    fn unknown_action_passes_through() {
        let action = Action::from_intent_action("android.intent.action.EDIT");
        assert_eq!(action.as_str(), "android.intent.action.EDIT");
    }

    #[test]
    fn event_serializes_to_boundary_shape() {
        let event = ShareEvent::new(
            Action::Send,
            true,
            vec![
                ShareItem::from_uri("content://media/1", Some("image/png".into()), ""),
                ShareItem::from_text("hello"),
            ],
        );

        assert_eq!(
            event.to_json().expect("json"),
            json!({
                "action": "SEND",
                "exit": true,
                "items": [
                    { "type": "image/png", "uri": "content://media/1", "path": "" },
                    { "type": "text/plain", "text": "hello" }
                ]
            })
        );
    }

    #[test]
    fn unknown_mime_type_is_omitted() {
        let item = ShareItem::from_uri("content://x", None, "/sdcard/x");
        let value = serde_json::to_value(&item).expect("json");
        assert!(value.get("type").is_none());
        assert_eq!(value["path"], "/sdcard/x");
    }

    #[test]
    fn event_parses_back_from_boundary_json() {
        let event: ShareEvent = serde_json::from_value(json!({
            "action": "com.example.CUSTOM",
            "exit": false,
            "items": [{ "type": "text/plain", "text": "hi" }]
        }))
        .expect("parse");
        assert_eq!(event.action(), &Action::Other("com.example.CUSTOM".into()));
        assert_eq!(event.items()[0].inline_text.as_deref(), Some("hi"));
    }

    #[test]
    fn level_numbers_are_stable() {
        let numbers: Vec<i32> = LogLevel::ALL.iter().map(|l| l.as_i32()).collect();
        assert_eq!(numbers, vec![0, 10, 20, 30]);
        assert_eq!(LogLevel::from_i32(20), Some(LogLevel::Warn));
        assert_eq!(LogLevel::from_i32(15), None);
    }

    #[test]
    fn bucket_rounds_up_to_next_level() {
        assert_eq!(LogLevel::bucket(-5), LogLevel::Debug);
        assert_eq!(LogLevel::bucket(5), LogLevel::Info);
        assert_eq!(LogLevel::bucket(20), LogLevel::Warn);
        assert_eq!(LogLevel::bucket(99), LogLevel::Error);
    }

    #[test]
    fn exit_on_sent_defaults_to_false() {
        assert!(!RawIntent::new(ACTION_SEND).exit_on_sent());
        assert!(RawIntent::new(ACTION_SEND).with_exit_on_sent(true).exit_on_sent());
    }
}
