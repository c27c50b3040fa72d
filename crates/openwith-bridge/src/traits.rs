// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for native capabilities.

use std::io::Read;

use openwith_core::error::Result;
use openwith_core::types::RawIntent;

/// Unified bridge that groups all native capabilities the plugin needs.
pub trait PlatformBridge: ContentResolver + HostActivity {
    /// Human-readable platform name (e.g. "Android", "Desktop (stub)").
    fn platform_name(&self) -> &str;
}

/// Resolve shared content URIs (Android's `ContentResolver`).
pub trait ContentResolver: Send + Sync {
    /// MIME type of the content behind `uri`, if the provider reports one.
    fn mime_type(&self, uri: &str) -> Result<Option<String>>;

    /// Filesystem path backing `uri`, if the provider exposes one.
    ///
    /// Best-effort: most providers return `None`.
    fn real_path(&self, uri: &str) -> Result<Option<String>>;

    /// Open a byte stream over the content behind `uri`.
    fn open_input_stream(&self, uri: &str) -> Result<Box<dyn Read + Send>>;
}

/// The activity hosting the JavaScript application.
pub trait HostActivity: Send + Sync {
    /// The intent the activity was launched with, if any.
    fn current_intent(&self) -> Result<Option<RawIntent>>;

    /// Whether the activity is the root of its task.
    fn is_task_root(&self) -> bool;

    /// Start a fresh activity for `intent` and finish the current one.
    fn relaunch(&self, intent: &RawIntent) -> Result<()>;

    /// Send the whole task to the background.
    fn move_task_to_back(&self) -> Result<()>;
}
