// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub bridge for desktop/CI builds where no Android runtime is available.
//
// Content URIs are treated as `file://` URIs or plain paths on the local
// filesystem. The "activity" is simulated: the launch intent is whatever the
// caller stored with `set_current_intent`, and backgrounding only flips a flag.

use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use openwith_core::error::{OpenWithError, Result};
use openwith_core::types::RawIntent;
use url::Url;

use crate::traits::*;

/// Filesystem-backed bridge returned on non-Android platforms.
pub struct StubBridge {
    current_intent: Mutex<Option<RawIntent>>,
    task_root: AtomicBool,
    in_background: AtomicBool,
}

impl StubBridge {
    pub fn new() -> Self {
        Self {
            current_intent: Mutex::new(None),
            task_root: AtomicBool::new(true),
            in_background: AtomicBool::new(false),
        }
    }

    /// Pretend the activity was launched with `intent`.
    pub fn set_current_intent(&self, intent: Option<RawIntent>) {
        *self.current_intent.lock().expect("intent lock poisoned") = intent;
    }

    /// Pretend the activity is (or is not) the root of its task.
    pub fn set_task_root(&self, is_root: bool) {
        self.task_root.store(is_root, Ordering::SeqCst);
    }

    /// Whether `move_task_to_back` has been called.
    pub fn is_in_background(&self) -> bool {
        self.in_background.load(Ordering::SeqCst)
    }
}

impl Default for StubBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformBridge for StubBridge {
    fn platform_name(&self) -> &str {
        "Desktop (stub)"
    }
}

impl ContentResolver for StubBridge {
    fn mime_type(&self, uri: &str) -> Result<Option<String>> {
        let path = local_path(uri)?;
        Ok(path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(mime_from_extension)
            .map(str::to_string))
    }

    fn real_path(&self, uri: &str) -> Result<Option<String>> {
        let path = local_path(uri)?;
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(path.to_string_lossy().into_owned()))
    }

    fn open_input_stream(&self, uri: &str) -> Result<Box<dyn Read + Send>> {
        let path = local_path(uri)?;
        tracing::debug!(path = %path.display(), "stub: opening content");
        let file = File::open(&path)?;
        Ok(Box::new(file))
    }
}

impl HostActivity for StubBridge {
    fn current_intent(&self) -> Result<Option<RawIntent>> {
        Ok(self.current_intent.lock().expect("intent lock poisoned").clone())
    }

    fn is_task_root(&self) -> bool {
        self.task_root.load(Ordering::SeqCst)
    }

    fn relaunch(&self, intent: &RawIntent) -> Result<()> {
        tracing::warn!(action = %intent.action, "HostActivity::relaunch called on stub bridge");
        Err(OpenWithError::PlatformUnavailable)
    }

    fn move_task_to_back(&self) -> Result<()> {
        tracing::info!("stub: task moved to background");
        self.in_background.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Map a `file://` URI or bare path onto a filesystem path.
///
/// URIs are percent-decoded and must name a local file (`file:///path` or
/// `file://localhost/path`).
fn local_path(uri: &str) -> Result<PathBuf> {
    if !uri.contains("://") {
        return Ok(PathBuf::from(uri));
    }
    let unavailable =
        || OpenWithError::ContentUnavailable(format!("stub bridge only resolves local file URIs, got {uri}"));
    let url = Url::parse(uri).map_err(|_| unavailable())?;
    if url.scheme() != "file" {
        return Err(unavailable());
    }
    url.to_file_path().map_err(|()| unavailable())
}

/// Infer a MIME type from a file extension.
pub fn mime_from_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "pdf" => Some("application/pdf"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "tif" | "tiff" => Some("image/tiff"),
        "txt" => Some("text/plain"),
        "html" | "htm" => Some("text/html"),
        "json" => Some("application/json"),
        "mp3" => Some("audio/mpeg"),
        "mp4" => Some("video/mp4"),
        "zip" => Some("application/zip"),
        _ => None,
    }
}
