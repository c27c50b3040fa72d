// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Event normalizer: turns a raw platform intent into a `ShareEvent`.
//
// Items are taken from the first source that yields any: clip data, then the
// stream extra, then the data URI. Items that fail to resolve are skipped
// individually; if nothing converts the intent carries no event.

use openwith_bridge::ContentResolver;
use openwith_core::error::Result;
use openwith_core::types::{Action, ClipItem, IntentExtras, RawIntent, ShareEvent, ShareItem};
use tracing::{debug, warn};

/// Normalize `intent`, or `None` when it carries nothing to share.
pub fn normalize<R>(resolver: &R, intent: &RawIntent) -> Option<ShareEvent>
where
    R: ContentResolver + ?Sized,
{
    let mut items = items_from_clip_data(resolver, intent.clip_data.as_deref());
    if items.is_empty() {
        items = items_from_extras(resolver, intent.extras.as_ref());
    }
    if items.is_empty() {
        items = items_from_data(resolver, intent.data.as_deref());
    }
    if items.is_empty() {
        debug!(action = %intent.action, "intent carries no shareable items");
        return None;
    }

    Some(ShareEvent::new(
        Action::from_intent_action(&intent.action),
        intent.exit_on_sent(),
        items,
    ))
}

fn items_from_clip_data<R>(resolver: &R, clip_data: Option<&[ClipItem]>) -> Vec<ShareItem>
where
    R: ContentResolver + ?Sized,
{
    let Some(clip_data) = clip_data else {
        return Vec::new();
    };
    clip_data
        .iter()
        .enumerate()
        .filter_map(|(index, clip)| {
            if let Some(uri) = clip.uri.as_deref() {
                return skip_on_error(index, uri_item(resolver, uri));
            }
            let text = clip
                .text
                .as_deref()
                .or(clip.html_text.as_deref())
                .or(clip.label.as_deref());
            match text {
                Some(text) => Some(ShareItem::from_text(text)),
                None => {
                    debug!(index, "clip item has no content");
                    None
                }
            }
        })
        .collect()
}

fn items_from_extras<R>(resolver: &R, extras: Option<&IntentExtras>) -> Vec<ShareItem>
where
    R: ContentResolver + ?Sized,
{
    extras
        .and_then(|extras| extras.stream.as_deref())
        .and_then(|uri| skip_on_error(0, uri_item(resolver, uri)))
        .into_iter()
        .collect()
}

fn items_from_data<R>(resolver: &R, data: Option<&str>) -> Vec<ShareItem>
where
    R: ContentResolver + ?Sized,
{
    data.and_then(|uri| skip_on_error(0, uri_item(resolver, uri)))
        .into_iter()
        .collect()
}

/// Resolve a content URI into an item. The path lookup never fails the item.
fn uri_item<R>(resolver: &R, uri: &str) -> Result<ShareItem>
where
    R: ContentResolver + ?Sized,
{
    let mime_type = resolver.mime_type(uri)?;
    let path = match resolver.real_path(uri) {
        Ok(path) => path.unwrap_or_default(),
        Err(e) => {
            debug!(uri, error = %e, "no filesystem path for content");
            String::new()
        }
    };
    Ok(ShareItem::from_uri(uri, mime_type, path))
}

fn skip_on_error(index: usize, item: Result<ShareItem>) -> Option<ShareItem> {
    match item {
        Ok(item) => Some(item),
        Err(e) => {
            warn!(index, error = %e, "skipping share item that failed to convert");
            None
        }
    }
}
