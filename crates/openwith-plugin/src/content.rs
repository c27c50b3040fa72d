// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content loading for the `load` command.

use std::io::Read;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use openwith_bridge::ContentResolver;
use openwith_core::error::Result;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// File descriptor object passed by the JavaScript side.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoadRequest {
    pub uri: String,
}

impl LoadRequest {
    pub fn from_value(value: &Value) -> Result<Self> {
        Ok(Self::deserialize(value)?)
    }
}

/// Read every byte behind `uri`.
pub fn read_all<R>(resolver: &R, uri: &str) -> Result<Vec<u8>>
where
    R: ContentResolver + ?Sized,
{
    let mut stream = resolver.open_input_stream(uri)?;
    let mut bytes = Vec::new();
    stream.read_to_end(&mut bytes)?;
    Ok(bytes)
}

/// Content behind `uri` as unwrapped, padded base64.
///
/// Any failure to open or read yields an empty string.
pub fn load_base64<R>(resolver: &R, uri: &str) -> String
where
    R: ContentResolver + ?Sized,
{
    match read_all(resolver, uri) {
        Ok(bytes) => STANDARD.encode(bytes),
        Err(e) => {
            debug!(uri, error = %e, "content could not be read");
            String::new()
        }
    }
}
