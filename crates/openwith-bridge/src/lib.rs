// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! OpenWith: native platform bridge abstractions.
//!
//! This crate defines the traits through which the plugin reaches the host
//! operating system: resolving shared content URIs and driving the host
//! activity. Android talks to ART over JNI; every other target gets a stub
//! backed by the local filesystem so the plugin runs on desktop and in CI.

pub mod traits;

#[cfg(target_os = "android")]
pub mod android;

pub mod stub;

pub use traits::{ContentResolver, HostActivity, PlatformBridge};
