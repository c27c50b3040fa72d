// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Android platform bridge via JNI.
//
// Requires the Android NDK and targets `aarch64-linux-android` or
// `armv7-linux-androideabi`. Each trait method invokes the corresponding
// Android API through JNI calls into the ART runtime.
//
// ## Architecture notes
//
// Intents cross into Rust as `RawIntent` snapshots built by [`raw_intent`].
// The host Activity forwards `onNewIntent` to the plugin after converting the
// intent with that helper; `HostActivity::current_intent` does the same for
// `Activity.getIntent()`.

#![cfg(target_os = "android")]

use std::io::{self, Read};
use std::sync::OnceLock;

use jni::objects::{GlobalRef, JObject, JString, JValue};
use jni::{JNIEnv, JavaVM};

use openwith_core::error::{OpenWithError, Result};
use openwith_core::types::{ClipItem, IntentExtras, RawIntent};

use crate::traits::*;

// ---------------------------------------------------------------------------
// JNI bootstrap helpers
// ---------------------------------------------------------------------------

/// `Intent.EXTRA_STREAM`.
const EXTRA_STREAM: &str = "android.intent.extra.STREAM";

/// Boolean extra a sharing app sets to ask us to leave afterwards.
const EXTRA_EXIT_ON_SENT: &str = "exit_on_sent";

/// `MediaStore.MediaColumns.DATA`.
const COLUMN_DATA: &str = "_data";

/// `Intent.FLAG_GRANT_READ_URI_PERMISSION`.
const FLAG_GRANT_READ_URI_PERMISSION: i32 = 0x0000_0001;

/// Size of the scratch buffer used when pulling bytes out of an InputStream.
const READ_CHUNK: usize = 8192;

/// Process-wide `JavaVM`, wrapped once from the NDK context.
static JAVA_VM: OnceLock<JavaVM> = OnceLock::new();

fn java_vm() -> Result<&'static JavaVM> {
    if let Some(vm) = JAVA_VM.get() {
        return Ok(vm);
    }
    let ctx = ndk_context::android_context();
    // SAFETY: `ctx.vm()` returns the `JavaVM*` set by the NDK glue code.
    // The pointer is valid for the lifetime of the process.
    let vm = unsafe { JavaVM::from_raw(ctx.vm().cast()) }
        .map_err(|e| OpenWithError::Bridge(format!("failed to obtain JavaVM: {e}")))?;
    Ok(JAVA_VM.get_or_init(|| vm))
}

/// Obtain a [`JNIEnv`] handle for the current thread.
///
/// The thread is attached permanently on first use; the env borrows the
/// process-wide [`JavaVM`], hence the `'static` lifetime.
fn jni_env() -> Result<JNIEnv<'static>> {
    java_vm()?
        .attach_current_thread_permanently()
        .map_err(|e| OpenWithError::Bridge(format!("failed to attach JNI thread: {e}")))
}

/// Obtain the current Android `Activity` as a [`JObject`].
fn activity() -> Result<JObject<'static>> {
    let ctx = ndk_context::android_context();
    let ptr = ctx.context();
    if ptr.is_null() {
        return Err(OpenWithError::Bridge(
            "Android context is null, host activity not initialised".into(),
        ));
    }
    // SAFETY: the NDK guarantees this pointer is a valid global jobject for
    // the hosting Activity.
    Ok(unsafe { JObject::from_raw(ptr.cast()) })
}

/// Convenience: map any `jni::errors::Error` into `OpenWithError::Bridge`.
fn jni_err(context: &str, e: jni::errors::Error) -> OpenWithError {
    OpenWithError::Bridge(format!("{context}: {e}"))
}

// ---------------------------------------------------------------------------
// Bridge struct
// ---------------------------------------------------------------------------

/// Android implementation of the OpenWith platform bridge.
///
/// The struct is zero-sized; all state lives on the Java side.
pub struct AndroidBridge;

impl AndroidBridge {
    /// Create a new Android bridge.
    ///
    /// This does **not** touch JNI; the first JNI call happens lazily when
    /// a trait method is invoked.
    pub fn new() -> Self {
        Self
    }
}

impl Default for AndroidBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformBridge for AndroidBridge {
    fn platform_name(&self) -> &str {
        "Android"
    }
}

// ---------------------------------------------------------------------------
// ContentResolver: android.content.ContentResolver
// ---------------------------------------------------------------------------

impl ContentResolver for AndroidBridge {
    fn mime_type(&self, uri: &str) -> Result<Option<String>> {
        let mut env = jni_env()?;
        let activity = activity()?;
        let resolver = content_resolver(&mut env, &activity)?;
        let uri_obj = parse_uri(&mut env, uri)?;

        let j_type: JObject = env
            .call_method(
                &resolver,
                "getType",
                "(Landroid/net/Uri;)Ljava/lang/String;",
                &[JValue::Object(&uri_obj)],
            )
            .map_err(|e| jni_err("ContentResolver.getType", e))?
            .l()
            .map_err(|e| jni_err("getType->l", e))?;

        optional_string(&mut env, j_type)
    }

    /// Query the `_data` column, which media providers fill with the file path.
    fn real_path(&self, uri: &str) -> Result<Option<String>> {
        let mut env = jni_env()?;
        let activity = activity()?;
        let resolver = content_resolver(&mut env, &activity)?;
        let uri_obj = parse_uri(&mut env, uri)?;

        // String[] projection = { "_data" }
        let j_column = env
            .new_string(COLUMN_DATA)
            .map_err(|e| jni_err("new_string(_data)", e))?;
        let projection = env
            .new_object_array(1, "java/lang/String", &j_column)
            .map_err(|e| jni_err("new_object_array(projection)", e))?;

        let null = JObject::null();
        let cursor: JObject = env
            .call_method(
                &resolver,
                "query",
                "(Landroid/net/Uri;[Ljava/lang/String;Ljava/lang/String;[Ljava/lang/String;Ljava/lang/String;)Landroid/database/Cursor;",
                &[
                    JValue::Object(&uri_obj),
                    JValue::Object(&projection),
                    JValue::Object(&null),
                    JValue::Object(&null),
                    JValue::Object(&null),
                ],
            )
            .map_err(|e| jni_err("ContentResolver.query", e))?
            .l()
            .map_err(|e| jni_err("query->l", e))?;

        if cursor.is_null() {
            return Ok(None);
        }

        let column_index = env
            .call_method(
                &cursor,
                "getColumnIndex",
                "(Ljava/lang/String;)I",
                &[JValue::Object(&j_column)],
            )
            .map_err(|e| jni_err("Cursor.getColumnIndex", e))?
            .i()
            .map_err(|e| jni_err("getColumnIndex->i", e))?;

        let path = if column_index < 0 {
            None
        } else {
            let has_row = env
                .call_method(&cursor, "moveToFirst", "()Z", &[])
                .map_err(|e| jni_err("Cursor.moveToFirst", e))?
                .z()
                .map_err(|e| jni_err("moveToFirst->z", e))?;
            if has_row {
                let j_path: JObject = env
                    .call_method(
                        &cursor,
                        "getString",
                        "(I)Ljava/lang/String;",
                        &[JValue::Int(column_index)],
                    )
                    .map_err(|e| jni_err("Cursor.getString", e))?
                    .l()
                    .map_err(|e| jni_err("getString->l", e))?;
                optional_string(&mut env, j_path)?
            } else {
                None
            }
        };

        env.call_method(&cursor, "close", "()V", &[])
            .map_err(|e| jni_err("Cursor.close", e))?;

        Ok(path)
    }

    fn open_input_stream(&self, uri: &str) -> Result<Box<dyn Read + Send>> {
        let mut env = jni_env()?;
        let activity = activity()?;
        let resolver = content_resolver(&mut env, &activity)?;
        let uri_obj = parse_uri(&mut env, uri)?;

        tracing::debug!(uri, "Android: opening content stream");

        let input_stream: JObject = env
            .call_method(
                &resolver,
                "openInputStream",
                "(Landroid/net/Uri;)Ljava/io/InputStream;",
                &[JValue::Object(&uri_obj)],
            )
            .map_err(|e| jni_err("openInputStream", e))?
            .l()
            .map_err(|e| jni_err("openInputStream->l", e))?;

        if input_stream.is_null() {
            return Err(OpenWithError::ContentUnavailable(format!(
                "ContentResolver returned null InputStream for URI: {uri}"
            )));
        }

        let stream = env
            .new_global_ref(input_stream)
            .map_err(|e| jni_err("new_global_ref(InputStream)", e))?;
        Ok(Box::new(JavaInputStream { stream }))
    }
}

/// `java.io.InputStream` exposed as [`std::io::Read`].
///
/// Holds a global reference so it can move to a worker thread; each read
/// attaches that thread to the VM.
struct JavaInputStream {
    stream: GlobalRef,
}

impl Read for JavaInputStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let mut env = jni_env().map_err(io::Error::other)?;
        let len = buf.len().min(READ_CHUNK);
        let chunk = env
            .new_byte_array(len as i32)
            .map_err(|e| io::Error::other(jni_err("new_byte_array", e)))?;

        let read = env
            .call_method(
                self.stream.as_obj(),
                "read",
                "([BII)I",
                &[JValue::Object(&chunk), JValue::Int(0), JValue::Int(len as i32)],
            )
            .and_then(|v| v.i())
            .map_err(|e| io::Error::other(jni_err("InputStream.read", e)))?;

        if read < 0 {
            return Ok(0);
        }
        let read = read as usize;

        let mut signed = vec![0i8; read];
        env.get_byte_array_region(&chunk, 0, &mut signed)
            .map_err(|e| io::Error::other(jni_err("get_byte_array_region", e)))?;
        for (dst, src) in buf.iter_mut().zip(signed) {
            *dst = src as u8;
        }
        Ok(read)
    }
}

impl Drop for JavaInputStream {
    fn drop(&mut self) {
        if let Ok(mut env) = jni_env() {
            if let Err(e) = env.call_method(self.stream.as_obj(), "close", "()V", &[]) {
                tracing::warn!(error = %e, "Android: failed to close InputStream");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// HostActivity: android.app.Activity
// ---------------------------------------------------------------------------

impl HostActivity for AndroidBridge {
    fn current_intent(&self) -> Result<Option<RawIntent>> {
        let mut env = jni_env()?;
        let activity = activity()?;

        let intent: JObject = env
            .call_method(&activity, "getIntent", "()Landroid/content/Intent;", &[])
            .map_err(|e| jni_err("getIntent", e))?
            .l()
            .map_err(|e| jni_err("getIntent->l", e))?;

        if intent.is_null() {
            return Ok(None);
        }
        raw_intent(&mut env, &intent).map(Some)
    }

    fn is_task_root(&self) -> bool {
        let check = || -> Result<bool> {
            let mut env = jni_env()?;
            let activity = activity()?;
            env.call_method(&activity, "isTaskRoot", "()Z", &[])
                .map_err(|e| jni_err("isTaskRoot", e))?
                .z()
                .map_err(|e| jni_err("isTaskRoot->z", e))
        };
        match check() {
            Ok(is_root) => is_root,
            Err(e) => {
                // Assume root so the intent is handled here rather than lost.
                tracing::warn!(error = %e, "Android: isTaskRoot failed");
                true
            }
        }
    }

    /// Rebuild the intent against the host activity class, start it, and
    /// finish the current instance so the app behaves as `singleTask`.
    fn relaunch(&self, intent: &RawIntent) -> Result<()> {
        let mut env = jni_env()?;
        let activity = activity()?;

        let class: JObject = env
            .call_method(&activity, "getClass", "()Ljava/lang/Class;", &[])
            .map_err(|e| jni_err("getClass", e))?
            .l()
            .map_err(|e| jni_err("getClass->l", e))?;

        // new Intent(activity, activity.getClass())
        let j_intent: JObject = env
            .new_object(
                "android/content/Intent",
                "(Landroid/content/Context;Ljava/lang/Class;)V",
                &[JValue::Object(&activity), JValue::Object(&class)],
            )
            .map_err(|e| jni_err("new Intent", e))?;

        populate_intent(&mut env, &j_intent, intent)?;

        env.call_method(
            &activity,
            "startActivity",
            "(Landroid/content/Intent;)V",
            &[JValue::Object(&j_intent)],
        )
        .map_err(|e| jni_err("startActivity", e))?;

        env.call_method(&activity, "finish", "()V", &[])
            .map_err(|e| jni_err("finish", e))?;

        tracing::info!(action = %intent.action, "Android: intent relaunched on task root");
        Ok(())
    }

    fn move_task_to_back(&self) -> Result<()> {
        let mut env = jni_env()?;
        let activity = activity()?;
        env.call_method(&activity, "moveTaskToBack", "(Z)Z", &[JValue::Bool(1)])
            .map_err(|e| jni_err("moveTaskToBack", e))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Intent conversion
// ---------------------------------------------------------------------------

/// Snapshot an `android.content.Intent` into a [`RawIntent`].
///
/// Clip data is read when present; each clip item records its URI, text,
/// HTML text and `toString()` description so the normalizer can pick.
pub fn raw_intent(env: &mut JNIEnv<'_>, intent: &JObject<'_>) -> Result<RawIntent> {
    let j_action: JObject = env
        .call_method(intent, "getAction", "()Ljava/lang/String;", &[])
        .map_err(|e| jni_err("Intent.getAction", e))?
        .l()
        .map_err(|e| jni_err("getAction->l", e))?;
    let action = optional_string(env, j_action)?.unwrap_or_default();

    let clip_data = read_clip_data(env, intent)?;
    let extras = read_extras(env, intent)?;

    let j_data: JObject = env
        .call_method(intent, "getData", "()Landroid/net/Uri;", &[])
        .map_err(|e| jni_err("Intent.getData", e))?
        .l()
        .map_err(|e| jni_err("getData->l", e))?;
    let data = object_to_string(env, j_data)?;

    Ok(RawIntent {
        action,
        clip_data,
        extras,
        data,
    })
}

fn read_clip_data(env: &mut JNIEnv<'_>, intent: &JObject<'_>) -> Result<Option<Vec<ClipItem>>> {
    let clip: JObject = env
        .call_method(intent, "getClipData", "()Landroid/content/ClipData;", &[])
        .map_err(|e| jni_err("Intent.getClipData", e))?
        .l()
        .map_err(|e| jni_err("getClipData->l", e))?;
    if clip.is_null() {
        return Ok(None);
    }

    let count = env
        .call_method(&clip, "getItemCount", "()I", &[])
        .map_err(|e| jni_err("ClipData.getItemCount", e))?
        .i()
        .map_err(|e| jni_err("getItemCount->i", e))?;

    let mut items = Vec::with_capacity(count.max(0) as usize);
    for index in 0..count {
        let j_item: JObject = env
            .call_method(
                &clip,
                "getItemAt",
                "(I)Landroid/content/ClipData$Item;",
                &[JValue::Int(index)],
            )
            .map_err(|e| jni_err("ClipData.getItemAt", e))?
            .l()
            .map_err(|e| jni_err("getItemAt->l", e))?;

        let j_uri = call_object(env, &j_item, "getUri", "()Landroid/net/Uri;")?;
        let j_text = call_object(env, &j_item, "getText", "()Ljava/lang/CharSequence;")?;
        let j_html = call_object(env, &j_item, "getHtmlText", "()Ljava/lang/String;")?;

        let uri = object_to_string(env, j_uri)?;
        let text = object_to_string(env, j_text)?;
        let html_text = optional_string(env, j_html)?;
        let label = object_to_string(env, j_item)?;

        items.push(ClipItem {
            uri,
            text,
            html_text,
            label,
        });
    }
    Ok(Some(items))
}

fn read_extras(env: &mut JNIEnv<'_>, intent: &JObject<'_>) -> Result<Option<IntentExtras>> {
    let bundle = call_object(env, intent, "getExtras", "()Landroid/os/Bundle;")?;
    if bundle.is_null() {
        return Ok(None);
    }

    let j_key = env
        .new_string(EXTRA_STREAM)
        .map_err(|e| jni_err("new_string(EXTRA_STREAM)", e))?;
    let j_stream: JObject = env
        .call_method(
            &bundle,
            "get",
            "(Ljava/lang/String;)Ljava/lang/Object;",
            &[JValue::Object(&j_key)],
        )
        .map_err(|e| jni_err("Bundle.get(EXTRA_STREAM)", e))?
        .l()
        .map_err(|e| jni_err("Bundle.get->l", e))?;
    let stream = object_to_string(env, j_stream)?;

    let j_exit_key = env
        .new_string(EXTRA_EXIT_ON_SENT)
        .map_err(|e| jni_err("new_string(exit_on_sent)", e))?;
    let exit_on_sent = env
        .call_method(
            &bundle,
            "getBoolean",
            "(Ljava/lang/String;Z)Z",
            &[JValue::Object(&j_exit_key), JValue::Bool(0)],
        )
        .map_err(|e| jni_err("Bundle.getBoolean", e))?
        .z()
        .map_err(|e| jni_err("getBoolean->z", e))?;

    Ok(Some(IntentExtras {
        stream,
        exit_on_sent: Some(exit_on_sent),
    }))
}

/// Copy action, data, stream and exit flag from `raw` onto a Java intent.
fn populate_intent(env: &mut JNIEnv<'_>, j_intent: &JObject<'_>, raw: &RawIntent) -> Result<()> {
    let j_action = env
        .new_string(&raw.action)
        .map_err(|e| jni_err("new_string(action)", e))?;
    env.call_method(
        j_intent,
        "setAction",
        "(Ljava/lang/String;)Landroid/content/Intent;",
        &[JValue::Object(&j_action)],
    )
    .map_err(|e| jni_err("Intent.setAction", e))?;

    if let Some(data) = &raw.data {
        let uri = parse_uri(env, data)?;
        env.call_method(
            j_intent,
            "setData",
            "(Landroid/net/Uri;)Landroid/content/Intent;",
            &[JValue::Object(&uri)],
        )
        .map_err(|e| jni_err("Intent.setData", e))?;
    }

    if let Some(stream) = raw.extras.as_ref().and_then(|x| x.stream.as_deref()) {
        let uri = parse_uri(env, stream)?;
        let j_key = env
            .new_string(EXTRA_STREAM)
            .map_err(|e| jni_err("new_string(EXTRA_STREAM)", e))?;
        env.call_method(
            j_intent,
            "putExtra",
            "(Ljava/lang/String;Landroid/os/Parcelable;)Landroid/content/Intent;",
            &[JValue::Object(&j_key), JValue::Object(&uri)],
        )
        .map_err(|e| jni_err("Intent.putExtra(EXTRA_STREAM)", e))?;
    }

    let j_exit_key = env
        .new_string(EXTRA_EXIT_ON_SENT)
        .map_err(|e| jni_err("new_string(exit_on_sent)", e))?;
    env.call_method(
        j_intent,
        "putExtra",
        "(Ljava/lang/String;Z)Landroid/content/Intent;",
        &[
            JValue::Object(&j_exit_key),
            JValue::Bool(raw.exit_on_sent() as u8),
        ],
    )
    .map_err(|e| jni_err("Intent.putExtra(exit_on_sent)", e))?;

    env.call_method(
        j_intent,
        "addFlags",
        "(I)Landroid/content/Intent;",
        &[JValue::Int(FLAG_GRANT_READ_URI_PERMISSION)],
    )
    .map_err(|e| jni_err("Intent.addFlags", e))?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn content_resolver<'a>(env: &mut JNIEnv<'a>, activity: &JObject<'_>) -> Result<JObject<'a>> {
    env.call_method(
        activity,
        "getContentResolver",
        "()Landroid/content/ContentResolver;",
        &[],
    )
    .map_err(|e| jni_err("getContentResolver", e))?
    .l()
    .map_err(|e| jni_err("getContentResolver->l", e))
}

fn parse_uri<'a>(env: &mut JNIEnv<'a>, uri: &str) -> Result<JObject<'a>> {
    let j_uri_str: JString = env
        .new_string(uri)
        .map_err(|e| jni_err("new_string(uri)", e))?;
    env.call_static_method(
        "android/net/Uri",
        "parse",
        "(Ljava/lang/String;)Landroid/net/Uri;",
        &[JValue::Object(&j_uri_str)],
    )
    .map_err(|e| jni_err("Uri.parse", e))?
    .l()
    .map_err(|e| jni_err("Uri.parse->l", e))
}

fn call_object<'a>(
    env: &mut JNIEnv<'a>,
    target: &JObject<'_>,
    name: &str,
    sig: &str,
) -> Result<JObject<'a>> {
    env.call_method(target, name, sig, &[])
        .map_err(|e| jni_err(name, e))?
        .l()
        .map_err(|e| jni_err(name, e))
}

/// Read a `java.lang.String` reference, `None` when null.
fn optional_string(env: &mut JNIEnv<'_>, obj: JObject<'_>) -> Result<Option<String>> {
    if obj.is_null() {
        return Ok(None);
    }
    let j_str = JString::from(obj);
    let value: String = env
        .get_string(&j_str)
        .map_err(|e| jni_err("get_string", e))?
        .into();
    Ok(Some(value))
}

/// `obj.toString()`, `None` when `obj` is null.
fn object_to_string(env: &mut JNIEnv<'_>, obj: JObject<'_>) -> Result<Option<String>> {
    if obj.is_null() {
        return Ok(None);
    }
    let j_str: JObject = env
        .call_method(&obj, "toString", "()Ljava/lang/String;", &[])
        .map_err(|e| jni_err("toString", e))?
        .l()
        .map_err(|e| jni_err("toString->l", e))?;
    optional_string(env, j_str)
}
