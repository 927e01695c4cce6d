// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Kubernetes watch-event stream.
//!
//! Decodes the newline-delimited JSON produced by `kubectl get --watch -o json` style
//! watches (`{"type": "ADDED", "object": {...}}`) and applies each event to a
//! [`LocalInformer`]. EndpointSlice objects are decoded into [`EndpointSlice`]; other
//! kinds are passed through as raw JSON.

use crate::error::StreamError;
use crate::informer::{LocalInformer, Object, ObjectKey};
use crate::slice::EndpointSlice;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

const ENDPOINT_SLICE_KIND: &str = "EndpointSlice";

/// Watch event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventType {
    Added,
    Modified,
    Deleted,
    Bookmark,
    Error,
}

#[derive(Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    event_type: EventType,
    #[serde(default)]
    object: Value,
}

/// A decoded watch event.
pub struct WatchEvent {
    pub event_type: EventType,
    pub key: ObjectKey,
    pub object: Object,
}

impl std::fmt::Debug for WatchEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchEvent")
            .field("event_type", &self.event_type)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

/// Decode one line.
///
/// Blank lines, bookmarks and error events carry no object and yield `None`.
pub fn decode(line: &str) -> Result<Option<WatchEvent>, StreamError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let raw: RawEvent = serde_json::from_str(line)?;
    if matches!(raw.event_type, EventType::Bookmark | EventType::Error) {
        debug!("Skipping {:?} watch event", raw.event_type);
        return Ok(None);
    }

    let kind = raw
        .object
        .get("kind")
        .and_then(Value::as_str)
        .unwrap_or(ENDPOINT_SLICE_KIND)
        .to_string();
    let metadata = raw.object.get("metadata");
    let name = metadata
        .and_then(|m| m.get("name"))
        .and_then(Value::as_str)
        .filter(|n| !n.is_empty())
        .ok_or(StreamError::MissingMetadata)?
        .to_string();
    let namespace = metadata
        .and_then(|m| m.get("namespace"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let object: Object = if kind == ENDPOINT_SLICE_KIND {
        Arc::new(serde_json::from_value::<EndpointSlice>(raw.object)?)
    } else {
        Arc::new(raw.object)
    };

    Ok(Some(WatchEvent {
        event_type: raw.event_type,
        key: ObjectKey::new(kind, namespace, name),
        object,
    }))
}

/// Apply a decoded event to `informer`.
pub fn apply(informer: &LocalInformer, event: WatchEvent) {
    match event.event_type {
        EventType::Added | EventType::Modified => informer.apply(event.key, event.object),
        EventType::Deleted => {
            if !informer.delete(&event.key) {
                debug!("Delete for unknown object {}", event.key);
            }
        }
        EventType::Bookmark | EventType::Error => {}
    }
}

/// Decode and apply one line. Returns the applied event type, if any.
pub fn apply_line(informer: &LocalInformer, line: &str) -> Result<Option<EventType>, StreamError> {
    let Some(event) = decode(line)? else {
        return Ok(None);
    };
    let event_type = event.event_type;
    apply(informer, event);
    Ok(Some(event_type))
}

/// Feed `reader` into `informer` until EOF.
///
/// Malformed lines are logged and skipped. Returns the number of applied events.
pub async fn run<R>(reader: R, informer: &LocalInformer) -> Result<usize, StreamError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut applied = 0;

    while let Some(line) = lines.next_line().await? {
        match apply_line(informer, &line) {
            Ok(Some(_)) => applied += 1,
            Ok(None) => {}
            Err(e) => warn!("Skipping malformed watch event: {}", e),
        }
    }

    debug!("Watch stream ended after {} events", applied);
    Ok(applied)
}
