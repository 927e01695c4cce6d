// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Membership event source.
//!
//! An [`EventSource`] watches a collection of cluster resources and delivers
//! add/update/delete callbacks to every registered [`ResourceEventHandler`].
//! Payloads are opaque (`dyn Any`): handlers downcast to the resource kind they care
//! about and ignore the rest.
//!
//! [`LocalInformer`] is an in-process source: it caches the latest object per key,
//! dispatches changes synchronously on the caller's thread, and replays its cache to
//! handlers registered after objects were added. Cache writes and their dispatch are
//! serialized, so handlers see events in cache order. Handlers must not call back
//! into the same informer.

use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Opaque resource payload.
pub type Object = Arc<dyn Any + Send + Sync>;

/// Callback target for membership events.
pub trait ResourceEventHandler: Send + Sync {
    /// A resource appeared.
    fn on_add(&self, obj: &(dyn Any + Send + Sync));

    /// A resource changed.
    fn on_update(&self, old: &(dyn Any + Send + Sync), new: &(dyn Any + Send + Sync));

    /// A resource was removed. `obj` is its last known state.
    fn on_delete(&self, obj: &(dyn Any + Send + Sync));
}

/// Source of membership events.
pub trait EventSource: Send + Sync {
    /// Register a handler for all future events.
    fn add_event_handler(&self, handler: Arc<dyn ResourceEventHandler>);
}

/// Cache key of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    /// Create a new key.
    pub fn new(
        kind: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.kind, self.namespace, self.name)
    }
}

/// In-process event source backed by an object cache.
#[derive(Default)]
pub struct LocalInformer {
    handlers: RwLock<Vec<Arc<dyn ResourceEventHandler>>>,
    store: RwLock<HashMap<ObjectKey, Object>>,

    /// Held across a cache write and its dispatch
    dispatch: Mutex<()>,
}

impl LocalInformer {
    /// Create an empty informer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached objects.
    pub fn len(&self) -> usize {
        self.store.read().len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.store.read().is_empty()
    }

    /// Number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.read().len()
    }

    /// Get the cached object for `key`.
    pub fn get(&self, key: &ObjectKey) -> Option<Object> {
        self.store.read().get(key).cloned()
    }

    fn snapshot_handlers(&self) -> Vec<Arc<dyn ResourceEventHandler>> {
        self.handlers.read().clone()
    }

    /// Store `obj` and dispatch add (new key) or update (known key).
    pub fn apply(&self, key: ObjectKey, obj: Object) {
        let _dispatch = self.dispatch.lock();
        let old = self.store.write().insert(key, obj.clone());

        // Dispatch outside the store lock so readers are not blocked by handlers.
        let handlers = self.snapshot_handlers();
        match old {
            Some(old) => {
                for h in &handlers {
                    h.on_update(old.as_ref(), obj.as_ref());
                }
            }
            None => {
                for h in &handlers {
                    h.on_add(obj.as_ref());
                }
            }
        }
    }

    /// Remove `key` and dispatch delete with the last known state.
    ///
    /// Returns `false` if the key was not cached (nothing dispatched).
    pub fn delete(&self, key: &ObjectKey) -> bool {
        let _dispatch = self.dispatch.lock();
        let Some(old) = self.store.write().remove(key) else {
            return false;
        };

        for h in &self.snapshot_handlers() {
            h.on_delete(old.as_ref());
        }
        true
    }
}

impl EventSource for LocalInformer {
    fn add_event_handler(&self, handler: Arc<dyn ResourceEventHandler>) {
        let _dispatch = self.dispatch.lock();
        let existing: Vec<Object> = {
            let mut handlers = self.handlers.write();
            handlers.push(handler.clone());
            self.store.read().values().cloned().collect()
        };

        for obj in &existing {
            handler.on_add(obj.as_ref());
        }
    }
}

impl fmt::Debug for LocalInformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalInformer")
            .field("objects", &self.len())
            .field("handlers", &self.handler_count())
            .finish()
    }
}
