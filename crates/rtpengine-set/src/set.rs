// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! RTPEngine set: the tracked endpoint list of one Kubernetes service.
//!
//! The set registers itself with an [`EventSource`] and reduces matching EndpointSlice
//! events into a flat endpoint list. Every material change arms a single-slot signal;
//! a consumer loops on [`EndpointSet::watch`] and re-reads [`EndpointSet::endpoints`]
//! after each wake. Several changes before the consumer wakes collapse into one wake.

use crate::change::ChangePolicy;
use crate::endpoint::Endpoint;
use crate::error::{ConfigError, WatchError};
use crate::informer::{EventSource, ResourceEventHandler};
use crate::slice::{flatten, EndpointSlice, PortRef};
use parking_lot::Mutex;
use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, info, warn, Span};

/// Builder for an [`EndpointSet`].
///
/// Every identity field, the event source and the diagnostic span are required;
/// [`start`](Self::start) reports the first one missing.
#[derive(Default)]
pub struct EndpointSetBuilder {
    id: u32,
    service_name: Option<String>,
    service_namespace: Option<String>,
    service_port: Option<String>,
    informer: Option<Arc<dyn EventSource>>,
    logger: Option<Span>,
    policy: ChangePolicy,
}

impl EndpointSetBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the RTPEngine set number.
    pub fn id(mut self, id: u32) -> Self {
        self.id = id;
        self
    }

    /// Set the service name (matched against EndpointSlice `metadata.name`).
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Set the service namespace.
    pub fn service_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.service_namespace = Some(namespace.into());
        self
    }

    /// Set the port reference: a port number or a declared port name.
    pub fn service_port(mut self, port: impl Into<String>) -> Self {
        self.service_port = Some(port.into());
        self
    }

    /// Set the membership event source.
    pub fn informer(mut self, informer: Arc<dyn EventSource>) -> Self {
        self.informer = Some(informer);
        self
    }

    /// Set the span all diagnostics of this set are emitted under.
    pub fn logger(mut self, span: Span) -> Self {
        self.logger = Some(span);
        self
    }

    /// Set the change detection policy.
    pub fn change_policy(mut self, policy: ChangePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Validate the configuration and register the set with its event source.
    pub fn start(self) -> Result<Arc<EndpointSet>, ConfigError> {
        let service_name = required(self.service_name, "service_name")?;
        let service_namespace = required(self.service_namespace, "service_namespace")?;
        let service_port = PortRef::parse(&required(self.service_port, "service_port")?)?;
        let informer = self.informer.ok_or(ConfigError::MissingField("informer"))?;
        let span = self.logger.ok_or(ConfigError::MissingField("logger"))?;

        let set = Arc::new(EndpointSet {
            id: self.id,
            service_name,
            service_namespace,
            service_port,
            policy: self.policy,
            span,
            endpoints: Mutex::new(Vec::new()),
            changed: Notify::new(),
        });

        debug!(
            parent: &set.span,
            "Watching EndpointSlice {}/{} port {}",
            set.service_namespace,
            set.service_name,
            set.service_port
        );

        informer.add_event_handler(set.clone());

        Ok(set)
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ConfigError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingField(field))
}

/// Live endpoint list of one RTPEngine set.
#[derive(Debug)]
pub struct EndpointSet {
    id: u32,
    service_name: String,
    service_namespace: String,
    service_port: PortRef,
    policy: ChangePolicy,
    span: Span,

    /// Last successfully flattened endpoints; empty when none are known
    endpoints: Mutex<Vec<Endpoint>>,

    /// Holds at most one pending wake
    changed: Notify,
}

impl EndpointSet {
    /// Start building a set.
    pub fn builder() -> EndpointSetBuilder {
        EndpointSetBuilder::new()
    }

    /// RTPEngine set number.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Watched service name.
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Watched service namespace.
    pub fn service_namespace(&self) -> &str {
        &self.service_namespace
    }

    /// Configured port reference.
    pub fn service_port(&self) -> &PortRef {
        &self.service_port
    }

    /// Snapshot of the current endpoints.
    pub fn endpoints(&self) -> Vec<Endpoint> {
        self.endpoints.lock().clone()
    }

    /// Run `f` on the current endpoints without copying them.
    ///
    /// The set's lock is held while `f` runs; keep it short.
    pub fn with_endpoints<R>(&self, f: impl FnOnce(&[Endpoint]) -> R) -> R {
        let endpoints = self.endpoints.lock();
        f(endpoints.as_slice())
    }

    /// Check if no endpoints are known.
    pub fn is_empty(&self) -> bool {
        self.endpoints.lock().is_empty()
    }

    /// Wait until the endpoints change or `cancel` completes.
    ///
    /// `Ok(())` means the endpoints may have changed and should be re-read. Each call
    /// consumes at most one pending change; call it in a loop.
    pub async fn watch<F>(&self, cancel: F) -> Result<(), WatchError>
    where
        F: Future<Output = ()>,
    {
        // Cancellation is polled first so a pending change survives a cancelled watch.
        tokio::select! {
            biased;
            _ = cancel => Err(WatchError::Cancelled),
            _ = self.changed.notified() => Ok(()),
        }
    }

    /// Wait until the endpoints change or `timeout` elapses.
    pub async fn watch_timeout(&self, timeout: Duration) -> Result<(), WatchError> {
        tokio::time::timeout(timeout, self.changed.notified())
            .await
            .map_err(|_| WatchError::DeadlineExceeded)
    }

    /// Apply an EndpointSlice snapshot, or its removal when `slice` is `None`.
    ///
    /// A slice whose port cannot be resolved is logged and leaves the endpoints as
    /// they were.
    pub fn update(&self, slice: Option<&EndpointSlice>) {
        let Some(slice) = slice else {
            let mut endpoints = self.endpoints.lock();
            if !endpoints.is_empty() {
                endpoints.clear();
                self.changed.notify_one();
                info!(parent: &self.span, "EndpointSlice removed, set {} has no endpoints", self.id);
            }
            return;
        };

        let current = match flatten(&self.service_port, slice) {
            Ok(current) => current,
            Err(e) => {
                warn!(parent: &self.span, "Ignoring EndpointSlice update: {}", e);
                return;
            }
        };

        let mut endpoints = self.endpoints.lock();
        if !self.policy.is_changed(&endpoints, &current) {
            debug!(parent: &self.span, "EndpointSlice update without endpoint changes");
            return;
        }

        info!(
            parent: &self.span,
            "Set {} endpoints changed: {} -> {}",
            self.id,
            endpoints.len(),
            current.len()
        );
        for ep in &current {
            debug!(parent: &self.span, "  - {}", ep);
        }

        *endpoints = current;
        self.changed.notify_one();
    }

    /// Downcast `obj` and keep it only if it is this set's EndpointSlice.
    fn matching<'a>(&self, obj: &'a (dyn Any + Send + Sync)) -> Option<&'a EndpointSlice> {
        obj.downcast_ref::<EndpointSlice>()
            .filter(|slice| slice.matches(&self.service_namespace, &self.service_name))
    }
}

impl ResourceEventHandler for EndpointSet {
    fn on_add(&self, obj: &(dyn Any + Send + Sync)) {
        if let Some(slice) = self.matching(obj) {
            self.update(Some(slice));
        }
    }

    fn on_update(&self, _old: &(dyn Any + Send + Sync), new: &(dyn Any + Send + Sync)) {
        if let Some(slice) = self.matching(new) {
            self.update(Some(slice));
        }
    }

    fn on_delete(&self, obj: &(dyn Any + Send + Sync)) {
        if self.matching(obj).is_some() {
            self.update(None);
        }
    }
}
