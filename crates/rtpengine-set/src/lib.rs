// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! RTPEngine set discovery
//!
//! Keeps the control endpoints of an RTPEngine set in sync with the Kubernetes
//! EndpointSlice of the service backing it, and wakes a consumer whenever the
//! endpoint list changes.
//!
//! # Features
//!
//! - **Event filtering**: only the configured `namespace/name` EndpointSlice is tracked
//! - **Port resolution**: numeric ports or named ports resolved against the slice
//! - **Change detection**: order-insensitive, only real membership changes wake
//! - **Coalescing wake-ups**: bursts of changes produce a single wake
//!
//! # Quick Start
//!
//! ```ignore
//! use rtpengine_set::{EndpointSet, LocalInformer};
//! use std::sync::Arc;
//!
//! let informer = Arc::new(LocalInformer::new());
//! let set = EndpointSet::builder()
//!     .service_name("rtpengine")
//!     .service_namespace("voip")
//!     .service_port("ng")
//!     .informer(informer.clone())
//!     .logger(tracing::info_span!("rtpengine_set"))
//!     .start()?;
//!
//! while set.watch(shutdown.notified()).await.is_ok() {
//!     for ep in set.endpoints() {
//!         println!("{}", ep);
//!     }
//! }
//! ```
//!
//! # Configuration File
//!
//! ```toml
//! id = 0
//! service_name = "rtpengine"
//! service_namespace = "voip"
//! service_port = "ng"
//! ```

pub mod change;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod informer;
pub mod set;
pub mod slice;
pub mod stream;

pub use change::{is_changed, ChangePolicy};
pub use config::SetConfig;
pub use endpoint::Endpoint;
pub use error::{ConfigError, FlattenError, StreamError, WatchError};
pub use informer::{EventSource, LocalInformer, Object, ObjectKey, ResourceEventHandler};
pub use set::{EndpointSet, EndpointSetBuilder};
pub use slice::{flatten, EndpointPort, EndpointSlice, ObjectMeta, PortRef, SliceEndpoint};
pub use stream::{EventType, WatchEvent};
