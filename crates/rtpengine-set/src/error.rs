// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types.

use thiserror::Error;

/// Configuration errors.
///
/// Fatal: returned by [`EndpointSetBuilder::start`](crate::EndpointSetBuilder::start) and
/// by configuration loading. The caller must fix the configuration and try again.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    MissingField(&'static str),

    #[error("Invalid port reference: {0}")]
    InvalidPort(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Port resolution errors raised while flattening an EndpointSlice.
///
/// Recoverable: the set logs them and keeps its last known endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlattenError {
    #[error("failed to find port {port} in EndpointSlice {slice}")]
    PortNotFound { port: String, slice: String },

    #[error("endpoint port {port} has no numerical port")]
    NoNumericPort { port: String },

    #[error("endpoint port {port} has out of range value {value}")]
    InvalidPort { port: String, value: i64 },
}

/// Reasons a [`watch`](crate::EndpointSet::watch) returned without a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WatchError {
    #[error("watch cancelled")]
    Cancelled,

    #[error("watch deadline exceeded")]
    DeadlineExceeded,
}

/// Watch-event stream decoding errors.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("JSON decode error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("watch event object has no metadata.name")]
    MissingMetadata,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
