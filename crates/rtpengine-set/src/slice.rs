// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! EndpointSlice payload and flattening.
//!
//! An EndpointSlice groups its members as (declared ports x entries x addresses).
//! [`flatten`] resolves the configured port reference against the declared ports and
//! emits one [`Endpoint`] per address.

use crate::endpoint::Endpoint;
use crate::error::{ConfigError, FlattenError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Object metadata (the subset used for matching).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub namespace: String,
}

/// A port declared by an EndpointSlice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointPort {
    /// Symbolic port name (optional)
    #[serde(default)]
    pub name: Option<String>,

    /// Numeric port value (optional in the API)
    #[serde(default)]
    pub port: Option<i32>,

    /// Transport protocol (TCP, UDP, SCTP)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
}

impl EndpointPort {
    /// Create a named port.
    pub fn named(name: impl Into<String>, port: i32) -> Self {
        Self {
            name: Some(name.into()),
            port: Some(port),
            protocol: None,
        }
    }

    /// Create an unnamed port.
    pub fn unnamed(port: i32) -> Self {
        Self {
            name: None,
            port: Some(port),
            protocol: None,
        }
    }
}

/// One membership entry of an EndpointSlice (usually one pod).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceEndpoint {
    #[serde(default)]
    pub addresses: Vec<String>,
}

impl SliceEndpoint {
    /// Create an entry carrying the given addresses.
    pub fn new<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            addresses: addresses.into_iter().map(Into::into).collect(),
        }
    }
}

/// Kubernetes `discovery.k8s.io/v1` EndpointSlice (the fields this crate reads).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointSlice {
    #[serde(default)]
    pub metadata: ObjectMeta,

    #[serde(default)]
    pub ports: Vec<EndpointPort>,

    #[serde(default)]
    pub endpoints: Vec<SliceEndpoint>,
}

impl EndpointSlice {
    /// Create an empty slice with the given identity.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            metadata: ObjectMeta {
                name: name.into(),
                namespace: namespace.into(),
            },
            ..Default::default()
        }
    }

    /// Add a declared port.
    pub fn with_port(mut self, port: EndpointPort) -> Self {
        self.ports.push(port);
        self
    }

    /// Add a membership entry.
    pub fn with_endpoint(mut self, endpoint: SliceEndpoint) -> Self {
        self.endpoints.push(endpoint);
        self
    }

    /// Check whether this slice belongs to the given service.
    pub fn matches(&self, namespace: &str, name: &str) -> bool {
        self.metadata.name == name && self.metadata.namespace == namespace
    }
}

/// Reference to the port to use for every endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortRef {
    /// Literal port number
    Number(u16),

    /// Name resolved against the slice's declared ports
    Named(String),
}

impl PortRef {
    /// Parse a configured port reference.
    ///
    /// Positive integers are literal ports; everything else, `0` and negative numbers
    /// included, is a port name.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        if s.is_empty() {
            return Err(ConfigError::MissingField("service_port"));
        }

        match s.parse::<i64>() {
            Ok(n) if n > 0 => u16::try_from(n)
                .map(PortRef::Number)
                .map_err(|_| ConfigError::InvalidPort(s.to_string())),
            _ => Ok(PortRef::Named(s.to_string())),
        }
    }
}

impl fmt::Display for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Named(name) => f.write_str(name),
        }
    }
}

/// Resolve `port_ref` against the declared ports of `slice`.
fn resolve_port(port_ref: &PortRef, slice: &EndpointSlice) -> Result<u16, FlattenError> {
    let name = match port_ref {
        PortRef::Number(n) => return Ok(*n),
        PortRef::Named(name) => name,
    };

    let declared = slice
        .ports
        .iter()
        .find(|p| p.name.as_deref() == Some(name.as_str()))
        .ok_or_else(|| FlattenError::PortNotFound {
            port: name.clone(),
            slice: slice.metadata.name.clone(),
        })?;

    let value = declared.port.ok_or_else(|| FlattenError::NoNumericPort {
        port: name.clone(),
    })?;

    u16::try_from(value)
        .ok()
        .filter(|p| *p > 0)
        .ok_or_else(|| FlattenError::InvalidPort {
            port: name.clone(),
            value: i64::from(value),
        })
}

/// Flatten an EndpointSlice into one endpoint per address.
///
/// Order follows the slice's entries, then each entry's addresses.
pub fn flatten(port_ref: &PortRef, slice: &EndpointSlice) -> Result<Vec<Endpoint>, FlattenError> {
    let port = resolve_port(port_ref, slice)?;

    Ok(slice
        .endpoints
        .iter()
        .flat_map(|entry| entry.addresses.iter())
        .map(|addr| Endpoint::new(addr.clone(), port))
        .collect())
}
