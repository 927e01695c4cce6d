// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Set configuration.
//!
//! Supports both programmatic and file-based (TOML) configuration.

use crate::error::ConfigError;
use crate::set::EndpointSetBuilder;
use crate::slice::PortRef;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration of one RTPEngine set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetConfig {
    /// RTPEngine set number.
    #[serde(default)]
    pub id: u32,

    /// Service whose EndpointSlice lists the RTPEngine instances.
    #[serde(default)]
    pub service_name: String,

    /// Namespace of the service.
    #[serde(default = "default_namespace")]
    pub service_namespace: String,

    /// Control port: a number or the name of a declared port.
    #[serde(default)]
    pub service_port: String,

    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_namespace() -> String {
    "default".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SetConfig {
    fn default() -> Self {
        Self {
            id: 0,
            service_name: String::new(),
            service_namespace: default_namespace(),
            service_port: String::new(),
            log_level: default_log_level(),
        }
    }
}

impl SetConfig {
    /// Create a configuration for a service.
    pub fn new(service_name: impl Into<String>, service_port: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            service_port: service_port.into(),
            ..Default::default()
        }
    }

    /// Set the namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.service_namespace = namespace.into();
        self
    }

    /// Set the set number.
    pub fn with_id(mut self, id: u32) -> Self {
        self.id = id;
        self
    }

    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::MissingField("service_name"));
        }
        if self.service_namespace.is_empty() {
            return Err(ConfigError::MissingField("service_namespace"));
        }
        PortRef::parse(&self.service_port)?;
        Ok(())
    }

    /// Builder pre-filled with this configuration.
    ///
    /// The caller still supplies the event source and the logger span.
    pub fn builder(&self) -> EndpointSetBuilder {
        EndpointSetBuilder::new()
            .id(self.id)
            .service_name(self.service_name.clone())
            .service_namespace(self.service_namespace.clone())
            .service_port(self.service_port.clone())
    }
}
