// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! RTPEngine control endpoint.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single RTPEngine control endpoint (address + port).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    /// Host name or IP address
    pub address: String,

    /// Control port
    pub port: u16,
}

impl Endpoint {
    /// Create a new endpoint.
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.address.contains(':') {
            write!(f, "[{}]:{}", self.address, self.port)
        } else {
            write!(f, "{}:{}", self.address, self.port)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_equality() {
        assert_eq!(Endpoint::new("10.0.0.1", 5060), Endpoint::new("10.0.0.1", 5060));
        assert_ne!(Endpoint::new("10.0.0.1", 5060), Endpoint::new("10.0.0.1", 5061));
        assert_ne!(Endpoint::new("10.0.0.1", 5060), Endpoint::new("10.0.0.2", 5060));
    }

    #[test]
    fn test_endpoint_display() {
        assert_eq!(Endpoint::new("10.0.0.1", 22222).to_string(), "10.0.0.1:22222");
        assert_eq!(Endpoint::new("fd00::1", 22222).to_string(), "[fd00::1]:22222");
    }

    #[test]
    fn test_endpoint_json() {
        let json = serde_json::to_string(&Endpoint::new("10.0.0.1", 5060)).unwrap();
        assert_eq!(json, r#"{"address":"10.0.0.1","port":5060}"#);
    }
}
