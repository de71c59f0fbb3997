//! Validated configuration value types
//!
//! Newtypes that make invalid configuration unrepresentable once parsed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A non-zero TCP port number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Port(u16);

impl Port {
    /// Create a port, rejecting 0
    #[must_use]
    pub const fn new(port: u16) -> Option<Self> {
        if port == 0 { None } else { Some(Self(port)) }
    }

    /// Get the underlying port number
    #[must_use]
    #[inline]
    pub const fn get(self) -> u16 {
        self.0
    }
}

impl TryFrom<u16> for Port {
    type Error = String;

    fn try_from(port: u16) -> Result<Self, Self::Error> {
        Self::new(port).ok_or_else(|| "port must be non-zero".to_string())
    }
}

impl From<Port> for u16 {
    fn from(port: Port) -> Self {
        port.0
    }
}

impl FromStr for Port {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let port: u16 = s
            .parse()
            .map_err(|e| format!("invalid port number: {}", e))?;
        Self::new(port).ok_or_else(|| "port must be non-zero".to_string())
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Number of tokio worker threads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThreadCount(usize);

impl ThreadCount {
    /// Create a thread count, rejecting 0
    #[must_use]
    pub const fn new(count: usize) -> Option<Self> {
        if count == 0 { None } else { Some(Self(count)) }
    }

    /// Get the underlying count
    #[must_use]
    #[inline]
    pub const fn get(self) -> usize {
        self.0
    }
}

impl FromStr for ThreadCount {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let count: usize = s
            .parse()
            .map_err(|e| format!("invalid thread count: {}", e))?;
        Self::new(count).ok_or_else(|| "thread count must be non-zero".to_string())
    }
}

impl fmt::Display for ThreadCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
