//! Installed packages as reported by the inventory source

use serde::{Deserialize, Serialize};
use std::fmt;

/// Domain suffixes stripped to obtain a package short name.
///
/// Ordered longest first so the most specific suffix wins.
pub const KNOWN_SUFFIXES: [&str; 3] = [".dnp.dappnode.eth", ".dappnode.eth", ".eth"];

/// A package installed on the node.
///
/// Identity is the name; the version is opaque and only compared for equality.
/// Extra fields reported by the inventory (state, ip, ...) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    pub version: String,
}

impl Package {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    pub fn short_name(&self) -> &str {
        short_name(&self.name)
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// Strip the first matching known domain suffix from a package name.
///
/// Names without a known suffix are returned unchanged.
pub fn short_name(package_name: &str) -> &str {
    KNOWN_SUFFIXES
        .iter()
        .find_map(|suffix| package_name.strip_suffix(suffix))
        .unwrap_or(package_name)
}
