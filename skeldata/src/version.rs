//! Export-version registry.
//!
//! The wire format evolves per editor minor version. A document's declared
//! version string is matched by `MAJOR.MINOR` prefix against a fixed table;
//! the selected reader then drives the whole document (readers are never
//! swapped mid-stream).

use crate::Error;

/// Concrete reader generation for a document version.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FormatVersion {
    /// 3.8 exports.
    V38,
    /// 4.0 exports.
    V40,
    /// 4.1 and 4.2 exports (4.1 documents decode with the 4.2 reader).
    V42,
}

/// Prefix registry, most recent first. Extending to a new export version
/// means adding one row here plus one reader module.
const REGISTRY: &[(&str, FormatVersion)] = &[
    ("4.2", FormatVersion::V42),
    ("4.1", FormatVersion::V42),
    ("4.0", FormatVersion::V40),
    ("3.8", FormatVersion::V38),
];

impl FormatVersion {
    pub fn lookup(version: &str) -> Result<Self, Error> {
        REGISTRY
            .iter()
            .find(|(prefix, _)| version.starts_with(prefix))
            .map(|&(_, v)| v)
            .ok_or_else(|| Error::UnsupportedVersion {
                value: version.to_string(),
            })
    }

    /// Whether the format carries sequences, physics constraints and the
    /// other additions introduced with 4.2.
    pub fn has_physics(self) -> bool {
        self == FormatVersion::V42
    }
}
