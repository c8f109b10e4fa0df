//! Multi-version deserializer for 2D skeletal animation exports.
//!
//! Takes a self-describing skeleton document — a packed binary stream or a
//! JSON document — and produces a [`SkeletonData`] object tree: bones, slots,
//! skins, constraints, events and animations. The document's declared export
//! version (3.8, 4.0, 4.1, 4.2) selects a version-specific reader; each
//! reader mirrors the editor that wrote that version.
//!
//! The crate is IO-free: it operates on `&[u8]` / `&str` only. Runtime
//! evaluation (posing, constraint solving, rendering) is out of scope.

#![forbid(unsafe_code)]

mod error;
mod model;
mod version;

#[cfg(feature = "binary")]
pub mod binary;

#[cfg(feature = "json")]
pub mod json;

pub use error::*;
pub use model::*;
pub use version::*;

#[cfg(all(test, feature = "binary"))]
mod binary_tests;

#[cfg(all(test, feature = "binary"))]
mod binary_v38_tests;


#[cfg(all(test, feature = "json"))]
mod json_tests;
