//! # Formats Module
//!
//! Serialization formats for terminology data.
//!
//! File I/O operations are in the app layer.

mod fixture;

pub use fixture::*;
