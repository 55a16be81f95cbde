//! # Terminology Fixture Format
//!
//! JSON description of a branch-versioned terminology, loaded into
//! [`MemoryTerminology`](crate::memory::MemoryTerminology).
//!
//! ```json
//! {
//!   "branches": [
//!     {
//!       "path": "MAIN",
//!       "creation": "2022-01-01T00:00:00Z",
//!       "versions": [
//!         { "timepoint": "2022-01-31T00:00:00Z", "mrcm": { "attribute_domains": [] }, "concepts": [] }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! ## Size limit
//!
//! Input larger than `MAX_FIXTURE_SIZE` is rejected before deserialization.

use crate::primitives::MAX_FIXTURE_SIZE;
use crate::{BranchPath, Concept, Mrcm, ServiceError, Timepoint};
use serde::{Deserialize, Serialize};

/// A whole terminology: branches and their content timelines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminologyFixture {
    pub branches: Vec<BranchFixture>,
}

/// One branch. `base` defaults to `creation`; `head` defaults to `base` and
/// advances to the newest version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchFixture {
    pub path: BranchPath,
    pub creation: Timepoint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<Timepoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<Timepoint>,
    #[serde(default)]
    pub versions: Vec<VersionFixture>,
}

/// Content committed at one timepoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionFixture {
    pub timepoint: Timepoint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mrcm: Option<Mrcm>,
    #[serde(default)]
    pub concepts: Vec<Concept>,
}

/// Parse a fixture from JSON bytes.
pub fn fixture_from_bytes(bytes: &[u8]) -> Result<TerminologyFixture, ServiceError> {
    if bytes.len() > MAX_FIXTURE_SIZE {
        return Err(ServiceError::InvalidFixture(format!(
            "Fixture size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_FIXTURE_SIZE
        )));
    }
    serde_json::from_slice(bytes).map_err(|e| ServiceError::InvalidFixture(e.to_string()))
}
