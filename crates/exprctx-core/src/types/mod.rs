//! # Core Type Definitions
//!
//! This module contains the shared vocabulary of the expression context:
//! - Identifiers (`ConceptId`, `BranchPath`, `Timepoint`)
//! - Operation policy (`DisplayTermsRequired`, `ExpressionConfig`)
//! - Error types (`ExpressionError`, `ServiceError`)
//!
//! ## Determinism Guarantees
//!
//! All identifier types implement `Ord` so they can be kept in
//! `BTreeMap`/`BTreeSet` with a stable iteration order.

use crate::primitives::{DEFAULT_MAXIMUM_POSTCOORDINATION_LEVEL, PATH_SEPARATOR};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// A point in branch history.
pub type Timepoint = DateTime<Utc>;

/// SNOMED CT concept identifier.
///
/// Displayed and parsed as decimal text (`73211009`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConceptId(pub u64);

impl fmt::Display for ConceptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ConceptId {
    type Err = ExpressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| ExpressionError::InvalidConceptId(s.to_string()))
    }
}

impl From<u64> for ConceptId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Slash-separated path of a version-controlled branch (`MAIN/PROJECT`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchPath(String);

impl BranchPath {
    /// Parse and validate a branch path.
    pub fn new(path: impl Into<String>) -> Result<Self, ExpressionError> {
        let path = path.into();
        if path.is_empty() || path.split(PATH_SEPARATOR).any(str::is_empty) {
            return Err(ExpressionError::InvalidBranchPath(path));
        }
        Ok(Self(path))
    }

    /// The path as text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the version-control root (no parent).
    #[must_use]
    pub fn is_root(&self) -> bool {
        !self.0.contains(PATH_SEPARATOR)
    }

    /// The parent path, or `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.0
            .rfind(PATH_SEPARATOR)
            .map(|idx| Self(self.0[..idx].to_string()))
    }
}

impl fmt::Display for BranchPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for BranchPath {
    type Err = ExpressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for BranchPath {
    type Error = ExpressionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BranchPath> for String {
    fn from(path: BranchPath) -> Self {
        path.0
    }
}

// =============================================================================
// OPERATION POLICY
// =============================================================================

/// Which display terms callers must produce for an expression.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DisplayTermsRequired {
    /// No display terms are required.
    #[default]
    None,
    /// Fully specified name only.
    Fsn,
    /// Preferred term only.
    Pt,
    /// Both the fully specified name and the preferred term.
    FsnAndPt,
}

impl DisplayTermsRequired {
    /// Whether a fully specified name must be produced.
    #[must_use]
    pub fn requires_fsn(self) -> bool {
        matches!(self, Self::Fsn | Self::FsnAndPt)
    }

    /// Whether a preferred term must be produced.
    #[must_use]
    pub fn requires_preferred_term(self) -> bool {
        matches!(self, Self::Pt | Self::FsnAndPt)
    }

    /// Stable textual name, as accepted by `FromStr`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Fsn => "fsn",
            Self::Pt => "pt",
            Self::FsnAndPt => "fsn_and_pt",
        }
    }
}

impl fmt::Display for DisplayTermsRequired {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisplayTermsRequired {
    type Err = ExpressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "fsn" => Ok(Self::Fsn),
            "pt" => Ok(Self::Pt),
            "fsn_and_pt" | "fsn-and-pt" => Ok(Self::FsnAndPt),
            _ => Err(ExpressionError::InvalidDisplayTerms(s.to_string())),
        }
    }
}

/// Construction-time settings of an expression operation.
///
/// The core never reads these from the environment; the owning operation
/// deserializes or builds them and hands them to the context builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpressionConfig {
    /// Read the MRCM from the parent branch at the working branch's base.
    pub use_dependant_release_branch_for_mrcm: bool,
    /// Ceiling on post-coordination nesting depth.
    pub maximum_postcoordination_level: u32,
    /// Display-term policy.
    pub display_terms_required: DisplayTermsRequired,
}

impl Default for ExpressionConfig {
    fn default() -> Self {
        Self {
            use_dependant_release_branch_for_mrcm: false,
            maximum_postcoordination_level: DEFAULT_MAXIMUM_POSTCOORDINATION_LEVEL,
            display_terms_required: DisplayTermsRequired::None,
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Failures reported by collaborators (version control, MRCM, ECL, concepts).
///
/// The context never recovers from these; they are propagated verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The branch does not exist.
    #[error("Branch not found: {0}")]
    BranchNotFound(BranchPath),

    /// No MRCM is visible from the requested snapshot.
    #[error("No active MRCM found for branch {0}")]
    MrcmNotFound(BranchPath),

    /// The concept is not present in the requested snapshot.
    #[error("Concept not found: {0}")]
    ConceptNotFound(ConceptId),

    /// The expression constraint could not be evaluated.
    #[error("ECL query failed: {0}")]
    Query(String),

    /// Backing data is malformed.
    #[error("Invalid terminology fixture: {0}")]
    InvalidFixture(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),
}

/// Errors surfaced by the expression context.
///
/// `IllegalOperation` and `FocusConceptNotSet` mean the caller's input or
/// call order is wrong; `Resolution` means a backing collaborator failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    /// The requested operation is not allowed for this branch.
    #[error("Illegal operation: {0}")]
    IllegalOperation(String),

    /// A collaborator failed while resolving data.
    #[error(transparent)]
    Resolution(#[from] ServiceError),

    /// A focus-dependent accessor was called before a focus concept was set.
    #[error("Focus concept id has not been set for this expression")]
    FocusConceptNotSet,

    /// The text is not a valid branch path.
    #[error("Invalid branch path: {0:?}")]
    InvalidBranchPath(String),

    /// The text is not a valid concept identifier.
    #[error("Invalid concept id: {0:?}")]
    InvalidConceptId(String),

    /// The text is not a known display-terms policy.
    #[error("Invalid display terms policy: {0:?}")]
    InvalidDisplayTerms(String),
}
