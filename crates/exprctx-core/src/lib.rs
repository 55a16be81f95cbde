//! # exprctx-core
//!
//! The resolution context for post-coordinated expressions - THE LOGIC.
//!
//! Validating a post-coordinated SNOMED CT expression needs three versioned
//! resources: the working branch snapshot, the MRCM that governs it, and the
//! focus concept's relationships. This crate resolves each of them lazily,
//! once per operation, through [`ExpressionContext`].
//!
//! ## Collaborators
//!
//! Storage, MRCM computation, ECL execution and concept hydration live behind
//! the [`VersionControl`], [`MrcmService`], [`EclQueryService`] and
//! [`ConceptService`] traits. [`memory::MemoryTerminology`] implements all
//! four over an in-memory branch timeline.
//!
//! ## Example
//!
//! ```
//! use exprctx_core::memory::MemoryTerminology;
//! use exprctx_core::{Branch, BranchPath, Collaborators, ExpressionContext};
//! use std::sync::Arc;
//!
//! let mut store = MemoryTerminology::new();
//! let main = BranchPath::new("MAIN").expect("path");
//! let now = chrono::Utc::now();
//! store
//!     .create_branch(Branch { path: main.clone(), creation: now, base: now, head: now })
//!     .expect("branch");
//!
//! let mut context =
//!     ExpressionContext::builder(main, Collaborators::from_shared(Arc::new(store))).build();
//! let first = context.branch_criteria().expect("criteria");
//! let second = context.branch_criteria().expect("criteria");
//! assert!(Arc::ptr_eq(&first, &second));
//! ```

// =============================================================================
// MODULES
// =============================================================================

pub mod branch;
pub mod concept;
pub mod context;
pub mod formats;
pub mod memory;
pub mod mrcm;
pub mod primitives;
pub mod query;
pub mod timer;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    BranchPath, ConceptId, DisplayTermsRequired, ExpressionConfig, ExpressionError, ServiceError,
    Timepoint,
};

// =============================================================================
// RE-EXPORTS: Collaborator seams
// =============================================================================

pub use branch::{Branch, BranchCriteria, VersionControl};
pub use concept::{CharacteristicType, Concept, ConceptService, Relationship};
pub use mrcm::{AttributeDomain, Mrcm, MrcmService};
pub use query::{EclQueryService, Page, PageRequest};
pub use timer::Timer;

// =============================================================================
// RE-EXPORTS: Expression context
// =============================================================================

pub use context::{Collaborators, ExpressionContext, ExpressionContextBuilder};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{BranchFixture, TerminologyFixture, VersionFixture, fixture_from_bytes};
