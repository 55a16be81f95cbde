//! # Branch Module
//!
//! Version-control vocabulary consumed by the expression context.
//!
//! - `Branch`: recorded state of a branch, including its last base timepoint
//! - `BranchCriteria`: opaque snapshot selector (present or pinned)
//! - `VersionControl`: the collaborator that produces both

use crate::{BranchPath, ServiceError, Timepoint};
use serde::{Deserialize, Serialize};

/// Recorded state of a branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    /// Path of the branch.
    pub path: BranchPath,
    /// When the branch was created.
    pub creation: Timepoint,
    /// When the branch last synchronized with its parent (creation or rebase).
    pub base: Timepoint,
    /// When content was last committed to the branch.
    pub head: Timepoint,
}

/// Snapshot-selection handle for a branch.
///
/// Selects the content visible on `branch_path` as of `timepoint`. Criteria are
/// cheap to clone and reusable across any number of reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchCriteria {
    branch_path: BranchPath,
    timepoint: Timepoint,
    pinned: bool,
}

impl BranchCriteria {
    /// Criteria for the current state of a branch whose head is `head`.
    #[must_use]
    pub fn at_head(branch_path: BranchPath, head: Timepoint) -> Self {
        Self {
            branch_path,
            timepoint: head,
            pinned: false,
        }
    }

    /// Criteria pinned at an explicit timepoint.
    #[must_use]
    pub fn pinned(branch_path: BranchPath, timepoint: Timepoint) -> Self {
        Self {
            branch_path,
            timepoint,
            pinned: true,
        }
    }

    /// The branch this snapshot reads from.
    #[must_use]
    pub fn branch_path(&self) -> &BranchPath {
        &self.branch_path
    }

    /// The instant the snapshot is taken at.
    #[must_use]
    pub fn timepoint(&self) -> Timepoint {
        self.timepoint
    }

    /// Whether the timepoint was requested explicitly.
    #[must_use]
    pub fn is_pinned(&self) -> bool {
        self.pinned
    }
}

/// Branch version-control collaborator.
///
/// Implementations must be `Send + Sync` so one store can back many
/// contexts owned by independent operations.
pub trait VersionControl: Send + Sync {
    /// Current recorded state of a branch.
    ///
    /// Returns `ServiceError::BranchNotFound` if the branch does not exist.
    fn find_latest(&self, path: &BranchPath) -> Result<Branch, ServiceError>;

    /// Criteria selecting everything visible on the branch right now.
    fn branch_criteria(&self, path: &BranchPath) -> Result<BranchCriteria, ServiceError>;

    /// Criteria selecting what was visible on the branch at `timepoint`.
    fn branch_criteria_at_timepoint(
        &self,
        path: &BranchPath,
        timepoint: Timepoint,
    ) -> Result<BranchCriteria, ServiceError>;
}
