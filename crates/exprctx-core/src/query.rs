//! # Query Module
//!
//! Expression Constraint Language (ECL) query seam.
//!
//! - Page requests and result pages
//! - The `EclQueryService` collaborator
//!
//! The collaborator may return a page larger than requested; callers enforce
//! the cap with [`Page::truncate`].

use crate::{BranchCriteria, ConceptId, ServiceError};
use serde::{Deserialize, Serialize};

/// Zero-based page selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number, starting at 0.
    pub page: usize,
    /// Maximum number of items per page.
    pub size: usize,
}

impl PageRequest {
    /// Request page `page` of `size` items.
    #[must_use]
    pub const fn of(page: usize, size: usize) -> Self {
        Self { page, size }
    }

    /// Request the first page of `size` items.
    #[must_use]
    pub const fn first(size: usize) -> Self {
        Self::of(0, size)
    }

    /// Index of the first item on this page.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.page.saturating_mul(self.size)
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page, in collaborator order.
    pub content: Vec<T>,
    /// Number of items matching across all pages.
    pub total_elements: usize,
}

impl<T> Page<T> {
    /// Create a page.
    #[must_use]
    pub fn new(content: Vec<T>, total_elements: usize) -> Self {
        Self {
            content,
            total_elements,
        }
    }

    /// Drop items beyond `limit`. Returns whether anything was dropped.
    pub fn truncate(&mut self, limit: usize) -> bool {
        let over = self.content.len() > limit;
        self.content.truncate(limit);
        over
    }
}

/// ECL query collaborator.
pub trait EclQueryService: Send + Sync {
    /// Select concept identifiers matching `ecl` in the snapshot `criteria`.
    ///
    /// `stated` selects the stated rather than inferred form.
    fn select_concept_ids(
        &self,
        ecl: &str,
        criteria: &BranchCriteria,
        stated: bool,
        page: PageRequest,
    ) -> Result<Page<ConceptId>, ServiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_request_offset() {
        assert_eq!(PageRequest::first(100).offset(), 0);
        assert_eq!(PageRequest::of(3, 100).offset(), 300);
        assert_eq!(PageRequest::of(usize::MAX, 2).offset(), usize::MAX);
    }

    #[test]
    fn truncate_reports_overflow() {
        let mut page = Page::new((0..10u64).map(ConceptId).collect(), 10);
        assert!(!page.truncate(10));
        assert!(page.truncate(4));
        assert_eq!(page.content.len(), 4);
        assert_eq!(page.total_elements, 10);
    }
}
