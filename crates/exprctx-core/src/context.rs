//! # Expression Context
//!
//! Per-operation resolution cache for validating post-coordinated expressions.
//!
//! An `ExpressionContext` is created for one operation (one validation, one
//! classification call) and owned by it exclusively. Every accessor calls a
//! collaborator the first time and reads its own cache afterwards.
//!
//! ## Cache scopes
//!
//! - Operation scope: working-branch criteria, MRCM-branch criteria, MRCM,
//!   ungrouped attribute domains. Never cleared.
//! - Expression scope: focus concept id, hydrated focus concept, its
//!   ancestors-and-self. Cleared by [`ExpressionContext::reset`].
//!
//! ## MRCM branch
//!
//! With `use_dependant_release_branch_for_mrcm`, every MRCM-governed read
//! (MRCM lookup, ECL, ancestors, focus hydration) goes to the parent branch
//! pinned at the working branch's last base, so expressions are checked
//! against the model in force when the branch last synchronized.

use crate::primitives::{ANCESTOR_RESULT_LIMIT, ECL_RESULT_LIMIT};
use crate::{
    AttributeDomain, BranchCriteria, BranchPath, Concept, ConceptId, ConceptService,
    DisplayTermsRequired, EclQueryService, ExpressionConfig, ExpressionError, Mrcm, MrcmService,
    PageRequest, ServiceError, Timer, VersionControl,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

const ILLEGAL_ROOT_BRANCH: &str = "Expressions can not be maintained in the root branch. \
     Please create a child codesystem and use the working branch of that codesystem.";

// =============================================================================
// COLLABORATORS
// =============================================================================

/// The services an expression context delegates to.
#[derive(Clone)]
pub struct Collaborators {
    pub version_control: Arc<dyn VersionControl>,
    pub mrcm: Arc<dyn MrcmService>,
    pub ecl: Arc<dyn EclQueryService>,
    pub concepts: Arc<dyn ConceptService>,
}

impl Collaborators {
    /// Bundle four collaborators.
    #[must_use]
    pub fn new(
        version_control: Arc<dyn VersionControl>,
        mrcm: Arc<dyn MrcmService>,
        ecl: Arc<dyn EclQueryService>,
        concepts: Arc<dyn ConceptService>,
    ) -> Self {
        Self {
            version_control,
            mrcm,
            ecl,
            concepts,
        }
    }

    /// Use one store for every role.
    #[must_use]
    pub fn from_shared<T>(store: Arc<T>) -> Self
    where
        T: VersionControl + MrcmService + EclQueryService + ConceptService + 'static,
    {
        Self {
            version_control: store.clone(),
            mrcm: store.clone(),
            ecl: store.clone(),
            concepts: store,
        }
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

// =============================================================================
// BUILDER
// =============================================================================

/// Builder for [`ExpressionContext`]. All collaborators are supplied up front.
#[derive(Debug)]
pub struct ExpressionContextBuilder {
    branch: BranchPath,
    collaborators: Collaborators,
    config: ExpressionConfig,
    timer: Timer,
}

impl ExpressionContextBuilder {
    /// Read the MRCM from the dependant release branch.
    #[must_use]
    pub fn use_dependant_release_branch_for_mrcm(mut self, enabled: bool) -> Self {
        self.config.use_dependant_release_branch_for_mrcm = enabled;
        self
    }

    #[must_use]
    pub fn maximum_postcoordination_level(mut self, level: u32) -> Self {
        self.config.maximum_postcoordination_level = level;
        self
    }

    #[must_use]
    pub fn display_terms_required(mut self, policy: DisplayTermsRequired) -> Self {
        self.config.display_terms_required = policy;
        self
    }

    /// Replace all settings at once.
    #[must_use]
    pub fn config(mut self, config: ExpressionConfig) -> Self {
        self.config = config;
        self
    }

    /// Initial instrumentation handle.
    #[must_use]
    pub fn timer(mut self, timer: Timer) -> Self {
        self.timer = timer;
        self
    }

    /// Create the context. Nothing is resolved until first use.
    #[must_use]
    pub fn build(self) -> ExpressionContext {
        ExpressionContext {
            branch: self.branch,
            config: self.config,
            collaborators: self.collaborators,
            timer: self.timer,
            branch_criteria: None,
            dependant_release_branch_criteria: None,
            mrcm: None,
            mrcm_ungrouped_attributes: None,
            focus_concept_id: None,
            focus_concept: None,
            ancestors_and_self_of_focus_concept: None,
        }
    }
}

// =============================================================================
// EXPRESSION CONTEXT
// =============================================================================

/// Lazily resolved, cache-once view of one branch for one operation.
///
/// Not shareable between operations: accessors take `&mut self`. Parallel
/// validations each own a context and may share the collaborators.
#[derive(Debug)]
pub struct ExpressionContext {
    branch: BranchPath,
    config: ExpressionConfig,
    collaborators: Collaborators,
    timer: Timer,

    // Operation scope
    branch_criteria: Option<Arc<BranchCriteria>>,
    dependant_release_branch_criteria: Option<Arc<BranchCriteria>>,
    mrcm: Option<Arc<Mrcm>>,
    mrcm_ungrouped_attributes: Option<Arc<BTreeSet<AttributeDomain>>>,

    // Expression scope
    focus_concept_id: Option<ConceptId>,
    focus_concept: Option<Arc<Concept>>,
    ancestors_and_self_of_focus_concept: Option<Arc<BTreeSet<ConceptId>>>,
}

impl ExpressionContext {
    /// Start building a context for `branch`.
    #[must_use]
    pub fn builder(branch: BranchPath, collaborators: Collaborators) -> ExpressionContextBuilder {
        ExpressionContextBuilder {
            branch,
            collaborators,
            config: ExpressionConfig::default(),
            timer: Timer::default(),
        }
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Prepare for the next expression.
    ///
    /// Installs `timer` and clears the focus concept caches. Branch and MRCM
    /// caches are kept for the whole operation.
    pub fn reset(&mut self, timer: Timer) {
        self.timer = timer;
        self.focus_concept = None;
        self.focus_concept_id = None;
        self.ancestors_and_self_of_focus_concept = None;
    }

    /// Set the concept the current expression refines.
    pub fn set_focus_concept_id(&mut self, concept_id: ConceptId) {
        self.focus_concept_id = Some(concept_id);
    }

    #[must_use]
    pub fn focus_concept_id(&self) -> Option<ConceptId> {
        self.focus_concept_id
    }

    // -------------------------------------------------------------------------
    // Read-only settings
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn branch(&self) -> &BranchPath {
        &self.branch
    }

    #[must_use]
    pub fn maximum_postcoordination_level(&self) -> u32 {
        self.config.maximum_postcoordination_level
    }

    #[must_use]
    pub fn display_terms_required(&self) -> DisplayTermsRequired {
        self.config.display_terms_required
    }

    #[must_use]
    pub fn uses_dependant_release_branch_for_mrcm(&self) -> bool {
        self.config.use_dependant_release_branch_for_mrcm
    }

    #[must_use]
    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    /// Concept collaborator, for validators that need more than the focus.
    #[must_use]
    pub fn concept_service(&self) -> &dyn ConceptService {
        self.collaborators.concepts.as_ref()
    }

    /// ECL collaborator, for validators that need paging beyond [`Self::ecl`].
    #[must_use]
    pub fn ecl_query_service(&self) -> &dyn EclQueryService {
        self.collaborators.ecl.as_ref()
    }

    // -------------------------------------------------------------------------
    // Branch & MRCM resolution
    // -------------------------------------------------------------------------

    /// Criteria for the current state of the working branch.
    pub fn branch_criteria(&mut self) -> Result<Arc<BranchCriteria>, ExpressionError> {
        if let Some(criteria) = &self.branch_criteria {
            return Ok(Arc::clone(criteria));
        }
        tracing::debug!(branch = %self.branch, "resolving branch criteria");
        let criteria = Arc::new(
            self.collaborators
                .version_control
                .branch_criteria(&self.branch)?,
        );
        self.branch_criteria = Some(Arc::clone(&criteria));
        Ok(criteria)
    }

    /// Criteria for every MRCM-governed read.
    ///
    /// Without the dependant release flag this is [`Self::branch_criteria`].
    /// With it, the parent branch pinned at the working branch's base.
    pub fn mrcm_branch_criteria(&mut self) -> Result<Arc<BranchCriteria>, ExpressionError> {
        if !self.config.use_dependant_release_branch_for_mrcm {
            return self.branch_criteria();
        }
        if let Some(criteria) = &self.dependant_release_branch_criteria {
            return Ok(Arc::clone(criteria));
        }

        let Some(parent) = self.branch.parent() else {
            return Err(ExpressionError::IllegalOperation(
                ILLEGAL_ROOT_BRANCH.to_string(),
            ));
        };
        let latest = self.collaborators.version_control.find_latest(&self.branch)?;
        tracing::debug!(
            branch = %self.branch,
            parent = %parent,
            base = %latest.base,
            "resolving dependant release branch criteria"
        );
        let criteria = Arc::new(
            self.collaborators
                .version_control
                .branch_criteria_at_timepoint(&parent, latest.base)?,
        );
        self.dependant_release_branch_criteria = Some(Arc::clone(&criteria));
        Ok(criteria)
    }

    /// The active MRCM, read from the MRCM branch criteria.
    pub fn branch_mrcm(&mut self) -> Result<Arc<Mrcm>, ExpressionError> {
        if let Some(mrcm) = &self.mrcm {
            return Ok(Arc::clone(mrcm));
        }
        let criteria = self.mrcm_branch_criteria()?;
        tracing::debug!(branch = %criteria.branch_path(), "loading active MRCM");
        let mrcm = self.collaborators.mrcm.load_active_mrcm(&criteria)?;
        self.mrcm = Some(Arc::clone(&mrcm));
        Ok(mrcm)
    }

    /// Attribute-domain rules that may appear outside a relationship group.
    pub fn mrcm_ungrouped_attributes(
        &mut self,
    ) -> Result<Arc<BTreeSet<AttributeDomain>>, ExpressionError> {
        if let Some(ungrouped) = &self.mrcm_ungrouped_attributes {
            return Ok(Arc::clone(ungrouped));
        }
        let ungrouped = Arc::new(self.branch_mrcm()?.ungrouped_attribute_domains());
        self.mrcm_ungrouped_attributes = Some(Arc::clone(&ungrouped));
        Ok(ungrouped)
    }

    // -------------------------------------------------------------------------
    // Concept-set queries
    // -------------------------------------------------------------------------

    /// Concept ids matching `ecl` on the MRCM branch, at most 1000.
    pub fn ecl(&mut self, ecl: &str) -> Result<BTreeSet<ConceptId>, ExpressionError> {
        self.select_concept_ids(ecl, ECL_RESULT_LIMIT)
    }

    /// `concept_id` and its ancestors on the MRCM branch, at most 100.
    pub fn ancestors_and_self(
        &mut self,
        concept_id: ConceptId,
    ) -> Result<BTreeSet<ConceptId>, ExpressionError> {
        self.select_concept_ids(&format!(">>{concept_id}"), ANCESTOR_RESULT_LIMIT)
    }

    /// Ancestors-and-self of the focus concept, cached until `reset`.
    pub fn ancestors_and_self_of_focus_concept(
        &mut self,
    ) -> Result<Arc<BTreeSet<ConceptId>>, ExpressionError> {
        if let Some(ancestors) = &self.ancestors_and_self_of_focus_concept {
            return Ok(Arc::clone(ancestors));
        }
        let focus = self.require_focus_concept_id()?;
        let ancestors = Arc::new(self.ancestors_and_self(focus)?);
        self.ancestors_and_self_of_focus_concept = Some(Arc::clone(&ancestors));
        Ok(ancestors)
    }

    fn select_concept_ids(
        &mut self,
        ecl: &str,
        limit: usize,
    ) -> Result<BTreeSet<ConceptId>, ExpressionError> {
        let criteria = self.mrcm_branch_criteria()?;
        let mut page = self.collaborators.ecl.select_concept_ids(
            ecl,
            &criteria,
            false,
            PageRequest::first(limit),
        )?;
        if page.truncate(limit) {
            tracing::warn!(
                ecl,
                limit,
                total = page.total_elements,
                "ECL result truncated"
            );
        }
        Ok(page.content.into_iter().collect())
    }

    // -------------------------------------------------------------------------
    // Focus concept
    // -------------------------------------------------------------------------

    /// The focus concept with its active relationships, hydrated from the
    /// MRCM branch. Cached until `reset`.
    pub fn focus_concept_with_active_relationships(
        &mut self,
    ) -> Result<Arc<Concept>, ExpressionError> {
        if let Some(concept) = &self.focus_concept {
            return Ok(Arc::clone(concept));
        }
        let focus = self.require_focus_concept_id()?;
        let criteria = self.mrcm_branch_criteria()?;

        let mut concepts = BTreeMap::new();
        concepts.insert(focus, Concept::new(focus));
        tracing::debug!(concept = %focus, branch = %criteria.branch_path(), "hydrating focus concept");
        self.collaborators
            .concepts
            .join_relationships(&mut concepts, &criteria, &self.timer, true)?;
        self.timer.checkpoint("focus concept relationships");

        let concept = Arc::new(
            concepts
                .remove(&focus)
                .ok_or(ServiceError::ConceptNotFound(focus))?,
        );
        self.focus_concept = Some(Arc::clone(&concept));
        Ok(concept)
    }

    fn require_focus_concept_id(&self) -> Result<ConceptId, ExpressionError> {
        self.focus_concept_id
            .ok_or(ExpressionError::FocusConceptNotSet)
    }
}
