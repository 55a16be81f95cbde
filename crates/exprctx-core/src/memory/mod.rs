//! # In-Memory Terminology
//!
//! Reference implementation of every collaborator the expression context
//! consumes: `VersionControl`, `MrcmService`, `EclQueryService` and
//! `ConceptService`.
//!
//! Each branch keeps a timeline of content versions. A snapshot of a branch at
//! a timepoint sees its own versions up to that timepoint, newest winning,
//! layered over the parent's snapshot at the branch's base. Content committed
//! to a parent after a child's base is therefore invisible to the child until
//! it is rebased.

mod ecl;
mod snapshot;

pub use ecl::EclConstraint;

use crate::formats::TerminologyFixture;
use crate::primitives::PATH_SEPARATOR;
use crate::{
    Branch, BranchCriteria, BranchPath, Concept, ConceptId, ConceptService, EclQueryService, Mrcm,
    MrcmService, Page, PageRequest, ServiceError, Timepoint, Timer, VersionControl,
};
use snapshot::Snapshot;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Content committed to a branch at one timepoint.
#[derive(Debug, Clone, Default)]
pub struct ContentVersion {
    pub timepoint: Timepoint,
    /// MRCM defined by this version, if any.
    pub mrcm: Option<Arc<Mrcm>>,
    pub concepts: BTreeMap<ConceptId, Concept>,
}

impl ContentVersion {
    /// An empty version at `timepoint`.
    #[must_use]
    pub fn new(timepoint: Timepoint) -> Self {
        Self {
            timepoint,
            mrcm: None,
            concepts: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_mrcm(mut self, mrcm: Mrcm) -> Self {
        self.mrcm = Some(Arc::new(mrcm));
        self
    }

    #[must_use]
    pub fn with_concept(mut self, concept: Concept) -> Self {
        self.concepts.insert(concept.concept_id, concept);
        self
    }
}

#[derive(Debug, Clone)]
struct BranchState {
    branch: Branch,
    /// Sorted by timepoint.
    versions: Vec<ContentVersion>,
}

impl BranchState {
    /// Versions committed at or before `timepoint`, newest first.
    fn versions_at(&self, timepoint: Timepoint) -> impl Iterator<Item = &ContentVersion> {
        self.versions
            .iter()
            .rev()
            .skip_while(move |version| version.timepoint > timepoint)
    }
}

/// Branch-versioned terminology held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryTerminology {
    branches: BTreeMap<BranchPath, BranchState>,
}

impl MemoryTerminology {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a parsed fixture.
    ///
    /// Branches are created parents first, whatever their order in the fixture.
    pub fn from_fixture(fixture: TerminologyFixture) -> Result<Self, ServiceError> {
        let mut branches = fixture.branches;
        branches.sort_by_key(|b| b.path.as_str().matches(PATH_SEPARATOR).count());

        let mut store = Self::new();
        for fixture_branch in branches {
            let base = fixture_branch.base.unwrap_or(fixture_branch.creation);
            let head = fixture_branch.head.unwrap_or(base);
            store.create_branch(Branch {
                path: fixture_branch.path.clone(),
                creation: fixture_branch.creation,
                base,
                head,
            })?;
            for version in fixture_branch.versions {
                let mut content = ContentVersion::new(version.timepoint);
                content.mrcm = version.mrcm.map(Arc::new);
                for concept in version.concepts {
                    content.concepts.insert(concept.concept_id, concept);
                }
                store.commit(&fixture_branch.path, content)?;
            }
        }
        Ok(store)
    }

    /// Register a branch. Its parent must already exist.
    pub fn create_branch(&mut self, branch: Branch) -> Result<(), ServiceError> {
        if let Some(parent) = branch.path.parent() {
            if !self.branches.contains_key(&parent) {
                return Err(ServiceError::InvalidFixture(format!(
                    "Parent branch {parent} of {} does not exist",
                    branch.path
                )));
            }
        }
        if self.branches.contains_key(&branch.path) {
            return Err(ServiceError::InvalidFixture(format!(
                "Branch {} already exists",
                branch.path
            )));
        }
        self.branches.insert(
            branch.path.clone(),
            BranchState {
                branch,
                versions: Vec::new(),
            },
        );
        Ok(())
    }

    /// Add a content version to a branch, advancing its head if newer.
    pub fn commit(&mut self, path: &BranchPath, version: ContentVersion) -> Result<(), ServiceError> {
        for concept in version.concepts.values() {
            if let Some(rel) = concept
                .relationships
                .iter()
                .find(|r| r.source_id != concept.concept_id)
            {
                return Err(ServiceError::InvalidFixture(format!(
                    "Relationship {} listed under concept {} has source {}",
                    rel.id, concept.concept_id, rel.source_id
                )));
            }
        }
        let state = self.state_mut(path)?;
        if version.timepoint > state.branch.head {
            state.branch.head = version.timepoint;
        }
        let at = state
            .versions
            .partition_point(|existing| existing.timepoint <= version.timepoint);
        state.versions.insert(at, version);
        Ok(())
    }

    /// Synchronize a branch with its parent at `timepoint`.
    pub fn rebase(&mut self, path: &BranchPath, timepoint: Timepoint) -> Result<(), ServiceError> {
        let state = self.state_mut(path)?;
        state.branch.base = timepoint;
        if timepoint > state.branch.head {
            state.branch.head = timepoint;
        }
        Ok(())
    }

    /// Registered branch paths, in order.
    pub fn branch_paths(&self) -> impl Iterator<Item = &BranchPath> {
        self.branches.keys()
    }

    fn state(&self, path: &BranchPath) -> Result<&BranchState, ServiceError> {
        self.branches
            .get(path)
            .ok_or_else(|| ServiceError::BranchNotFound(path.clone()))
    }

    fn state_mut(&mut self, path: &BranchPath) -> Result<&mut BranchState, ServiceError> {
        self.branches
            .get_mut(path)
            .ok_or_else(|| ServiceError::BranchNotFound(path.clone()))
    }

    fn snapshot(&self, criteria: &BranchCriteria) -> Result<Snapshot<'_>, ServiceError> {
        let mut layers = Vec::new();
        let mut cursor = Some((criteria.branch_path().clone(), criteria.timepoint()));
        while let Some((path, timepoint)) = cursor {
            let state = self.state(&path)?;
            layers.extend(state.versions_at(timepoint));
            cursor = path
                .parent()
                .map(|parent| (parent, timepoint.min(state.branch.base)));
        }
        Ok(Snapshot { layers })
    }
}

// =============================================================================
// COLLABORATOR IMPLEMENTATIONS
// =============================================================================

impl VersionControl for MemoryTerminology {
    fn find_latest(&self, path: &BranchPath) -> Result<Branch, ServiceError> {
        Ok(self.state(path)?.branch.clone())
    }

    fn branch_criteria(&self, path: &BranchPath) -> Result<BranchCriteria, ServiceError> {
        let head = self.state(path)?.branch.head;
        Ok(BranchCriteria::at_head(path.clone(), head))
    }

    fn branch_criteria_at_timepoint(
        &self,
        path: &BranchPath,
        timepoint: Timepoint,
    ) -> Result<BranchCriteria, ServiceError> {
        self.state(path)?;
        Ok(BranchCriteria::pinned(path.clone(), timepoint))
    }
}

impl MrcmService for MemoryTerminology {
    fn load_active_mrcm(&self, criteria: &BranchCriteria) -> Result<Arc<Mrcm>, ServiceError> {
        self.snapshot(criteria)?
            .mrcm()
            .cloned()
            .ok_or_else(|| ServiceError::MrcmNotFound(criteria.branch_path().clone()))
    }
}

impl EclQueryService for MemoryTerminology {
    fn select_concept_ids(
        &self,
        ecl: &str,
        criteria: &BranchCriteria,
        stated: bool,
        page: PageRequest,
    ) -> Result<Page<ConceptId>, ServiceError> {
        let constraint = EclConstraint::parse(ecl)?;
        let matches = constraint.evaluate(&self.snapshot(criteria)?.hierarchy(stated));
        let content = matches
            .iter()
            .skip(page.offset())
            .take(page.size)
            .copied()
            .collect();
        Ok(Page::new(content, matches.len()))
    }
}

impl ConceptService for MemoryTerminology {
    fn join_relationships(
        &self,
        concepts: &mut BTreeMap<ConceptId, Concept>,
        criteria: &BranchCriteria,
        timer: &Timer,
        active_only: bool,
    ) -> Result<(), ServiceError> {
        let snapshot = self.snapshot(criteria)?;
        for (id, concept) in concepts.iter_mut() {
            if let Some(stored) = snapshot.concept(*id) {
                concept.active = stored.active;
                concept.relationships = stored
                    .relationships
                    .iter()
                    .filter(|r| !active_only || r.active)
                    .cloned()
                    .collect();
            }
        }
        timer.checkpoint("join relationships");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concept::CharacteristicType;
    use crate::mrcm::{ContentType, RuleStrength};
    use crate::primitives::IS_A;
    use crate::{AttributeDomain, Relationship};
    use chrono::TimeZone;

    fn at(year: i32, month: u32) -> Timepoint {
        chrono::Utc
            .with_ymd_and_hms(year, month, 1, 0, 0, 0)
            .single()
            .expect("valid date")
    }

    fn path(p: &str) -> BranchPath {
        BranchPath::new(p).expect("path")
    }

    fn is_a(id: u64, source: u64, parent: u64) -> Relationship {
        Relationship {
            id,
            source_id: ConceptId(source),
            type_id: ConceptId(IS_A),
            destination_id: ConceptId(parent),
            relationship_group: 0,
            characteristic_type: CharacteristicType::Inferred,
            active: true,
        }
    }

    fn concept(id: u64, rels: Vec<Relationship>) -> Concept {
        Concept {
            concept_id: ConceptId(id),
            active: true,
            relationships: rels,
        }
    }

    fn mrcm(grouped: bool) -> Mrcm {
        Mrcm::new(vec![AttributeDomain {
            id: format!("rule-{grouped}"),
            attribute_id: ConceptId(363_698_007),
            domain_id: ConceptId(404_684_003),
            grouped,
            attribute_cardinality: "0..*".to_string(),
            attribute_in_group_cardinality: "0..1".to_string(),
            content_type: ContentType::All,
            rule_strength: RuleStrength::Mandatory,
            active: true,
        }])
    }

    /// MAIN gets a second MRCM after PROJECT was branched.
    fn store() -> MemoryTerminology {
        let mut store = MemoryTerminology::new();
        store
            .create_branch(Branch {
                path: path("MAIN"),
                creation: at(2020, 1),
                base: at(2020, 1),
                head: at(2020, 1),
            })
            .expect("main");
        store
            .commit(
                &path("MAIN"),
                ContentVersion::new(at(2022, 1))
                    .with_mrcm(mrcm(true))
                    .with_concept(concept(138_875_005, vec![]))
                    .with_concept(concept(404_684_003, vec![is_a(1, 404_684_003, 138_875_005)])),
            )
            .expect("commit");
        store
            .create_branch(Branch {
                path: path("MAIN/PROJECT"),
                creation: at(2023, 1),
                base: at(2023, 1),
                head: at(2023, 1),
            })
            .expect("project");
        store
            .commit(
                &path("MAIN/PROJECT"),
                ContentVersion::new(at(2023, 3))
                    .with_concept(concept(64_572_001, vec![is_a(2, 64_572_001, 404_684_003)])),
            )
            .expect("commit");
        store
            .commit(
                &path("MAIN"),
                ContentVersion::new(at(2023, 6)).with_mrcm(mrcm(false)),
            )
            .expect("commit");
        store
    }

    #[test]
    fn child_does_not_see_parent_content_after_base() {
        let store = store();
        let criteria = store.branch_criteria(&path("MAIN/PROJECT")).expect("criteria");
        let mrcm = store.load_active_mrcm(&criteria).expect("mrcm");
        assert!(mrcm.attribute_domains.iter().all(|d| d.grouped));

        let main = store.branch_criteria(&path("MAIN")).expect("criteria");
        let latest = store.load_active_mrcm(&main).expect("mrcm");
        assert!(latest.attribute_domains.iter().all(|d| !d.grouped));
    }

    #[test]
    fn later_versions_keep_earlier_content() {
        let store = store();
        let main = store.branch_criteria(&path("MAIN")).expect("criteria");
        let page = store
            .select_concept_ids("*", &main, false, PageRequest::first(10))
            .expect("ecl");
        assert_eq!(
            page.content,
            vec![ConceptId(138_875_005), ConceptId(404_684_003)]
        );
    }

    #[test]
    fn rebase_exposes_newer_parent_content() {
        let mut store = store();
        store.rebase(&path("MAIN/PROJECT"), at(2023, 7)).expect("rebase");
        let criteria = store.branch_criteria(&path("MAIN/PROJECT")).expect("criteria");
        let mrcm = store.load_active_mrcm(&criteria).expect("mrcm");
        assert!(mrcm.attribute_domains.iter().all(|d| !d.grouped));
    }

    #[test]
    fn ecl_spans_branch_layers() {
        let store = store();
        let criteria = store.branch_criteria(&path("MAIN/PROJECT")).expect("criteria");
        let page = store
            .select_concept_ids(">> 64572001", &criteria, false, PageRequest::first(10))
            .expect("ecl");
        assert_eq!(page.total_elements, 3);

        let pinned = store
            .branch_criteria_at_timepoint(&path("MAIN"), at(2021, 1))
            .expect("criteria");
        let empty = store
            .select_concept_ids("*", &pinned, false, PageRequest::first(10))
            .expect("ecl");
        assert!(empty.content.is_empty());
    }

    #[test]
    fn ecl_pages() {
        let store = store();
        let criteria = store.branch_criteria(&path("MAIN/PROJECT")).expect("criteria");
        let second = store
            .select_concept_ids("*", &criteria, false, PageRequest::of(1, 2))
            .expect("ecl");
        assert_eq!(second.content, vec![ConceptId(404_684_003)]);
        assert_eq!(second.total_elements, 3);
    }

    #[test]
    fn unknown_branch_fails() {
        let store = store();
        assert_eq!(
            store.find_latest(&path("MAIN/NOPE")),
            Err(ServiceError::BranchNotFound(path("MAIN/NOPE")))
        );
        assert!(
            store
                .branch_criteria_at_timepoint(&path("MAIN/NOPE"), at(2023, 1))
                .is_err()
        );
    }

    #[test]
    fn create_branch_requires_parent() {
        let mut store = MemoryTerminology::new();
        let result = store.create_branch(Branch {
            path: path("MAIN/ORPHAN"),
            creation: at(2020, 1),
            base: at(2020, 1),
            head: at(2020, 1),
        });
        assert!(matches!(result, Err(ServiceError::InvalidFixture(_))));
    }

    #[test]
    fn commit_rejects_foreign_relationships() {
        let mut store = store();
        let bad = ContentVersion::new(at(2024, 1))
            .with_concept(concept(73_211_009, vec![is_a(9, 1, 64_572_001)]));
        assert!(matches!(
            store.commit(&path("MAIN"), bad),
            Err(ServiceError::InvalidFixture(_))
        ));
    }

    #[test]
    fn join_relationships_fills_in_place() {
        let store = store();
        let criteria = store.branch_criteria(&path("MAIN/PROJECT")).expect("criteria");
        let mut concepts = BTreeMap::new();
        concepts.insert(ConceptId(64_572_001), Concept::new(ConceptId(64_572_001)));
        concepts.insert(ConceptId(999), Concept::new(ConceptId(999)));

        store
            .join_relationships(&mut concepts, &criteria, &Timer::new("test"), true)
            .expect("join");

        let hydrated = concepts.get(&ConceptId(64_572_001)).expect("present");
        assert_eq!(hydrated.relationships.len(), 1);
        let unknown = concepts.get(&ConceptId(999)).expect("present");
        assert!(unknown.relationships.is_empty());
    }
}
