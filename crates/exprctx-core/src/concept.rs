//! # Concept Module
//!
//! Concepts, relationships and the hydration collaborator.

use crate::primitives::IS_A;
use crate::{BranchCriteria, ConceptId, ServiceError, Timer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which form of the concept definition a relationship belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CharacteristicType {
    /// Computed by the classifier.
    #[default]
    Inferred,
    /// Authored.
    Stated,
    /// Non-defining, additional.
    Additional,
}

/// A relationship from `source_id` to `destination_id` of type `type_id`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Relationship {
    pub id: u64,
    pub source_id: ConceptId,
    pub type_id: ConceptId,
    pub destination_id: ConceptId,
    /// Relationship group; 0 means ungrouped.
    #[serde(default)]
    pub relationship_group: u32,
    #[serde(default)]
    pub characteristic_type: CharacteristicType,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Relationship {
    /// Whether this is an `|Is a|` relationship.
    #[must_use]
    pub fn is_a(&self) -> bool {
        self.type_id == ConceptId(IS_A)
    }
}

/// A concept, optionally with its relationships attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concept {
    pub concept_id: ConceptId,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl Concept {
    /// A placeholder for `concept_id` with no relationships, to be hydrated.
    #[must_use]
    pub fn new(concept_id: ConceptId) -> Self {
        Self {
            concept_id,
            active: true,
            relationships: Vec::new(),
        }
    }

    /// Active relationships.
    pub fn active_relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.relationships.iter().filter(|r| r.active)
    }

    /// Destinations of active inferred `|Is a|` relationships.
    pub fn parents(&self) -> impl Iterator<Item = ConceptId> + '_ {
        self.active_relationships()
            .filter(|r| r.is_a() && r.characteristic_type == CharacteristicType::Inferred)
            .map(|r| r.destination_id)
    }

    /// Active non-`|Is a|` relationships, grouped by relationship group.
    #[must_use]
    pub fn attribute_groups(&self) -> BTreeMap<u32, Vec<&Relationship>> {
        let mut groups: BTreeMap<u32, Vec<&Relationship>> = BTreeMap::new();
        for relationship in self.active_relationships().filter(|r| !r.is_a()) {
            groups
                .entry(relationship.relationship_group)
                .or_default()
                .push(relationship);
        }
        groups
    }
}

/// Concept and relationship collaborator.
pub trait ConceptService: Send + Sync {
    /// Attach relationships to every concept in `concepts`, in place, as seen
    /// from `criteria`. With `active_only`, inactive relationships are skipped.
    fn join_relationships(
        &self,
        concepts: &mut BTreeMap<ConceptId, Concept>,
        criteria: &BranchCriteria,
        timer: &Timer,
        active_only: bool,
    ) -> Result<(), ServiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rel(id: u64, type_id: u64, destination: u64, group: u32, active: bool) -> Relationship {
        Relationship {
            id,
            source_id: ConceptId(73_211_009),
            type_id: ConceptId(type_id),
            destination_id: ConceptId(destination),
            relationship_group: group,
            characteristic_type: CharacteristicType::Inferred,
            active,
        }
    }

    #[test]
    fn parents_follow_active_is_a() {
        let mut concept = Concept::new(ConceptId(73_211_009));
        concept.relationships = vec![
            rel(1, IS_A, 126_877_002, 0, true),
            rel(2, IS_A, 362_969_004, 0, false),
            rel(3, 363_698_007, 113_331_007, 1, true),
        ];

        let parents: Vec<_> = concept.parents().collect();
        assert_eq!(parents, vec![ConceptId(126_877_002)]);
    }

    #[test]
    fn attribute_groups_exclude_is_a() {
        let mut concept = Concept::new(ConceptId(73_211_009));
        concept.relationships = vec![
            rel(1, IS_A, 126_877_002, 0, true),
            rel(3, 363_698_007, 113_331_007, 1, true),
            rel(4, 116_676_008, 49_755_003, 1, true),
            rel(5, 246_075_003, 41_146_007, 0, true),
        ];

        let groups = concept.attribute_groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups.get(&1).map(Vec::len), Some(2));
        assert_eq!(groups.get(&0).map(Vec::len), Some(1));
    }
}
