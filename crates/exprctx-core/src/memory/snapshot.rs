//! Layered snapshot views over the in-memory branch timeline.
//!
//! A snapshot of `(path, t)` is the branch's versions at or before `t`, newest
//! first, layered over its parent's snapshot at `min(t, base)`, up to the root.
//! The nearest layer that defines a concept or an MRCM wins.

use crate::concept::CharacteristicType;
use crate::{Concept, ConceptId, Mrcm};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::ContentVersion;

/// Content visible from one set of branch criteria. Nearest layer first.
#[derive(Debug)]
pub(crate) struct Snapshot<'a> {
    pub(crate) layers: Vec<&'a ContentVersion>,
}

impl<'a> Snapshot<'a> {
    pub(crate) fn concept(&self, id: ConceptId) -> Option<&'a Concept> {
        self.layers.iter().find_map(|layer| layer.concepts.get(&id))
    }

    pub(crate) fn mrcm(&self) -> Option<&'a Arc<Mrcm>> {
        self.layers.iter().find_map(|layer| layer.mrcm.as_ref())
    }

    /// Every visible concept, nearer layers overriding farther ones.
    pub(crate) fn concepts(&self) -> BTreeMap<ConceptId, &'a Concept> {
        let mut merged = BTreeMap::new();
        for layer in self.layers.iter().rev() {
            for (id, concept) in &layer.concepts {
                merged.insert(*id, concept);
            }
        }
        merged
    }

    pub(crate) fn hierarchy(&self, stated: bool) -> Hierarchy {
        let form = if stated {
            CharacteristicType::Stated
        } else {
            CharacteristicType::Inferred
        };
        let mut hierarchy = Hierarchy::default();
        for (id, concept) in self.concepts() {
            if !concept.active {
                continue;
            }
            hierarchy.concepts.insert(id);
            for rel in concept
                .active_relationships()
                .filter(|r| r.is_a() && r.characteristic_type == form)
            {
                hierarchy
                    .parents
                    .entry(id)
                    .or_default()
                    .insert(rel.destination_id);
                hierarchy
                    .children
                    .entry(rel.destination_id)
                    .or_default()
                    .insert(id);
            }
        }
        hierarchy
    }
}

/// `|Is a|` graph of the active concepts in a snapshot.
#[derive(Debug, Default)]
pub(crate) struct Hierarchy {
    pub(crate) concepts: BTreeSet<ConceptId>,
    pub(crate) parents: BTreeMap<ConceptId, BTreeSet<ConceptId>>,
    pub(crate) children: BTreeMap<ConceptId, BTreeSet<ConceptId>>,
}

impl Hierarchy {
    pub(crate) fn contains(&self, id: ConceptId) -> bool {
        self.concepts.contains(&id)
    }

    pub(crate) fn direct(&self, id: ConceptId, upwards: bool) -> BTreeSet<ConceptId> {
        let edges = if upwards { &self.parents } else { &self.children };
        edges
            .get(&id)
            .map(|next| {
                next.iter()
                    .copied()
                    .filter(|c| self.contains(*c))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Transitive closure from `id`, excluding `id`. Cycles are tolerated.
    pub(crate) fn closure(&self, id: ConceptId, upwards: bool) -> BTreeSet<ConceptId> {
        let mut seen = BTreeSet::new();
        let mut pending: Vec<ConceptId> = self.direct(id, upwards).into_iter().collect();
        while let Some(next) = pending.pop() {
            if next != id && seen.insert(next) {
                pending.extend(self.direct(next, upwards));
            }
        }
        seen
    }
}
