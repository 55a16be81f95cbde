//! Hierarchy-only ECL evaluation for the in-memory store.
//!
//! Supported: `*`, `id`, `< id`, `<< id`, `<! id`, `> id`, `>> id`, `>! id`,
//! each with an optional `|term|`. Refinements, set operators and member-of
//! are rejected with `ServiceError::Query`.

use super::snapshot::Hierarchy;
use crate::{ConceptId, ServiceError};
use std::collections::BTreeSet;

/// A single parsed constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EclConstraint {
    /// `*`
    Any,
    /// `id`
    Concept(ConceptId),
    /// `< id`
    DescendantOf(ConceptId),
    /// `<< id`
    DescendantOrSelfOf(ConceptId),
    /// `<! id`
    ChildOf(ConceptId),
    /// `> id`
    AncestorOf(ConceptId),
    /// `>> id`
    AncestorOrSelfOf(ConceptId),
    /// `>! id`
    ParentOf(ConceptId),
}

impl EclConstraint {
    /// Parse one constraint.
    pub fn parse(ecl: &str) -> Result<Self, ServiceError> {
        let text = strip_term(ecl.trim())?;
        if text == "*" {
            return Ok(Self::Any);
        }

        // Longest operators first.
        let operators: [(&str, fn(ConceptId) -> Self); 6] = [
            ("<<", Self::DescendantOrSelfOf),
            ("<!", Self::ChildOf),
            ("<", Self::DescendantOf),
            (">>", Self::AncestorOrSelfOf),
            (">!", Self::ParentOf),
            (">", Self::AncestorOf),
        ];
        for (operator, build) in operators {
            if let Some(rest) = text.strip_prefix(operator) {
                return parse_focus(rest, ecl).map(build);
            }
        }
        parse_focus(text, ecl).map(Self::Concept)
    }

    /// Matching active concepts in `hierarchy`.
    pub(crate) fn evaluate(&self, hierarchy: &Hierarchy) -> BTreeSet<ConceptId> {
        let with_self = |id: ConceptId, mut set: BTreeSet<ConceptId>| {
            if hierarchy.contains(id) {
                set.insert(id);
            }
            set
        };
        match *self {
            Self::Any => hierarchy.concepts.clone(),
            Self::Concept(id) => with_self(id, BTreeSet::new()),
            Self::DescendantOf(id) => hierarchy.closure(id, false),
            Self::DescendantOrSelfOf(id) => with_self(id, hierarchy.closure(id, false)),
            Self::ChildOf(id) => hierarchy.direct(id, false),
            Self::AncestorOf(id) => hierarchy.closure(id, true),
            Self::AncestorOrSelfOf(id) => with_self(id, hierarchy.closure(id, true)),
            Self::ParentOf(id) => hierarchy.direct(id, true),
        }
    }
}

fn strip_term(text: &str) -> Result<&str, ServiceError> {
    match text.find('|') {
        None => Ok(text),
        Some(start) => {
            let closed = text[start + 1..].find('|').map(|end| start + 1 + end);
            match closed {
                Some(end) if text[end + 1..].trim().is_empty() => Ok(text[..start].trim_end()),
                _ => Err(ServiceError::Query(format!("Malformed term in {text:?}"))),
            }
        }
    }
}

fn parse_focus(text: &str, ecl: &str) -> Result<ConceptId, ServiceError> {
    let text = text.trim();
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ServiceError::Query(format!(
            "Unsupported expression constraint: {ecl:?}"
        )));
    }
    text.parse::<u64>()
        .map(ConceptId)
        .map_err(|e| ServiceError::Query(format!("Invalid concept id in {ecl:?}: {e}")))
}
