//! # MRCM Module
//!
//! Machine Readable Concept Model types and the schema collaborator.
//!
//! Only the attribute-domain rules are modelled: they carry the "grouped" flag
//! the expression context derives its ungrouped-attribute set from.

use crate::{BranchCriteria, ConceptId, ServiceError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Strength of an MRCM rule.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RuleStrength {
    /// The rule must be satisfied.
    #[default]
    Mandatory,
    /// The rule may be relaxed.
    Optional,
}

/// Content type an MRCM rule applies to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    /// All content.
    #[default]
    All,
    /// Pre-coordinated content only.
    Precoordinated,
    /// New pre-coordinated content only.
    NewPrecoordinated,
    /// Post-coordinated content only.
    Postcoordinated,
}

/// An MRCM attribute-domain rule: attribute `attribute_id` may be used on
/// concepts in domain `domain_id`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AttributeDomain {
    /// Reference set member identifier.
    pub id: String,
    /// The attribute concept.
    pub attribute_id: ConceptId,
    /// The domain concept.
    pub domain_id: ConceptId,
    /// Whether the attribute must appear inside a relationship group.
    pub grouped: bool,
    /// Cardinality of the attribute on a concept, e.g. `0..*`.
    #[serde(default = "default_cardinality")]
    pub attribute_cardinality: String,
    /// Cardinality of the attribute within one group, e.g. `0..1`.
    #[serde(default = "default_cardinality")]
    pub attribute_in_group_cardinality: String,
    #[serde(default)]
    pub content_type: ContentType,
    #[serde(default)]
    pub rule_strength: RuleStrength,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_cardinality() -> String {
    "0..*".to_string()
}

fn default_active() -> bool {
    true
}

/// The MRCM visible from a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mrcm {
    /// Attribute-domain rules.
    #[serde(default)]
    pub attribute_domains: Vec<AttributeDomain>,
}

impl Mrcm {
    /// Create an MRCM from its attribute-domain rules.
    #[must_use]
    pub fn new(attribute_domains: Vec<AttributeDomain>) -> Self {
        Self { attribute_domains }
    }

    /// Rules that do not require a relationship group.
    #[must_use]
    pub fn ungrouped_attribute_domains(&self) -> BTreeSet<AttributeDomain> {
        self.attribute_domains
            .iter()
            .filter(|domain| !domain.grouped)
            .cloned()
            .collect()
    }

    /// Rules for one attribute, across all domains.
    pub fn domains_for_attribute(
        &self,
        attribute_id: ConceptId,
    ) -> impl Iterator<Item = &AttributeDomain> {
        self.attribute_domains
            .iter()
            .filter(move |domain| domain.attribute_id == attribute_id)
    }

    /// Attributes permitted in one domain.
    #[must_use]
    pub fn attributes_in_domain(&self, domain_id: ConceptId) -> BTreeSet<ConceptId> {
        self.attribute_domains
            .iter()
            .filter(|domain| domain.domain_id == domain_id)
            .map(|domain| domain.attribute_id)
            .collect()
    }
}

/// Schema collaborator.
///
/// Implementations are branch-aware and may cache internally; the expression
/// context adds its own operation-scoped cache on top.
pub trait MrcmService: Send + Sync {
    /// The active MRCM visible from `criteria`.
    ///
    /// Returns `ServiceError::MrcmNotFound` if no MRCM is visible.
    fn load_active_mrcm(&self, criteria: &BranchCriteria) -> Result<Arc<Mrcm>, ServiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(id: &str, attribute: u64, domain: u64, grouped: bool) -> AttributeDomain {
        AttributeDomain {
            id: id.to_string(),
            attribute_id: ConceptId(attribute),
            domain_id: ConceptId(domain),
            grouped,
            attribute_cardinality: default_cardinality(),
            attribute_in_group_cardinality: "0..1".to_string(),
            content_type: ContentType::All,
            rule_strength: RuleStrength::Mandatory,
            active: true,
        }
    }

    #[test]
    fn ungrouped_filter_drops_grouped_rules() {
        let mrcm = Mrcm::new(vec![
            rule("a", 363_698_007, 404_684_003, true),
            rule("b", 272_741_003, 91_723_000, false),
            rule("c", 116_676_008, 404_684_003, true),
        ]);

        let ungrouped = mrcm.ungrouped_attribute_domains();
        assert_eq!(ungrouped.len(), 1);
        assert!(ungrouped.iter().all(|d| !d.grouped));
        assert_eq!(
            ungrouped.iter().next().map(|d| d.attribute_id),
            Some(ConceptId(272_741_003))
        );
    }

    #[test]
    fn lookup_by_attribute_and_domain() {
        let mrcm = Mrcm::new(vec![
            rule("a", 363_698_007, 404_684_003, true),
            rule("b", 363_698_007, 71_388_002, true),
            rule("c", 116_676_008, 404_684_003, true),
        ]);

        assert_eq!(mrcm.domains_for_attribute(ConceptId(363_698_007)).count(), 2);
        let in_finding = mrcm.attributes_in_domain(ConceptId(404_684_003));
        assert!(in_finding.contains(&ConceptId(363_698_007)));
        assert!(in_finding.contains(&ConceptId(116_676_008)));
    }

    #[test]
    fn attribute_domain_defaults_from_json() {
        let json = r#"{"id":"x","attribute_id":246075003,"domain_id":71388002,"grouped":false}"#;
        let domain: AttributeDomain = serde_json::from_str(json).expect("parse");
        assert_eq!(domain.attribute_cardinality, "0..*");
        assert!(domain.active);
        assert_eq!(domain.rule_strength, RuleStrength::Mandatory);
    }
}
