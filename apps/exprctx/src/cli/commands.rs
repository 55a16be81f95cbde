//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands. Each
//! command renders its result as text or, in JSON mode, as a JSON document.

use crate::CliError;
use exprctx_core::memory::MemoryTerminology;
use exprctx_core::primitives::MAX_FIXTURE_SIZE;
use exprctx_core::{
    AttributeDomain, BranchCriteria, BranchPath, Collaborators, ConceptId, ExpressionConfig,
    ExpressionContext, Timer, fixture_from_bytes,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// =============================================================================
// INPUT VALIDATION
// =============================================================================

/// Canonicalize a path and ensure it is a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, CliError> {
    let canonical = path.canonicalize().map_err(|e| {
        CliError::Io(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(CliError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), CliError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| CliError::Io(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(CliError::Io(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

// =============================================================================
// SETUP
// =============================================================================

/// Load a terminology fixture into the in-memory store.
pub fn load_store(path: &Path) -> Result<Arc<MemoryTerminology>, CliError> {
    let path = validate_file_path(path)?;
    validate_file_size(&path, MAX_FIXTURE_SIZE as u64)?;

    let bytes = std::fs::read(&path)
        .map_err(|e| CliError::Io(format!("Cannot read '{}': {}", path.display(), e)))?;
    let fixture = fixture_from_bytes(&bytes)?;
    let store = MemoryTerminology::from_fixture(fixture)?;
    tracing::info!(
        fixture = %path.display(),
        branches = store.branch_paths().count(),
        "terminology loaded"
    );
    Ok(Arc::new(store))
}

/// Build an expression context for `branch` over `store`.
pub fn build_context(
    store: Arc<MemoryTerminology>,
    branch: &str,
    config: ExpressionConfig,
) -> Result<ExpressionContext, CliError> {
    let branch = BranchPath::new(branch)?;
    Ok(
        ExpressionContext::builder(branch, Collaborators::from_shared(store))
            .config(config)
            .timer(Timer::new("exprctx"))
            .build(),
    )
}

// =============================================================================
// RENDERING
// =============================================================================

fn render_json(value: &serde_json::Value) -> Result<String, CliError> {
    serde_json::to_string_pretty(value).map_err(|e| CliError::Json(e.to_string()))
}

fn describe_criteria(criteria: &BranchCriteria) -> String {
    format!(
        "{} @ {}{}",
        criteria.branch_path(),
        criteria.timepoint().to_rfc3339(),
        if criteria.is_pinned() { " (pinned)" } else { "" }
    )
}

fn describe_domain(domain: &AttributeDomain) -> String {
    format!(
        "{:<20} attribute {:<12} domain {:<12} {:<9} card {} / in group {}",
        domain.id,
        domain.attribute_id,
        domain.domain_id,
        if domain.grouped { "grouped" } else { "ungrouped" },
        domain.attribute_cardinality,
        domain.attribute_in_group_cardinality
    )
}

fn join_ids<'a>(ids: impl IntoIterator<Item = &'a ConceptId>) -> String {
    ids.into_iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// COMMANDS
// =============================================================================

/// Working-branch and MRCM-branch criteria, plus the operation settings.
pub fn cmd_criteria(ctx: &mut ExpressionContext, json_mode: bool) -> Result<String, CliError> {
    let branch_criteria = ctx.branch_criteria()?;
    let mrcm_criteria = ctx.mrcm_branch_criteria()?;

    if json_mode {
        return render_json(&json!({
            "branch": ctx.branch(),
            "branch_criteria": *branch_criteria,
            "mrcm_branch_criteria": *mrcm_criteria,
            "use_dependant_release_branch_for_mrcm": ctx.uses_dependant_release_branch_for_mrcm(),
            "maximum_postcoordination_level": ctx.maximum_postcoordination_level(),
            "display_terms_required": ctx.display_terms_required(),
        }));
    }

    Ok(format!(
        "Branch:          {}\n\
         Branch criteria: {}\n\
         MRCM criteria:   {}\n\
         Max level:       {}\n\
         Display terms:   {}",
        ctx.branch(),
        describe_criteria(&branch_criteria),
        describe_criteria(&mrcm_criteria),
        ctx.maximum_postcoordination_level(),
        ctx.display_terms_required()
    ))
}

/// Attribute domains of the active MRCM.
pub fn cmd_mrcm(
    ctx: &mut ExpressionContext,
    ungrouped: bool,
    json_mode: bool,
) -> Result<String, CliError> {
    let domains: Vec<AttributeDomain> = if ungrouped {
        ctx.mrcm_ungrouped_attributes()?.iter().cloned().collect()
    } else {
        ctx.branch_mrcm()?.attribute_domains.clone()
    };

    if json_mode {
        return render_json(&json!({
            "branch": ctx.branch(),
            "ungrouped_only": ungrouped,
            "attribute_domains": domains,
        }));
    }

    let mut out = format!("MRCM attribute domains ({}):", domains.len());
    for domain in &domains {
        out.push_str("\n  ");
        out.push_str(&describe_domain(domain));
    }
    Ok(out)
}

/// Concept ids matching an expression constraint.
pub fn cmd_ecl(
    ctx: &mut ExpressionContext,
    expression: &str,
    json_mode: bool,
) -> Result<String, CliError> {
    let ids = ctx.ecl(expression)?;

    if json_mode {
        return render_json(&json!({
            "ecl": expression,
            "count": ids.len(),
            "concepts": ids,
        }));
    }
    Ok(format!("{} concept(s): {}", ids.len(), join_ids(&ids)))
}

/// A concept and its ancestors.
pub fn cmd_ancestors(
    ctx: &mut ExpressionContext,
    concept: ConceptId,
    json_mode: bool,
) -> Result<String, CliError> {
    let ids = ctx.ancestors_and_self(concept)?;

    if json_mode {
        return render_json(&json!({
            "concept": concept,
            "ancestors_and_self": ids,
        }));
    }
    Ok(format!("Ancestors and self of {}: {}", concept, join_ids(&ids)))
}

/// Hydrated focus concept and its ancestors.
pub fn cmd_focus(
    ctx: &mut ExpressionContext,
    concept: ConceptId,
    json_mode: bool,
) -> Result<String, CliError> {
    ctx.reset(Timer::new(format!("focus {concept}")));
    ctx.set_focus_concept_id(concept);
    let focus = ctx.focus_concept_with_active_relationships()?;
    let ancestors = ctx.ancestors_and_self_of_focus_concept()?;

    if json_mode {
        return render_json(&json!({
            "concept": *focus,
            "ancestors_and_self": *ancestors,
        }));
    }

    let mut out = format!(
        "Focus concept {} ({})",
        focus.concept_id,
        if focus.active { "active" } else { "inactive" }
    );
    out.push_str(&format!("\n  Parents: {}", join_ids(&focus.parents().collect::<Vec<_>>())));
    for (group, relationships) in focus.attribute_groups() {
        for rel in relationships {
            out.push_str(&format!(
                "\n  [{}] {} = {}",
                group, rel.type_id, rel.destination_id
            ));
        }
    }
    out.push_str(&format!("\n  Ancestors and self: {}", join_ids(ancestors.iter())));
    Ok(out)
}
