//! # exprctx CLI Module
//!
//! This module implements the CLI interface for exprctx.
//!
//! ## Available Commands
//!
//! - `criteria` - Show working-branch and MRCM-branch criteria
//! - `mrcm` - Show the active MRCM's attribute domains
//! - `ecl` - Evaluate an expression constraint on the MRCM branch
//! - `ancestors` - Show a concept and its ancestors
//! - `focus` - Hydrate a focus concept and its ancestors

mod commands;

use crate::CliError;
use crate::config::AppConfig;
use clap::{Parser, Subcommand};
use exprctx_core::{ConceptId, DisplayTermsRequired, ExpressionConfig};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// exprctx - expression resolution context
///
/// Resolves the branch snapshot, MRCM and focus concept data a
/// post-coordinated expression is validated against.
#[derive(Parser, Debug)]
#[command(name = "exprctx")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Terminology fixture (JSON)
    #[arg(short = 'F', long, global = true)]
    pub fixture: Option<PathBuf>,

    /// Working branch path
    #[arg(short, long, global = true, default_value = "MAIN")]
    pub branch: String,

    /// Configuration file (defaults to ./exprctx.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Read the MRCM from the parent branch at the working branch's base
    #[arg(long, global = true)]
    pub dependant_release: bool,

    /// Maximum post-coordination level
    #[arg(long, global = true)]
    pub max_level: Option<u32>,

    /// Display terms policy (none, fsn, pt, fsn_and_pt)
    #[arg(long, global = true)]
    pub display_terms: Option<String>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show working-branch and MRCM-branch criteria
    Criteria,

    /// Show the active MRCM
    Mrcm {
        /// Only attribute domains that may appear outside a group
        #[arg(short, long)]
        ungrouped: bool,
    },

    /// Evaluate an ECL expression on the MRCM branch
    Ecl {
        /// Expression constraint, e.g. "<< 404684003"
        expression: String,
    },

    /// Show a concept and its ancestors on the MRCM branch
    Ancestors {
        /// Concept identifier
        concept: String,
    },

    /// Hydrate a focus concept with its active relationships
    Focus {
        /// Concept identifier
        concept: String,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Merge file configuration with command line overrides.
pub fn expression_config(cli: &Cli, config: &AppConfig) -> Result<ExpressionConfig, CliError> {
    let mut expression = config.expression.clone();
    if cli.dependant_release {
        expression.use_dependant_release_branch_for_mrcm = true;
    }
    if let Some(level) = cli.max_level {
        expression.maximum_postcoordination_level = level;
    }
    if let Some(policy) = &cli.display_terms {
        expression.display_terms_required = policy.parse::<DisplayTermsRequired>()?;
    }
    Ok(expression)
}

/// Execute the CLI with parsed arguments and return the rendered output.
pub fn execute(cli: &Cli, config: &AppConfig) -> Result<String, CliError> {
    let fixture = cli.fixture.as_deref().ok_or(CliError::MissingFixture)?;
    let store = load_store(fixture)?;
    let mut context = build_context(store, &cli.branch, expression_config(cli, config)?)?;
    let json_mode = cli.json_mode;

    let output = match &cli.command {
        Some(Commands::Criteria) | None => cmd_criteria(&mut context, json_mode),
        Some(Commands::Mrcm { ungrouped }) => cmd_mrcm(&mut context, *ungrouped, json_mode),
        Some(Commands::Ecl { expression }) => cmd_ecl(&mut context, expression, json_mode),
        Some(Commands::Ancestors { concept }) => {
            cmd_ancestors(&mut context, concept.parse::<ConceptId>()?, json_mode)
        }
        Some(Commands::Focus { concept }) => {
            cmd_focus(&mut context, concept.parse::<ConceptId>()?, json_mode)
        }
    };
    context.timer().finish();
    output
}
