//! # exprctx
//!
//! Command line front end for `exprctx-core`.
//!
//! Loads a terminology fixture into the in-memory store, builds an
//! `ExpressionContext` for one branch and prints what it resolves.

pub mod cli;
pub mod config;
pub mod logging;

use exprctx_core::{ExpressionError, ServiceError};
use thiserror::Error;

/// Errors surfaced by the binary.
#[derive(Debug, Error)]
pub enum CliError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),

    /// The configuration file is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Output could not be rendered as JSON.
    #[error("JSON error: {0}")]
    Json(String),

    /// A command needs `--fixture`.
    #[error("No terminology fixture given; pass --fixture <FILE>")]
    MissingFixture,

    #[error(transparent)]
    Expression(#[from] ExpressionError),

    #[error(transparent)]
    Service(#[from] ServiceError),
}
