//! # Primitives
//!
//! Hardcoded runtime constants for the expression context.
//!
//! These values are compiled into the binary and are immutable at runtime.

/// Name of the version-control root branch.
///
/// A root branch has no parent, so no dependant release branch exists for it.
pub const ROOT_BRANCH: &str = "MAIN";

/// Separator between branch path segments.
pub const PATH_SEPARATOR: char = '/';

/// Maximum number of concept identifiers returned by a single ECL evaluation.
///
/// This is a hard cap, not a paging contract. Larger result sets are truncated.
pub const ECL_RESULT_LIMIT: usize = 1000;

/// Maximum number of identifiers returned by an ancestors-and-self query.
///
/// Ancestor chains in the terminology are short; deeper chains are truncated.
pub const ANCESTOR_RESULT_LIMIT: usize = 100;

/// Concept identifier of the `116680003 |Is a|` relationship type.
pub const IS_A: u64 = 116_680_003;

/// Default ceiling on post-coordination nesting depth.
pub const DEFAULT_MAXIMUM_POSTCOORDINATION_LEVEL: u32 = 2;

/// Maximum accepted size of a terminology fixture file.
///
/// Validated before deserialization begins.
pub const MAX_FIXTURE_SIZE: usize = 64 * 1024 * 1024; // 64 MB
