//! # exprctx - Expression Context CLI
//!
//! The main binary for the expression resolution context.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  apps/exprctx (THE BINARY)               │
//! │                                                          │
//! │  ┌─────────────┐   ┌──────────────┐   ┌──────────────┐   │
//! │  │   CLI       │   │ Config (TOML)│   │   Logging    │   │
//! │  │  (clap)     │   │              │   │  (tracing)   │   │
//! │  └──────┬──────┘   └──────┬───────┘   └──────┬───────┘   │
//! │         └─────────────────┼──────────────────┘           │
//! │                           ▼                              │
//! │                   ┌───────────────┐                      │
//! │                   │ exprctx-core  │                      │
//! │                   │ (THE LOGIC)   │                      │
//! │                   └───────────────┘                      │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! exprctx -F terminology.json -b MAIN/PROJECT criteria
//! exprctx -F terminology.json -b MAIN/PROJECT --dependant-release mrcm --ungrouped
//! exprctx -F terminology.json -b MAIN/PROJECT ecl "<< 404684003"
//! exprctx -F terminology.json -b MAIN/PROJECT focus 73211009
//! ```

use clap::Parser;
use exprctx::cli::{self, Cli};
use exprctx::config::AppConfig;
use exprctx::logging;

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = Cli::parse();

    // EXPRCTX_LOG_FORMAT=json enables machine-parseable output.
    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => {
            config.with_env_log_format(std::env::var("EXPRCTX_LOG_FORMAT").ok().as_deref())
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    logging::init(&config.logging, cli.verbose);

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    match cli::execute(&cli, &config) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            tracing::error!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Print the startup banner to stderr.
fn print_banner() {
    eprintln!(
        r#"
  exprctx v{}
  branch - MRCM - focus concept
"#,
        env!("CARGO_PKG_VERSION")
    );
}
