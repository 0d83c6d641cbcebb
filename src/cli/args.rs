//! CLI argument definitions using clap
//!
//! Commands:
//! - catalog-attrs validate-definition
//! - catalog-attrs normalize --catalog <path>
//! - catalog-attrs check-product --catalog <path> [--config <path>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// catalog-attrs - dynamic catalog attribute validation
#[derive(Parser, Debug)]
#[command(name = "catalog-attrs")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate one attribute definition read from stdin
    ValidateDefinition,

    /// Normalize a list of attribute values read from stdin
    Normalize {
        /// Path to the catalog snapshot (definitions and category attachments)
        #[arg(long)]
        catalog: PathBuf,
    },

    /// Validate a product with its variants read from stdin
    CheckProduct {
        /// Path to the catalog snapshot (definitions and category attachments)
        #[arg(long)]
        catalog: PathBuf,

        /// Path to the category rule configuration (built-in rules when absent)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
