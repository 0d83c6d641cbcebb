//! CLI module for catalog-attrs
//!
//! Provides command-line interface for:
//! - validate-definition: Check one attribute definition
//! - normalize: Resolve and validate attribute values against a catalog
//! - check-product: Run the full product pipeline

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{check_product, normalize, run, run_command, validate_definition};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{error_response, ok_response, read_request, write_error, write_response};
