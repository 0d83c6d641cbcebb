//! CLI command implementations
//!
//! Each command reads one JSON request from stdin and writes one JSON
//! response to stdout. A rejected definition or product is a normal
//! outcome and is reported as an error response, not as a CLI failure.

use std::fs;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::attribute::{validate_definition as check_definition, AttributeValueInput, DefinitionErrors};
use crate::category::{CategoryRuleBook, CategoryViolations};
use crate::config::CatalogConfig;
use crate::pipeline::{InMemoryCatalog, PipelineError, ProductAttributePipeline, ProductAttributeRequest};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{read_request, write_error, write_response};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::ValidateDefinition => validate_definition(),
        Command::Normalize { catalog } => normalize(&catalog),
        Command::CheckProduct { catalog, config } => check_product(&catalog, config.as_deref()),
    }
}

/// Validate one attribute definition
///
/// Responds with the definition in wire form, or with every issue found.
pub fn validate_definition() -> CliResult<()> {
    let request = read_request()?;
    match check_definition(&request) {
        Ok(definition) => write_response(definition.to_json()),
        Err(errors) => write_error(
            "ATTR_DEFINITION_SHAPE",
            &errors.to_string(),
            Some(issues_json(&errors)),
        ),
    }
}

/// Normalize a JSON array of attribute values against a catalog snapshot
pub fn normalize(catalog_path: &Path) -> CliResult<()> {
    let catalog = load_catalog(catalog_path)?;
    let inputs: Vec<AttributeValueInput> = serde_json::from_value(read_request()?)?;

    let pipeline = ProductAttributePipeline::new(Arc::new(catalog), Arc::new(CategoryRuleBook::empty()));
    match block_on(pipeline.normalize(&inputs))? {
        Ok(normalized) => write_response(serde_json::to_value(normalized)?),
        Err(e) => write_pipeline_error(&e),
    }
}

/// Validate a product with its variants
pub fn check_product(catalog_path: &Path, config_path: Option<&Path>) -> CliResult<()> {
    let config = match config_path {
        Some(path) => CatalogConfig::load(path)?,
        None => CatalogConfig::default(),
    };
    let catalog = load_catalog(catalog_path)?;
    let request: ProductAttributeRequest = serde_json::from_value(read_request()?)?;

    let pipeline = ProductAttributePipeline::new(Arc::new(catalog), Arc::new(config.rule_book()));
    match block_on(pipeline.process(&request))? {
        Ok(product) => write_response(serde_json::to_value(product)?),
        Err(e) => write_pipeline_error(&e),
    }
}

fn load_catalog(path: &Path) -> CliResult<InMemoryCatalog> {
    let content = fs::read_to_string(path).map_err(|e| {
        CliError::catalog_error(format!("Failed to read catalog {}: {}", path.display(), e))
    })?;
    Ok(InMemoryCatalog::from_json(&content)?)
}

fn block_on<F: Future>(future: F) -> CliResult<F::Output> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::runtime_error(format!("Failed to create tokio runtime: {}", e)))?;
    Ok(rt.block_on(future))
}

fn write_pipeline_error(e: &PipelineError) -> CliResult<()> {
    tracing::debug!(code = e.code(), status = e.status_code(), "PRODUCT_REJECTED");
    write_error(e.code(), &e.to_string(), pipeline_error_details(e))
}

fn issues_json(errors: &DefinitionErrors) -> Value {
    errors
        .issues()
        .iter()
        .map(|issue| {
            json!({
                "field": issue.field,
                "code": issue.code.code(),
                "message": issue.message,
            })
        })
        .collect()
}

fn violations_json(violations: &CategoryViolations) -> Value {
    violations
        .violations
        .iter()
        .map(|v| json!({ "code": v.code(), "message": v.to_string() }))
        .collect()
}

fn pipeline_error_details(e: &PipelineError) -> Option<Value> {
    let details = match e {
        PipelineError::Category(violations) => json!({
            "category": violations.category,
            "violations": violations_json(violations),
        }),
        PipelineError::StoredDefinitionInvalid { slug, errors } => json!({
            "slug": slug,
            "issues": issues_json(errors),
        }),
        _ => return Some(json!({ "statusCode": e.status_code() })),
    };
    Some(details)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeError;
    use crate::category::CategoryViolation;

    #[test]
    fn test_category_details_list_violations() {
        let err = PipelineError::Category(CategoryViolations::new(
            "footwear",
            vec![
                CategoryViolation::MissingRequiredAttribute {
                    attribute_slug: "material".into(),
                },
                CategoryViolation::MissingRequiredAttribute {
                    attribute_slug: "primary_use".into(),
                },
            ],
        ));
        let details = pipeline_error_details(&err).unwrap();
        assert_eq!(details["category"], "footwear");
        assert_eq!(details["violations"].as_array().unwrap().len(), 2);
        assert_eq!(
            details["violations"][0]["code"],
            "CATEGORY_MISSING_REQUIRED_ATTRIBUTE"
        );
    }

    #[test]
    fn test_other_details_carry_status() {
        let err = PipelineError::Attribute(AttributeError::MissingReference);
        assert_eq!(
            pipeline_error_details(&err).unwrap()["statusCode"],
            400
        );
    }

    #[test]
    fn test_issues_json() {
        let errors = check_definition(&json!({ "slug": "Bad Slug", "name": "", "kind": "string" }))
            .unwrap_err();
        let issues = issues_json(&errors);
        let fields: Vec<_> = issues
            .as_array()
            .unwrap()
            .iter()
            .map(|i| i["field"].as_str().unwrap().to_string())
            .collect();
        assert!(fields.contains(&"slug".to_string()));
        assert!(fields.contains(&"name".to_string()));
    }

    #[test]
    fn test_missing_catalog_file() {
        let err = load_catalog(Path::new("/nonexistent/catalog.json")).unwrap_err();
        assert_eq!(err.code_str(), "CLI_CATALOG_ERROR");
    }
}
