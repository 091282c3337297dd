use crate::OutputFormat;
use anyhow::{Context, Result};
use formfill_core::{FormDescriptor, InterpretationResult};
use formfill_interpreter::FieldInterpreter;
use std::path::Path;

/// Read a form description and map its fields with the pattern table
///
/// Accepts either a `{"fields": [...]}` object or a bare list of fields.
pub fn interpret_file(file: &Path) -> Result<InterpretationResult> {
    tracing::debug!("Reading form description: {}", file.display());

    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let form = FormDescriptor::from_json(&content)
        .with_context(|| format!("Failed to load form description from {}", file.display()))?;

    Ok(FieldInterpreter::new().interpret_form(&form))
}

pub fn execute(file: &Path, format: OutputFormat) -> Result<()> {
    tracing::info!("Interpreting form fields from {}", file.display());

    let result = interpret_file(file)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Pretty => output_pretty(&result),
    }

    Ok(())
}

fn output_pretty(result: &InterpretationResult) {
    use console::style;

    println!("\n{}", style("Form Interpretation").bold().cyan());
    println!("{}", style("===================").cyan());

    if result.mappings.is_empty() {
        println!("\n{}", style("No fields matched a profile category").yellow());
        return;
    }

    println!();
    for mapping in &result.mappings {
        println!(
            "  {:<24} → {:<16} {}",
            mapping.field_name,
            style(&mapping.user_field).green().bold(),
            style(format!("{:.2}", mapping.confidence)).dim()
        );
    }

    println!(
        "\n  {} field(s) mapped, overall confidence {}",
        result.mappings.len(),
        style(format!("{:.2}", result.confidence)).bold()
    );
}
