use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use serde_json::json;

use crate::cli::utils::{output_detail, output_success};
use crate::cli::OutputFormat;
use crate::config::config;
use crate::csv_io::{check_upload, parse, ColumnMapping};

#[derive(Args)]
pub struct ValidateArgs {
    #[arg(help = "CSV file to check")]
    pub file: PathBuf,

    #[arg(long, help = "Column mapping as a JSON object, e.g. '{\"productName\":\"Item\"}'")]
    pub mapping: Option<String>,
}

pub fn handle(args: ValidateArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let bytes = std::fs::read(&args.file).with_context(|| format!("cannot read {}", args.file.display()))?;
    let file_name = args.file.file_name().and_then(|n| n.to_str()).unwrap_or_default();

    let mapping = args
        .mapping
        .as_deref()
        .map(serde_json::from_str::<ColumnMapping>)
        .transpose()
        .context("invalid --mapping JSON")?;

    let text = check_upload(file_name, &bytes, config().bulk.max_upload_bytes)?;
    let parsed = parse(text, mapping.as_ref())?;

    if parsed.needs_mapping() {
        let missing: Vec<_> = parsed.missing_columns.iter().map(|m| m.column).collect();
        anyhow::bail!(
            "required columns could not be mapped: {} (headers: {})",
            missing.join(", "),
            parsed.headers.join(", ")
        );
    }

    output_success(
        output_format,
        &format!("{} of {} rows ready", parsed.rows.len(), parsed.total_rows),
        Some(json!({
            "totalRows": parsed.total_rows,
            "readyRows": parsed.rows.len(),
            "columnMapping": parsed.column_mapping,
            "validationErrors": parsed.validation_errors,
        })),
    )?;

    for error in &parsed.validation_errors {
        output_detail(output_format, &format!("row {} ({})", error.row, error.field), &error.message);
    }
    Ok(())
}
