use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Args;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::cli::client::ApiClient;
use crate::cli::utils::{output_detail, output_success};
use crate::cli::OutputFormat;

#[derive(Args)]
pub struct SubmitArgs {
    #[arg(help = "CSV file to upload")]
    pub file: PathBuf,

    #[arg(long, help = "Column mapping as a JSON object")]
    pub mapping: Option<String>,

    #[arg(long, default_value_t = 2000, help = "Progress poll interval in milliseconds")]
    pub poll_ms: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Progress {
    status: String,
    total_rows: usize,
    processed_rows: usize,
    successful_rows: usize,
    failed_rows: usize,
    #[serde(default)]
    errors: Vec<Value>,
    #[serde(default)]
    fatal_error: Option<String>,
}

pub async fn handle(args: SubmitArgs, client: &ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    let bytes = std::fs::read(&args.file).with_context(|| format!("cannot read {}", args.file.display()))?;
    let file_name = args
        .file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload.csv")
        .to_string();
    let mapping: Option<Value> = args
        .mapping
        .as_deref()
        .map(serde_json::from_str)
        .transpose()
        .context("invalid --mapping JSON")?;

    let upload = client.upload(&file_name, bytes, mapping.as_ref()).await?;
    let records = upload.get("records").cloned().unwrap_or_else(|| json!([]));
    let ready = records.as_array().map_or(0, Vec::len);
    anyhow::ensure!(ready > 0, "no ready rows in {}", file_name);
    output_detail(output_format, "ready rows", ready);

    let accepted = client
        .process(&json!({ "rows": records, "fileName": file_name }))
        .await?;
    let job_id = accepted
        .get("jobId")
        .and_then(Value::as_str)
        .context("server did not return a jobId")?
        .to_string();
    output_detail(output_format, "job", &job_id);

    let interval = Duration::from_millis(args.poll_ms.max(100));
    let progress = loop {
        let progress: Progress = client.progress(&job_id).await?;
        if progress.status == "completed" || progress.status == "failed" {
            break progress;
        }
        output_detail(
            output_format,
            "progress",
            format!("{}/{}", progress.processed_rows, progress.total_rows),
        );
        tokio::time::sleep(interval).await;
    };

    if let Some(fatal) = &progress.fatal_error {
        anyhow::bail!("job {} failed: {}", job_id, fatal);
    }

    output_success(
        output_format,
        &format!(
            "Job {} {}: {} succeeded, {} failed",
            job_id, progress.status, progress.successful_rows, progress.failed_rows
        ),
        Some(json!({
            "jobId": job_id,
            "bulkImportId": accepted.get("bulkImportId"),
            "successfulRows": progress.successful_rows,
            "failedRows": progress.failed_rows,
            "errors": progress.errors,
        })),
    )
}
