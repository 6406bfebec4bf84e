use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use serde_json::json;

use crate::cli::client::ApiClient;
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::csv_io::from_csv;

#[derive(Args)]
pub struct ExportArgs {
    #[arg(short, long, help = "Write to this file instead of stdout")]
    pub output: Option<PathBuf>,

    #[arg(long, help = "Only generations at or after this RFC 3339 time")]
    pub from: Option<String>,

    #[arg(long, help = "Only generations at or before this RFC 3339 time")]
    pub to: Option<String>,

    #[arg(long, help = "Only generations from this bulk import")]
    pub bulk_import_id: Option<String>,

    #[arg(long, help = "bulk or single")]
    pub source: Option<String>,
}

pub async fn handle(args: ExportArgs, client: &ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    let query: Vec<(&str, String)> = [
        ("from", args.from),
        ("to", args.to),
        ("bulkImportId", args.bulk_import_id),
        ("source", args.source),
    ]
    .into_iter()
    .filter_map(|(key, value)| value.map(|v| (key, v)))
    .collect();

    let body = client.export(&query).await?;

    match args.output {
        Some(path) => {
            std::fs::write(&path, &body).with_context(|| format!("cannot write {}", path.display()))?;
            let rows = from_csv(&body)?.len();
            output_success(
                output_format,
                &format!("Exported {} rows to {}", rows, path.display()),
                Some(json!({ "path": path, "rows": rows })),
            )
        }
        None => {
            print!("{}", body);
            Ok(())
        }
    }
}
