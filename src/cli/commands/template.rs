use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::csv_io::template_csv;

#[derive(Args)]
pub struct TemplateArgs {
    #[arg(short, long, help = "Write to this file instead of stdout")]
    pub output: Option<PathBuf>,
}

pub fn handle(args: TemplateArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let template = template_csv()?;

    match args.output {
        Some(path) => {
            std::fs::write(&path, &template).with_context(|| format!("cannot write {}", path.display()))?;
            output_success(
                output_format,
                &format!("Template written to {}", path.display()),
                Some(json!({ "path": path })),
            )
        }
        None => {
            print!("{}", template);
            Ok(())
        }
    }
}
