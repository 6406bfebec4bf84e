pub mod client;
pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bulkctl")]
#[command(about = "bulkctl - validate, submit and export bulk listing CSVs")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(
        long,
        global = true,
        env = "BULKCTL_SERVER",
        default_value = "http://localhost:3000",
        help = "Base URL of the listing API"
    )]
    pub server: String,

    #[arg(long, global = true, env = "BULKCTL_TOKEN", hide_env_values = true, help = "Bearer token")]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Parse a CSV locally and report ready and invalid rows")]
    Validate(commands::validate::ValidateArgs),

    #[command(about = "Write the import template")]
    Template(commands::template::TemplateArgs),

    #[command(about = "Upload a CSV, process every ready row and wait for the job")]
    Submit(commands::submit::SubmitArgs),

    #[command(about = "Download generated listings as CSV")]
    Export(commands::export::ExportArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Validate(args) => commands::validate::handle(args, output_format),
        Commands::Template(args) => commands::template::handle(args, output_format),
        Commands::Submit(args) => {
            let client = client::ApiClient::new(&cli.server, cli.token)?;
            commands::submit::handle(args, &client, output_format).await
        }
        Commands::Export(args) => {
            let client = client::ApiClient::new(&cli.server, cli.token)?;
            commands::export::handle(args, &client, output_format).await
        }
    }
}
