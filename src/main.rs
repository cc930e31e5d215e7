mod agent;
mod config;
mod error;
mod export;
mod ocr;
mod parser;
mod server;
mod validation;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;
use error::AppError;
use export::{ExportFormat, Exporter};
use validation::{Pipeline, Rules};

#[derive(Parser, Debug)]
#[command(name = "invoice_agents")]
#[command(about = "Invoice OCR, parsing, validation and export agents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server hosting every agent (default)
    Serve,
    /// Validate an invoice JSON file and print the verdict
    Validate { file: PathBuf },
    /// Extract names, emails, phones and dates from a text file
    Parse { file: PathBuf },
    /// Export an invoice JSON file as csv or xlsx
    Export { file: PathBuf, format: String },
    /// Run OCR on an image file
    Ocr { image: PathBuf },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // init tracing
    tracing_subscriber::fmt()
        .with_target(true)
        .with_level(true)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = Config::load_or_default()?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => server::serve(&cfg).await?,
        Command::Validate { file } => {
            let invoice = read_json(&file)?;
            let verdict = Pipeline::new(Rules::from(&cfg.validation)).run(&invoice);
            info!(file = %file.display(), valid = verdict.valid, "Validated");
            println!("{}", serde_json::to_string_pretty(&verdict)?);
        }
        Command::Parse { file } => {
            let text = std::fs::read_to_string(&file)?;
            let parsed = parser::parse_text(&text);
            let (filled, total) = parsed.coverage();
            info!(file = %file.display(), filled, total, "Parsed");
            println!("{}", serde_json::to_string_pretty(&parsed)?);
        }
        Command::Export { file, format } => {
            let format = ExportFormat::parse(&format)
                .ok_or_else(|| AppError::BadRequest(format!("Unsupported format {format}")))?;
            let invoice = read_json(&file)?;
            let path = Exporter::new(&cfg.export.dir).export(&invoice, format)?;
            println!("{}", path.display());
        }
        Command::Ocr { image } => {
            let client = ocr::OcrClient::from_config(&cfg.ocr)?;
            println!("{}", client.recognize(&image).await?);
        }
    }

    Ok(())
}

fn read_json(path: &std::path::Path) -> Result<serde_json::Value, AppError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
