//! services/api/src/bin/openapi.rs
//!
//! Writes the OpenAPI document of the lesson tracker API.
//!
//! ```text
//! openapi                   # writes ./openapi.json
//! openapi docs/api.json
//! ```

use api_lib::{error::ApiError, web::rest::ApiDoc};
use clap::Parser;
use std::path::PathBuf;
use utoipa::OpenApi;

#[derive(Parser)]
#[command(name = "openapi", about = "Write the lesson tracker OpenAPI document")]
struct Cli {
    #[arg(default_value = "openapi.json")]
    output: PathBuf,
}

fn main() -> Result<(), ApiError> {
    let cli = Cli::parse();
    let doc = ApiDoc::openapi();
    let json = doc
        .to_pretty_json()
        .map_err(|e| ApiError::Internal(format!("failed to render the OpenAPI document: {}", e)))?;

    if let Some(parent) = cli.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&cli.output, json)?;

    println!(
        "Wrote {} paths to {}",
        doc.paths.paths.len(),
        cli.output.display()
    );
    Ok(())
}
