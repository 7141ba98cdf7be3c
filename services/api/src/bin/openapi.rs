//! services/api/src/bin/openapi.rs
//!
//! Writes the study planner's OpenAPI document to disk.
//!
//! Usage: `openapi [OUTPUT]`, where `OUTPUT` defaults to `openapi.json`.

use api_lib::web::rest::ApiDoc;
use std::path::{Path, PathBuf};
use utoipa::OpenApi;

const DEFAULT_OUTPUT: &str = "openapi.json";

fn write_document(doc: &utoipa::openapi::OpenApi, output: &Path) -> std::io::Result<()> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = doc.to_pretty_json().map_err(std::io::Error::other)?;
    std::fs::write(output, json)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let output: PathBuf = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

    let doc = ApiDoc::openapi();
    write_document(&doc, &output)?;
    println!(
        "Wrote {} routes for study planner API v{} to {}",
        doc.paths.paths.len(),
        doc.info.version,
        output.display()
    );
    Ok(())
}
