//! Extract command handler.

use anyhow::Result;
use serde_json::json;

use nativelib_core::Extraction;

use crate::args::LibraryArgs;
use crate::error::CliError;

/// Execute the extract command.
pub fn execute(library: &LibraryArgs, resource: &str, as_json: bool) -> Result<()> {
    let loader = library.build_loader(false)?;
    let extraction = loader
        .extract_resource(resource)
        .map_err(CliError::from)?;

    if extraction == Extraction::NotBundled {
        return Err(CliError::NotFound(format!(
            "{resource} is not bundled for {loader}"
        ))
        .into());
    }

    println!("{}", render(resource, &extraction, as_json)?);
    Ok(())
}

pub fn render(resource: &str, extraction: &Extraction, as_json: bool) -> Result<String> {
    let outcome = match extraction {
        Extraction::Copied(_) => "copied",
        Extraction::Reused(_) => "reused",
        Extraction::NotBundled => "not_bundled",
    };
    let path = extraction.path().map(|path| path.display().to_string());

    if as_json {
        let value = json!({
            "resource": resource,
            "outcome": outcome,
            "path": path,
        });
        return Ok(serde_json::to_string_pretty(&value)?);
    }

    Ok(match path {
        Some(path) => format!("{resource}: {outcome} to {path}"),
        None => format!("{resource}: {outcome}"),
    })
}
