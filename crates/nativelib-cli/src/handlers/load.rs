//! Load command handler.

use std::fmt::Write;

use anyhow::Result;
use tracing::debug;

use nativelib_core::{LoadReport, LoadedLibrary};

use crate::args::LibraryArgs;
use crate::error::CliError;

/// Execute the load command.
///
/// Without `--all` only the primary library is loaded and a failure is fatal.
/// With `--all` every library is attempted; the command still fails if any
/// of them could not be loaded, after printing the full report.
pub fn execute(library: &LibraryArgs, all: bool, no_install: bool, as_json: bool) -> Result<()> {
    let mut loader = library.build_loader(!no_install)?;
    debug!(platform = %loader.platform(), target = %loader.target_dir().display(), "Loader ready");

    if all {
        let report = loader.load_all();
        println!("{}", render_report(&report, as_json)?);
        if !report.is_complete() {
            return Err(CliError::Load(format!(
                "{} of {} libraries failed to load",
                report.failed.len(),
                report.failed.len() + report.loaded.len()
            ))
            .into());
        }
        return Ok(());
    }

    let loaded = loader.load_primary().map_err(CliError::from)?;
    println!("{}", render_loaded(&loader.to_string(), &loaded, as_json)?);
    Ok(())
}

pub fn render_loaded(platform_name: &str, loaded: &LoadedLibrary, as_json: bool) -> Result<String> {
    if as_json {
        return Ok(serde_json::to_string_pretty(loaded)?);
    }
    Ok(format!(
        "{platform_name}: loaded {} ({})",
        loaded.target, loaded.strategy
    ))
}

pub fn render_report(report: &LoadReport, as_json: bool) -> Result<String> {
    if as_json {
        return Ok(serde_json::to_string_pretty(report)?);
    }

    let mut out = String::new();
    for node in &report.loaded {
        writeln!(
            out,
            "loaded  {} via {} ({})",
            node.library, node.outcome.strategy, node.outcome.target
        )?;
    }
    for node in &report.failed {
        writeln!(out, "failed  {}: {}", node.library, node.failure)?;
    }
    write!(
        out,
        "{} loaded, {} failed",
        report.loaded.len(),
        report.failed.len()
    )?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nativelib_core::{LoadStrategy, LoadedNode};

    fn loaded(strategy: LoadStrategy, target: &str) -> LoadedLibrary {
        LoadedLibrary {
            strategy,
            target: target.to_string(),
        }
    }

    #[test]
    fn loaded_text_names_strategy() {
        let text = render_loaded(
            "demo-linux-x86_64",
            &loaded(LoadStrategy::ShortName, "libdemo.so"),
            false,
        )
        .unwrap();
        assert_eq!(text, "demo-linux-x86_64: loaded libdemo.so (short-name)");
    }

    #[test]
    fn report_text_summarizes_counts() {
        let report = LoadReport {
            loaded: vec![LoadedNode {
                library: "libdep.so".to_string(),
                outcome: loaded(LoadStrategy::Direct, "/usr/lib/libdep.so"),
            }],
            failed: Vec::new(),
        };
        let text = render_report(&report, false).unwrap();
        assert!(text.starts_with("loaded  libdep.so via direct (/usr/lib/libdep.so)"));
        assert!(text.ends_with("1 loaded, 0 failed"));
    }

    #[test]
    fn report_json_flattens_outcome() {
        let report = LoadReport {
            loaded: vec![LoadedNode {
                library: "libdep.so".to_string(),
                outcome: loaded(LoadStrategy::Extracted, "/tmp/demo-1/libdep.so"),
            }],
            failed: Vec::new(),
        };
        let value: serde_json::Value =
            serde_json::from_str(&render_report(&report, true).unwrap()).unwrap();
        assert_eq!(value["loaded"][0]["strategy"], "extracted");
        assert_eq!(value["loaded"][0]["library"], "libdep.so");
    }
}
