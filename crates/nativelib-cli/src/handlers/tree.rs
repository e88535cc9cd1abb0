//! Tree command handler.
//!
//! Renders a manifest either straight from a file or from the bundle selected
//! by `--resources`/`--name` and the platform.

use std::fs;

use anyhow::Result;
use serde_json::json;

use nativelib_core::{DependencyTree, DirectoryBundle, ManifestParser, NativeLibraryLoader, format_tree};

use crate::args::TreeArgs;
use crate::error::CliError;

/// Execute the tree command.
pub fn execute(args: &TreeArgs, as_json: bool) -> Result<()> {
    let parser = if args.lenient {
        ManifestParser::lenient()
    } else {
        ManifestParser::new()
    };

    let output = match (&args.manifest, &args.resources, &args.name) {
        (Some(path), _, _) => {
            let text = fs::read_to_string(path).map_err(|err| {
                CliError::NotFound(format!("{}: {err}", path.display()))
            })?;
            let tree = parser
                .parse_str(&text)
                .map_err(|err| CliError::Manifest(err.to_string()))?;
            render(&tree, as_json)?
        }
        (None, Some(resources), Some(name)) => {
            let mut builder =
                NativeLibraryLoader::builder(name.clone(), "0", DirectoryBundle::new(resources))
                    .lenient_manifest(args.lenient);
            if let Some(platform) = &args.platform {
                builder = builder.platform(platform.clone());
            }
            let loader = builder.build().map_err(CliError::from)?;
            render(loader.dependency_tree(), as_json)?
        }
        _ => {
            return Err(CliError::Arguments(
                "pass --manifest <FILE>, or --resources <DIR> with --name <NAME>".to_string(),
            )
            .into());
        }
    };

    println!("{output}");
    Ok(())
}

pub fn render(tree: &DependencyTree, as_json: bool) -> Result<String> {
    if !as_json {
        return Ok(format_tree(tree).trim_end().to_string());
    }

    let nodes: Vec<_> = tree
        .libraries()
        .into_iter()
        .map(|id| {
            let node = &tree[id];
            json!({
                "id": id,
                "parent": node.parent().filter(|parent| *parent != tree.root()),
                "short_name": node.short_name(),
                "path_hint": node.path_hint(),
                "supports_short_name_load": node.supports_short_name_load(),
                "depth": node.depth(),
            })
        })
        .collect();
    Ok(serde_json::to_string_pretty(&nodes)?)
}
