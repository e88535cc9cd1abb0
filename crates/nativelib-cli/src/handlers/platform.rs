//! Platform command handler.

use anyhow::Result;
use serde_json::json;

use nativelib_core::PlatformTag;

use crate::error::CliError;

/// Execute the platform command.
pub fn execute(platform: Option<&str>, as_json: bool) -> Result<()> {
    let tag = PlatformTag::resolve(platform).map_err(CliError::from)?;
    println!("{}", render(&tag, as_json)?);
    Ok(())
}

pub fn render(tag: &PlatformTag, as_json: bool) -> Result<String> {
    let extension = tag.dynamic_library_extension().ok();
    if as_json {
        let value = json!({
            "platform": tag,
            "os": tag.os().token(),
            "arch": tag.arch(),
            "extension": extension,
        });
        return Ok(serde_json::to_string_pretty(&value)?);
    }

    Ok(format!(
        "platform  = {tag}\nextension = {}",
        extension.unwrap_or("unsupported")
    ))
}
