//! Manifest parsing.
//!
//! A manifest is the indentation-encoded output of a dependency-tree tool:
//!
//! ```text
//! libshogun.so.19 => /usr/lib/libshogun.so.19 (interpreter => /lib64/ld-linux-x86-64.so.2)
//!     libblas.so.3 => /usr/lib/libblas.so.3
//!         libgfortran.so.5 => /usr/lib/libgfortran.so.5 (*)
//!     libm.so.6 => /lib/libm.so.6
//! ```
//!
//! Leading spaces give the depth. A trailing parenthesized annotation is
//! dropped before splitting; when it contains [`NO_SHORT_NAME_MARKER`] the
//! entry must never be resolved through the linker's name search.

use thiserror::Error;

use super::tree::{DependencyTree, NodeId};

/// Token between the short name and the path.
pub const SEPARATOR: &str = "=>";

/// Marker inside an annotation that disables short-name loading.
pub const NO_SHORT_NAME_MARKER: char = '*';

const COMMENT_MARKERS: [&str; 2] = ["//", "#"];

/// Errors raised while parsing a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManifestError {
    /// A line does not split into exactly `<name> => <path>`.
    #[error("Malformed manifest line {line_number}: '{line}' (expected '<name> => <path>')")]
    Malformed { line_number: usize, line: String },

    /// The manifest declares no library at all.
    #[error("Manifest declares no libraries")]
    Empty,
}

/// One relevant manifest line, borrowed from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry<'a> {
    level: usize,
    short_name: &'a str,
    path_hint: &'a str,
    supports_short_name_load: bool,
}

/// Builds a [`DependencyTree`] from manifest lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestParser {
    lenient: bool,
}

impl ManifestParser {
    /// Strict parser: every non-blank, non-comment line must be an entry.
    pub const fn new() -> Self {
        Self { lenient: false }
    }

    /// Parser that skips lines without a separator instead of failing.
    pub const fn lenient() -> Self {
        Self { lenient: true }
    }

    pub fn parse_str(&self, text: &str) -> Result<DependencyTree, ManifestError> {
        self.parse(text.lines())
    }

    pub fn parse<I, S>(&self, lines: I) -> Result<DependencyTree, ManifestError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tree = DependencyTree::new();
        // (node, indentation); the root entry is never popped.
        let mut ancestors: Vec<(NodeId, usize)> = vec![(NodeId::ROOT, 0)];

        for (index, line) in lines.into_iter().enumerate() {
            let Some(entry) = self.parse_line(line.as_ref(), index + 1)? else {
                continue;
            };

            while ancestors.len() > 1 && ancestors[ancestors.len() - 1].1 >= entry.level {
                ancestors.pop();
            }
            let parent = ancestors[ancestors.len() - 1].0;
            let id = tree.attach(
                parent,
                entry.short_name,
                entry.path_hint,
                entry.supports_short_name_load,
            );
            ancestors.push((id, entry.level));
        }

        Ok(tree)
    }

    fn parse_line<'a>(
        &self,
        line: &'a str,
        line_number: usize,
    ) -> Result<Option<Entry<'a>>, ManifestError> {
        let trimmed = line.trim();
        if trimmed.is_empty() || COMMENT_MARKERS.iter().any(|m| trimmed.starts_with(m)) {
            return Ok(None);
        }
        if self.lenient && !line.contains(SEPARATOR) {
            return Ok(None);
        }

        let (body, supports_short_name_load) = match line.find('(') {
            Some(pos) => (&line[..pos], !line[pos..].contains(NO_SHORT_NAME_MARKER)),
            None => (line, true),
        };

        let malformed = || ManifestError::Malformed {
            line_number,
            line: line.to_string(),
        };

        let mut fields = body.split(SEPARATOR);
        let (Some(name), Some(path), None) = (fields.next(), fields.next(), fields.next()) else {
            return Err(malformed());
        };
        let short_name = name.trim();
        if short_name.is_empty() {
            return Err(malformed());
        }

        Ok(Some(Entry {
            level: indentation(line),
            short_name,
            path_hint: path.trim(),
            supports_short_name_load,
        }))
    }
}

/// Parse with the strict default parser.
pub fn parse<I, S>(lines: I) -> Result<DependencyTree, ManifestError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    ManifestParser::new().parse(lines)
}

/// Count of leading space characters.
fn indentation(line: &str) -> usize {
    line.chars().take_while(|c| *c == ' ').count()
}
