//! Series tags and display modes.
//!
//! A series tag is `"{mode}/{encoded name}"`, e.g. `train/layer1%conv` for the
//! name `layer1/conv` logged in `train` mode. Encoding replaces `/` with `%` so
//! the mode separator stays unambiguous.

use crate::{Error, Result};

/// Separator between the mode and the encoded name.
pub const MODE_SEPARATOR: char = '/';

const ENCODED_SEPARATOR: char = '%';

/// Check that `mode` can prefix a series tag.
///
/// # Errors
/// Returns `InvalidConfig` if the mode is empty or contains `/` or `%`
pub fn validate_mode(mode: &str) -> Result<()> {
    if mode.is_empty() || mode.contains([MODE_SEPARATOR, ENCODED_SEPARATOR]) {
        return Err(Error::InvalidConfig(format!(
            "mode '{mode}' must be non-empty and contain no '{MODE_SEPARATOR}' or '{ENCODED_SEPARATOR}'"
        )));
    }
    Ok(())
}

/// Encode a user-facing name for use inside a series tag.
#[must_use]
pub fn encode_tag(name: &str) -> String {
    name.replace(MODE_SEPARATOR, &ENCODED_SEPARATOR.to_string())
}

/// Reverse of [`encode_tag`].
#[must_use]
pub fn decode_tag(tag: &str) -> String {
    tag.replace(ENCODED_SEPARATOR, &MODE_SEPARATOR.to_string())
}

/// Build the series tag for `name` logged under `mode`.
#[must_use]
pub fn series_tag(mode: &str, name: &str) -> String {
    format!("{mode}{MODE_SEPARATOR}{}", encode_tag(name))
}

/// Resolves stored captions into display names for a given mode.
pub trait TagResolver {
    /// Whether `tag` belongs to `mode`.
    fn tag_matches_mode(&self, tag: &str, mode: &str) -> bool;

    /// Display name of a tag known to belong to `mode`.
    fn readable_tag(&self, mode: &str, tag: &str) -> String;

    /// Display name of a tag from any mode.
    fn decode_tag(&self, tag: &str) -> String;

    /// Resolve a caption the way readers present it.
    fn resolve(&self, caption: &str, mode: &str) -> String {
        if self.tag_matches_mode(caption, mode) {
            self.readable_tag(mode, caption)
        } else {
            self.decode_tag(caption)
        }
    }
}

/// Resolver for `"{mode}/{encoded name}"` tags.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModeTagResolver;

impl TagResolver for ModeTagResolver {
    fn tag_matches_mode(&self, tag: &str, mode: &str) -> bool {
        tag.strip_prefix(mode)
            .is_some_and(|rest| rest.starts_with(MODE_SEPARATOR))
    }

    fn readable_tag(&self, mode: &str, tag: &str) -> String {
        let name = tag
            .get(mode.len()..)
            .map_or(tag, |rest| rest.strip_prefix(MODE_SEPARATOR).unwrap_or(rest));
        decode_tag(name)
    }

    fn decode_tag(&self, tag: &str) -> String {
        decode_tag(tag)
    }
}
