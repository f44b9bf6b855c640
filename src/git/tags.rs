//! Choosing the tag a release is compared against

use crate::error::{DigestError, TagError};
use crate::git::VcsQuery;
use crate::types::{PreviousTag, Tag};

/// Pick the comparison tag for `current`
///
/// `tags` must be ordered newest first. An explicit `override_tag` wins but
/// has to exist in the listing. Without one, the tag right after `current`
/// (the nearest older tag) is returned, or [`PreviousTag::None`] when
/// `current` is the oldest tag.
pub fn resolve_previous_tag(
    tags: &[String],
    current: &str,
    override_tag: Option<&str>,
) -> Result<PreviousTag, TagError> {
    if let Some(name) = override_tag {
        if !tags.iter().any(|t| t == name) {
            return Err(TagError::TagNotFound(name.to_string()));
        }
        if name == current {
            tracing::warn!("Comparison tag {} is the release tag itself", name);
        }
        return Ok(PreviousTag::Tag(name.to_string()));
    }

    if tags.is_empty() {
        return Err(TagError::NoTagsFound);
    }

    let index = tags
        .iter()
        .position(|t| t == current)
        .ok_or_else(|| TagError::TagNotFound(current.to_string()))?;

    Ok(match tags.get(index + 1) {
        Some(older) => PreviousTag::Tag(older.clone()),
        None => PreviousTag::None,
    })
}

/// Same as [`resolve_previous_tag`], using the positioned [`Tag`] listing
pub fn resolve_from_listing(
    tags: &[Tag],
    current: &str,
    override_tag: Option<&str>,
) -> Result<PreviousTag, TagError> {
    let names: Vec<String> = tags.iter().map(|t| t.name.clone()).collect();
    resolve_previous_tag(&names, current, override_tag)
}

/// List tags from the repository and resolve the comparison tag
pub fn resolve_in_repo(
    vcs: &dyn VcsQuery,
    current: &str,
    override_tag: Option<&str>,
) -> Result<PreviousTag, DigestError> {
    let tags = vcs.list_tags()?;
    tracing::debug!("Repository lists {} tags", tags.len());

    let previous = resolve_previous_tag(&tags, current, override_tag)?;
    tracing::info!("Comparing {} against {}", current, previous);
    Ok(previous)
}
