//! Resolves selection picks into presentable image groups.

use crate::error::SurveyError;
use crate::models::{Group, Pick, SurveyImage};
use futures::future::try_join_all;
use providers::BlobStore;
use tracing::debug;

/// Filename stem that marks a folder's annotated overview image.
pub const CONTEXT_STEM: &str = "0";

fn stem(name: &str) -> &str {
    name.split('.').next().unwrap_or(name)
}

/// Turn each pick into a complete group: exactly one context image plus the
/// face crops, all with resolved URLs. Folders with no items, no context
/// image, or no evaluable images are dropped silently — the session simply
/// shrinks. A URL resolution failure aborts the whole materialization; no
/// partial group is ever exposed.
pub async fn materialize(
    blobs: &dyn BlobStore,
    picks: &[Pick],
) -> Result<Vec<Group>, SurveyError> {
    let mut groups = Vec::with_capacity(picks.len());
    for pick in picks {
        let listing = blobs
            .list(&pick.path())
            .await
            .map_err(SurveyError::Retrieval)?;
        if listing.items.is_empty() {
            debug!(folder = %pick.path(), "skipping folder with no items");
            continue;
        }
        let Some(context_name) = listing.items.iter().find(|name| stem(name) == CONTEXT_STEM)
        else {
            debug!(folder = %pick.path(), "skipping folder without context image");
            continue;
        };
        let evaluation_names: Vec<&String> = listing
            .items
            .iter()
            .filter(|name| stem(name) != CONTEXT_STEM)
            .collect();
        if evaluation_names.is_empty() {
            debug!(folder = %pick.path(), "skipping folder without evaluable images");
            continue;
        }

        let context = resolve(blobs, pick, context_name, true).await?;
        let evaluations = try_join_all(
            evaluation_names
                .iter()
                .map(|name| resolve(blobs, pick, name, false)),
        )
        .await?;
        groups.push(Group {
            context,
            evaluations,
        });
    }
    Ok(groups)
}

async fn resolve(
    blobs: &dyn BlobStore,
    pick: &Pick,
    name: &str,
    is_context: bool,
) -> Result<SurveyImage, SurveyError> {
    let path = format!("{}/{}", pick.path(), name);
    let url = blobs
        .download_url(&path)
        .await
        .map_err(SurveyError::Retrieval)?;
    Ok(SurveyImage {
        name: name.to_string(),
        file_name: stem(name).to_string(),
        url,
        dataset: pick.dataset.clone(),
        folder: pick.folder.clone(),
        is_context,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stem_takes_everything_before_the_first_dot() {
        assert_eq!(stem("0.jpg"), "0");
        assert_eq!(stem("face2-156_87_270_218.jpg"), "face2-156_87_270_218");
        assert_eq!(stem("noextension"), "noextension");
    }
}
