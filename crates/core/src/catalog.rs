//! Listing of available datasets and their folders from the blob store.

use crate::error::SurveyError;
use providers::BlobStore;

#[derive(Debug, Clone)]
pub struct DatasetListing {
    pub name: String,
    pub folders: Vec<String>,
}

/// List every dataset (root prefix) and its folders, skipping the denylist.
/// Order is whatever the listing service returns; it carries no meaning but
/// is preserved as the tie-break order downstream.
pub async fn load_catalog(
    blobs: &dyn BlobStore,
    excluded: &[String],
) -> Result<Vec<DatasetListing>, SurveyError> {
    let root = blobs.list("").await.map_err(SurveyError::Retrieval)?;
    let mut catalog = Vec::with_capacity(root.prefixes.len());
    for name in root.prefixes {
        if excluded.contains(&name) {
            continue;
        }
        let children = blobs.list(&name).await.map_err(SurveyError::Retrieval)?;
        catalog.push(DatasetListing {
            name,
            folders: children.prefixes,
        });
    }
    Ok(catalog)
}
