//! Folder assignment for a new session: unused folders only, with dataset
//! representation weighted toward historically under-answered datasets.

use crate::catalog::{self, DatasetListing};
use crate::config::SelectionConfig;
use crate::error::SurveyError;
use crate::models::Pick;
use crate::usage::UsageIndex;
use providers::{BlobStore, DocumentStore};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use tracing::info;

/// A dataset that still has at least one unused folder.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub name: String,
    pub available: Vec<String>,
    pub response_count: u64,
}

/// Cross the catalog with the usage index: keep datasets with unused folders,
/// attach their response counts, and sort ascending by count. The sort is
/// stable, so datasets with equal counts keep their catalog order.
pub fn eligible(catalog: &[DatasetListing], usage: &UsageIndex) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = catalog
        .iter()
        .filter_map(|dataset| {
            let available: Vec<String> = dataset
                .folders
                .iter()
                .filter(|folder| !usage.is_used(&dataset.name, folder))
                .cloned()
                .collect();
            if available.is_empty() {
                return None;
            }
            Some(Candidate {
                name: dataset.name.clone(),
                response_count: usage.response_count(&dataset.name),
                available,
            })
        })
        .collect();
    candidates.sort_by_key(|candidate| candidate.response_count);
    candidates
}

/// Draw at most `max_select` picks: one uniformly random folder from each of
/// the `max_select` least-answered candidates, then — when fewer candidates
/// exist than the target — further distinct folders from the least-answered
/// candidate until the target is reached or its folders run out.
pub fn draw_picks<R: Rng>(candidates: &[Candidate], max_select: usize, rng: &mut R) -> Vec<Pick> {
    let selected = &candidates[..candidates.len().min(max_select)];
    let mut picks = Vec::with_capacity(max_select);
    for candidate in selected {
        if let Some(folder) = candidate.available.choose(rng) {
            picks.push(Pick {
                dataset: candidate.name.clone(),
                folder: folder.clone(),
            });
        }
    }

    if picks.len() < max_select {
        if let Some(least) = selected.first() {
            let taken: HashSet<&str> = picks
                .iter()
                .filter(|pick| pick.dataset == least.name)
                .map(|pick| pick.folder.as_str())
                .collect();
            let mut remaining: Vec<&String> = least
                .available
                .iter()
                .filter(|folder| !taken.contains(folder.as_str()))
                .collect();
            while picks.len() < max_select && !remaining.is_empty() {
                let idx = rng.gen_range(0..remaining.len());
                let folder = remaining.swap_remove(idx);
                picks.push(Pick {
                    dataset: least.name.clone(),
                    folder: folder.clone(),
                });
            }
        }
    }

    picks
}

/// Assemble the picks for one new session. The usage index and the catalog
/// are independent reads and are fetched concurrently. An empty result means
/// every folder has been evaluated; the caller should not start a session.
pub async fn select_for_session<R: Rng>(
    documents: &dyn DocumentStore,
    blobs: &dyn BlobStore,
    cfg: &SelectionConfig,
    rng: &mut R,
) -> Result<Vec<Pick>, SurveyError> {
    let (usage, catalog) = tokio::try_join!(
        UsageIndex::load(documents),
        catalog::load_catalog(blobs, &cfg.excluded_datasets)
    )?;
    let candidates = eligible(&catalog, &usage);
    let picks = draw_picks(&candidates, cfg.max_select, rng);
    info!(
        candidates = candidates.len(),
        picks = picks.len(),
        "folder selection complete"
    );
    Ok(picks)
}
