//! Accounting over the stored evaluation history: which folders are spent and
//! how many responses each dataset has accumulated.

use crate::error::SurveyError;
use providers::{DocumentStore, EvaluationDoc};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default)]
pub struct UsageIndex {
    used: HashSet<String>,
    counts: HashMap<String, u64>,
}

impl UsageIndex {
    /// Derive the index from the full evaluation history. A record counts
    /// toward its dataset when `image.dataset` is present; it marks a folder
    /// as used only when `image.folder` is present as well. Records carrying
    /// neither contribute nothing.
    pub fn from_history(history: &[EvaluationDoc]) -> Self {
        let mut index = UsageIndex::default();
        for doc in history {
            let Some(image) = &doc.image else { continue };
            let Some(dataset) = &image.dataset else { continue };
            *index.counts.entry(dataset.clone()).or_insert(0) += 1;
            if let Some(folder) = &image.folder {
                index.used.insert(format!("{}/{}", dataset, folder));
            }
        }
        index
    }

    /// Fetch the whole history and build the index. No partial or cached
    /// index: a retrieval failure surfaces to the caller.
    pub async fn load(store: &dyn DocumentStore) -> Result<Self, SurveyError> {
        let history = store
            .list_evaluations()
            .await
            .map_err(SurveyError::Retrieval)?;
        Ok(Self::from_history(&history))
    }

    /// Usage is monotonic: one stored evaluation retires the folder forever.
    pub fn is_used(&self, dataset: &str, folder: &str) -> bool {
        self.used.contains(&format!("{}/{}", dataset, folder))
    }

    pub fn response_count(&self, dataset: &str) -> u64 {
        self.counts.get(dataset).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use providers::ImageRef;

    fn record(dataset: Option<&str>, folder: Option<&str>) -> EvaluationDoc {
        EvaluationDoc {
            image: Some(ImageRef {
                dataset: dataset.map(str::to_string),
                folder: folder.map(str::to_string),
                ..ImageRef::default()
            }),
            ..EvaluationDoc::default()
        }
    }

    #[test]
    fn counts_and_used_set_track_separately() {
        let history = vec![
            record(Some("A"), Some("f1")),
            record(Some("A"), Some("f2")),
            record(Some("A"), None),
            record(Some("B"), Some("f1")),
        ];
        let index = UsageIndex::from_history(&history);

        assert_eq!(index.response_count("A"), 3);
        assert_eq!(index.response_count("B"), 1);
        assert_eq!(index.response_count("C"), 0);
        assert!(index.is_used("A", "f1"));
        assert!(index.is_used("A", "f2"));
        assert!(index.is_used("B", "f1"));
        assert!(!index.is_used("B", "f2"));
    }

    #[test]
    fn records_without_provenance_contribute_nothing() {
        let history = vec![
            EvaluationDoc::default(),
            record(None, Some("orphan-folder")),
        ];
        let index = UsageIndex::from_history(&history);

        assert_eq!(index.response_count("orphan-folder"), 0);
        assert!(!index.is_used("", "orphan-folder"));
        assert!(index.counts.is_empty());
        assert!(index.used.is_empty());
    }
}
