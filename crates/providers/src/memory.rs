use crate::{
    BlobStore, DocumentStore, EvaluationDoc, Listing, SessionDoc, StoreError,
};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// In-memory stand-in for both collaborators. Used by tests and as the
/// fallback when no real backend is configured.
#[derive(Default)]
pub struct MemoryStore {
    evaluations: Mutex<Vec<EvaluationDoc>>,
    sessions: Mutex<Vec<SessionDoc>>,
    objects: Mutex<BTreeSet<String>>,
    fail_writes: AtomicBool,
    fail_downloads: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a blob object by its full path, e.g. `"A/f1/0.jpg"`.
    pub fn insert_object(&self, path: &str) {
        self.objects.lock().unwrap().insert(path.to_string());
    }

    /// Register a whole folder of items under `dataset/folder`.
    pub fn insert_folder(&self, dataset: &str, folder: &str, files: &[&str]) {
        let mut objects = self.objects.lock().unwrap();
        for file in files {
            objects.insert(format!("{}/{}/{}", dataset, folder, file));
        }
    }

    pub fn seed_evaluation(&self, doc: EvaluationDoc) {
        self.evaluations.lock().unwrap().push(doc);
    }

    /// When set, every document write fails with a request error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// When set, URL resolution fails with a request error.
    pub fn set_fail_downloads(&self, fail: bool) {
        self.fail_downloads.store(fail, Ordering::SeqCst);
    }

    pub fn evaluation_count(&self) -> usize {
        self.evaluations.lock().unwrap().len()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    async fn list_evaluations(&self) -> Result<Vec<EvaluationDoc>, StoreError> {
        Ok(self.evaluations.lock().unwrap().clone())
    }

    async fn list_sessions(&self) -> Result<Vec<SessionDoc>, StoreError> {
        Ok(self.sessions.lock().unwrap().clone())
    }

    async fn add_evaluation(&self, doc: &EvaluationDoc) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::RequestFailed("writes disabled".into()));
        }
        self.evaluations.lock().unwrap().push(doc.clone());
        Ok(())
    }

    async fn add_session(&self, doc: &SessionDoc) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::RequestFailed("writes disabled".into()));
        }
        self.sessions.lock().unwrap().push(doc.clone());
        Ok(())
    }
}

#[async_trait::async_trait]
impl BlobStore for MemoryStore {
    async fn list(&self, path: &str) -> Result<Listing, StoreError> {
        let prefix = if path.is_empty() {
            String::new()
        } else {
            format!("{}/", path.trim_end_matches('/'))
        };
        let objects = self.objects.lock().unwrap();
        let mut listing = Listing::default();
        let mut seen = BTreeSet::new();
        for object in objects.iter() {
            let Some(rest) = object.strip_prefix(&prefix) else {
                continue;
            };
            match rest.split_once('/') {
                Some((child, _)) => {
                    if seen.insert(child.to_string()) {
                        listing.prefixes.push(child.to_string());
                    }
                }
                None => listing.items.push(rest.to_string()),
            }
        }
        Ok(listing)
    }

    async fn download_url(&self, path: &str) -> Result<String, StoreError> {
        if self.fail_downloads.load(Ordering::SeqCst) {
            return Err(StoreError::RequestFailed("downloads disabled".into()));
        }
        if self.objects.lock().unwrap().contains(path) {
            Ok(format!("memory://{}", path))
        } else {
            Err(StoreError::RequestFailed(format!("no such object: {}", path)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn listing_separates_folders_from_items() {
        let store = MemoryStore::new();
        store.insert_folder("A", "f1", &["0.jpg", "face1-1_2_3_4.jpg"]);
        store.insert_folder("B", "f2", &["0.jpg"]);

        let root = store.list("").await.unwrap();
        assert_eq!(root.prefixes, vec!["A", "B"]);
        assert!(root.items.is_empty());

        let folder = store.list("A/f1").await.unwrap();
        assert!(folder.prefixes.is_empty());
        assert_eq!(folder.items, vec!["0.jpg", "face1-1_2_3_4.jpg"]);
    }

    #[tokio::test]
    async fn download_url_requires_known_object() {
        let store = MemoryStore::new();
        store.insert_object("A/f1/0.jpg");
        assert_eq!(
            store.download_url("A/f1/0.jpg").await.unwrap(),
            "memory://A/f1/0.jpg"
        );
        assert!(store.download_url("A/f1/missing.jpg").await.is_err());
    }
}
