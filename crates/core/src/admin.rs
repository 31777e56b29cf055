//! Password-gated dashboard backing: browse stored sessions and evaluations.

use crate::error::SurveyError;
use crate::export;
use providers::{DocumentStore, EvaluationDoc, SessionDoc};

/// Entries shown per dashboard page.
pub const PAGE_SIZE: usize = 50;

/// Shared-password gate. No session or token lifecycle.
pub fn verify_password(candidate: &str, expected: &str) -> bool {
    !expected.is_empty() && candidate == expected
}

#[derive(Debug, Default)]
pub struct AdminData {
    pub sessions: Vec<SessionDoc>,
    pub evaluations: Vec<EvaluationDoc>,
}

/// Load both collections, newest first.
pub async fn load(store: &dyn DocumentStore) -> Result<AdminData, SurveyError> {
    let (mut sessions, mut evaluations) =
        tokio::try_join!(store.list_sessions(), store.list_evaluations())
            .map_err(SurveyError::Retrieval)?;
    sessions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    evaluations.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    Ok(AdminData {
        sessions,
        evaluations,
    })
}

/// Case-insensitive substring search over the face token, folder, answer,
/// and participant name of each evaluation.
pub fn filter_evaluations<'a>(
    evaluations: &'a [EvaluationDoc],
    term: &str,
) -> Vec<&'a EvaluationDoc> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return evaluations.iter().collect();
    }
    evaluations
        .iter()
        .filter(|eval| {
            let face = eval
                .image
                .as_ref()
                .and_then(|image| image.file_name.as_deref())
                .map(|name| export::parse_face_info(name).face);
            let folder = eval
                .image
                .as_ref()
                .and_then(|image| image.folder.as_deref());
            let name = eval
                .participant
                .as_ref()
                .map(|participant| participant.name.as_str());
            matches_term(face.as_deref(), &needle)
                || matches_term(folder, &needle)
                || matches_term(eval.answer.as_deref(), &needle)
                || matches_term(name, &needle)
        })
        .collect()
}

fn matches_term(value: Option<&str>, needle: &str) -> bool {
    value
        .map(|v| v.to_lowercase().contains(needle))
        .unwrap_or(false)
}

pub fn page_count(total: usize) -> usize {
    total.div_ceil(PAGE_SIZE)
}

/// One-based page slice; out-of-range pages are empty.
pub fn page<T>(items: &[T], page: usize) -> &[T] {
    if page == 0 {
        return &[];
    }
    let start = (page - 1) * PAGE_SIZE;
    if start >= items.len() {
        return &[];
    }
    let end = (start + PAGE_SIZE).min(items.len());
    &items[start..end]
}
