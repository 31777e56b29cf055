//! The survey session state machine: one question per evaluable image,
//! forward/backward navigation, batch submission.

use crate::error::{SessionError, SurveyError};
use crate::models::{Group, Rating, SurveyImage};
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use providers::{
    AnswerDoc, DocumentStore, EvaluationDoc, ImageRef, Participant, SessionDoc, SurveyMetadata,
};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Collecting,
    Submitting,
    Completed,
    Failed,
}

/// One flattened question: a face crop tagged with its group's context image.
#[derive(Debug, Clone)]
pub struct QuestionEntry {
    pub image: SurveyImage,
    pub context: SurveyImage,
}

/// Explicit session state. Answers overwrite in place, so navigating back and
/// re-answering replaces the earlier value for that position.
#[derive(Debug, Clone)]
pub struct SurveySession {
    participant: Participant,
    entries: Vec<QuestionEntry>,
    answers: Vec<Option<Rating>>,
    index: usize,
    started_at: DateTime<Utc>,
    phase: Phase,
}

impl SurveySession {
    pub fn new(groups: &[Group], participant: Participant, started_at: DateTime<Utc>) -> Self {
        let entries: Vec<QuestionEntry> = groups
            .iter()
            .flat_map(|group| {
                group.evaluations.iter().map(|image| QuestionEntry {
                    image: image.clone(),
                    context: group.context.clone(),
                })
            })
            .collect();
        let answers = vec![None; entries.len()];
        Self {
            participant,
            entries,
            answers,
            index: 0,
            started_at,
            phase: Phase::Collecting,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> Option<&QuestionEntry> {
        self.entries.get(self.index)
    }

    pub fn current_answer(&self) -> Option<Rating> {
        self.answers.get(self.index).copied().flatten()
    }

    /// Fill (or replace) the answer slot for the current question.
    pub fn answer_current(&mut self, rating: Rating) -> Result<(), SessionError> {
        if self.phase != Phase::Collecting {
            return Err(SessionError::NotCollecting);
        }
        let Some(slot) = self.answers.get_mut(self.index) else {
            return Err(SessionError::NotCollecting);
        };
        *slot = Some(rating);
        Ok(())
    }

    /// Move forward. Rejected while the current slot is unfilled — the
    /// participant cannot skip a question. Advancing past the last question
    /// enters `Submitting`.
    pub fn advance(&mut self) -> Result<Phase, SessionError> {
        if self.phase != Phase::Collecting {
            return Err(SessionError::NotCollecting);
        }
        match self.answers.get(self.index) {
            Some(Some(_)) => {}
            _ => return Err(SessionError::Unanswered { index: self.index }),
        }
        if self.index + 1 < self.entries.len() {
            self.index += 1;
        } else {
            self.phase = Phase::Submitting;
        }
        Ok(self.phase)
    }

    /// Move back one question. The slot being left keeps its answer.
    pub fn back(&mut self) -> Result<(), SessionError> {
        if self.phase != Phase::Collecting {
            return Err(SessionError::NotCollecting);
        }
        if self.index == 0 {
            return Err(SessionError::AtStart);
        }
        self.index -= 1;
        Ok(())
    }

    /// Persist the batch: every per-image evaluation concurrently, then —
    /// only after all of them resolved — the single session summary. Any
    /// failure leaves the session in `Failed` with all answers retained, so
    /// calling `submit` again retries the whole batch. A summary failure
    /// after the evaluations landed leaves orphaned evaluation records; that
    /// is accepted, a retry rewrites them.
    pub async fn submit(
        &mut self,
        store: &dyn DocumentStore,
        completed_at: DateTime<Utc>,
    ) -> Result<(), SurveyError> {
        match self.phase {
            Phase::Submitting | Phase::Failed => {}
            _ => return Err(SurveyError::Session(SessionError::NotSubmittable)),
        }
        self.phase = Phase::Submitting;

        let mut evaluations = Vec::with_capacity(self.entries.len());
        let mut answer_docs = Vec::with_capacity(self.entries.len());
        for (entry, answer) in self.entries.iter().zip(&self.answers) {
            let Some(rating) = answer else { continue };
            evaluations.push(EvaluationDoc {
                participant: Some(self.participant.clone()),
                image: Some(image_ref(&entry.image)),
                context_image: Some(image_ref(&entry.context)),
                answer: Some(rating.as_str().to_string()),
                timestamp: Some(completed_at),
            });
            answer_docs.push(AnswerDoc {
                answer: rating.as_str().to_string(),
                image: Some(image_ref(&entry.image)),
                context_image: Some(image_ref(&entry.context)),
                timestamp: Some(completed_at),
            });
        }

        let summary = SessionDoc {
            participant: Some(self.participant.clone()),
            answers: answer_docs,
            total_evaluation_images: self.entries.len() as u32,
            total_questions: 1,
            timestamp: Some(completed_at),
            survey_metadata: Some(SurveyMetadata {
                session_duration: (completed_at - self.started_at).num_seconds(),
                started_at: self.started_at,
                completed_at,
            }),
        };

        let written = async {
            try_join_all(evaluations.iter().map(|doc| store.add_evaluation(doc))).await?;
            store.add_session(&summary).await
        }
        .await;

        match written {
            Ok(_) => {
                info!(
                    evaluations = evaluations.len(),
                    duration_seconds = (completed_at - self.started_at).num_seconds(),
                    "session submitted"
                );
                self.phase = Phase::Completed;
                Ok(())
            }
            Err(e) => {
                self.phase = Phase::Failed;
                Err(SurveyError::Submission(e))
            }
        }
    }
}

fn image_ref(image: &SurveyImage) -> ImageRef {
    ImageRef {
        dataset: Some(image.dataset.clone()),
        folder: Some(image.folder.clone()),
        file_name: Some(image.file_name.clone()),
        image_name: Some(image.name.clone()),
        image_url: Some(image.url.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(file_name: &str, is_context: bool) -> SurveyImage {
        SurveyImage {
            name: format!("{}.jpg", file_name),
            file_name: file_name.to_string(),
            url: format!("memory://A/f1/{}.jpg", file_name),
            dataset: "A".to_string(),
            folder: "f1".to_string(),
            is_context,
        }
    }

    fn two_question_session() -> SurveySession {
        let group = Group {
            context: image("0", true),
            evaluations: vec![
                image("face1-10_20_30_40", false),
                image("face2-50_60_70_80", false),
            ],
        };
        SurveySession::new(&[group], Participant::default(), Utc::now())
    }

    #[test]
    fn flattening_tags_each_question_with_its_context() {
        let session = two_question_session();
        assert_eq!(session.len(), 2);
        let entry = session.current().unwrap();
        assert!(entry.context.is_context);
        assert_eq!(entry.image.file_name, "face1-10_20_30_40");
    }

    #[test]
    fn advance_is_rejected_while_unanswered() {
        let mut session = two_question_session();
        assert_eq!(
            session.advance(),
            Err(SessionError::Unanswered { index: 0 })
        );
        assert_eq!(session.index(), 0);
        assert_eq!(session.phase(), Phase::Collecting);
    }

    #[test]
    fn back_keeps_the_answer_and_reanswer_overwrites() {
        let mut session = two_question_session();
        session.answer_current(Rating::Three).unwrap();
        session.advance().unwrap();
        session.back().unwrap();
        assert_eq!(session.current_answer(), Some(Rating::Three));

        session.answer_current(Rating::Unknown).unwrap();
        assert_eq!(session.current_answer(), Some(Rating::Unknown));
    }

    #[test]
    fn back_at_start_is_rejected() {
        let mut session = two_question_session();
        assert_eq!(session.back(), Err(SessionError::AtStart));
    }

    #[test]
    fn answering_the_last_question_enters_submitting() {
        let mut session = two_question_session();
        session.answer_current(Rating::One).unwrap();
        assert_eq!(session.advance(), Ok(Phase::Collecting));
        session.answer_current(Rating::Five).unwrap();
        assert_eq!(session.advance(), Ok(Phase::Submitting));
        assert_eq!(session.advance(), Err(SessionError::NotCollecting));
    }

    #[tokio::test]
    async fn submit_before_collection_finished_is_rejected() {
        let mut session = two_question_session();
        let store = providers::memory::MemoryStore::new();
        let err = session.submit(&store, Utc::now()).await;
        assert!(matches!(
            err,
            Err(SurveyError::Session(SessionError::NotSubmittable))
        ));
    }
}
