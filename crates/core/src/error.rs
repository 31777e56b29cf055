use providers::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SurveyError {
    /// Listing or reading from a collaborator store failed. The session does
    /// not start; nothing is cached.
    #[error("retrieval failed: {0}")]
    Retrieval(#[source] StoreError),
    /// A write during submission failed. Collected answers are retained so
    /// the participant can retry.
    #[error("submission failed: {0}")]
    Submission(#[source] StoreError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("question {index} has no answer yet")]
    Unanswered { index: usize },
    #[error("already at the first question")]
    AtStart,
    #[error("session is not collecting answers")]
    NotCollecting,
    #[error("session is not ready to submit")]
    NotSubmittable,
}
