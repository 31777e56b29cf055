use chrono::{Duration, Utc};
use providers::memory::MemoryStore;
use providers::{DocumentStore, Participant};
use rand::rngs::StdRng;
use rand::SeedableRng;
use survey_core::config::SelectionConfig;
use survey_core::error::{SessionError, SurveyError};
use survey_core::models::{Pick, Rating};
use survey_core::session::{Phase, SurveySession};
use survey_core::{materialize, selection};

fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.insert_folder(
        "Lecture_A",
        "2021-05-24_10-15",
        &["0.jpg", "face1-10_20_30_40.jpg", "face2-50_60_70_80.jpg"],
    );
    store.insert_folder(
        "Lecture_B",
        "2021-06-01_09-00",
        &["0.jpg", "face7-5_6_7_8.jpg"],
    );
    store
}

fn participant() -> Participant {
    Participant {
        name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
        gender: Some("Female".to_string()),
        ..Participant::default()
    }
}

async fn start_session(store: &MemoryStore) -> SurveySession {
    let cfg = SelectionConfig {
        max_select: 7,
        excluded_datasets: Vec::new(),
    };
    let mut rng = StdRng::seed_from_u64(42);
    let picks = selection::select_for_session(store, store, &cfg, &mut rng)
        .await
        .unwrap();
    let groups = materialize::materialize(store, &picks).await.unwrap();
    SurveySession::new(&groups, participant(), Utc::now())
}

#[tokio::test]
async fn groups_are_complete_with_resolved_urls() {
    let store = seeded_store();
    let picks = vec![
        Pick { dataset: "Lecture_A".into(), folder: "2021-05-24_10-15".into() },
        Pick { dataset: "Lecture_B".into(), folder: "2021-06-01_09-00".into() },
    ];

    let groups = materialize::materialize(&store, &picks).await.unwrap();
    assert_eq!(groups.len(), 2);
    for group in &groups {
        assert!(group.context.is_context);
        assert_eq!(group.context.file_name, "0");
        assert!(group.context.url.starts_with("memory://"));
        assert!(!group.evaluations.is_empty());
        assert!(group.evaluations.iter().all(|img| !img.is_context));
    }
    assert_eq!(groups[0].evaluations.len(), 2);
    assert_eq!(groups[1].evaluations.len(), 1);
}

#[tokio::test]
async fn incomplete_folders_are_dropped_silently() {
    let store = seeded_store();
    store.insert_folder("Lecture_C", "no-context", &["face1-1_2_3_4.jpg"]);
    store.insert_folder("Lecture_D", "no-faces", &["0.jpg"]);
    let picks = vec![
        Pick { dataset: "Lecture_C".into(), folder: "no-context".into() },
        Pick { dataset: "Lecture_D".into(), folder: "no-faces".into() },
        Pick { dataset: "Lecture_A".into(), folder: "2021-05-24_10-15".into() },
    ];

    let groups = materialize::materialize(&store, &picks).await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].context.dataset, "Lecture_A");
}

#[tokio::test]
async fn url_resolution_failure_aborts_materialization() {
    let store = seeded_store();
    store.set_fail_downloads(true);
    let picks = vec![Pick {
        dataset: "Lecture_A".into(),
        folder: "2021-05-24_10-15".into(),
    }];

    let result = materialize::materialize(&store, &picks).await;
    assert!(matches!(result, Err(SurveyError::Retrieval(_))));
}

#[tokio::test]
async fn full_session_persists_evaluations_then_summary() {
    let store = seeded_store();
    let mut session = start_session(&store).await;
    assert_eq!(session.len(), 3);

    let ratings = [Rating::Three, Rating::Unknown, Rating::Five];
    for rating in ratings {
        session.answer_current(rating).unwrap();
        session.advance().unwrap();
    }
    assert_eq!(session.phase(), Phase::Submitting);

    let completed_at = Utc::now() + Duration::seconds(90);
    session.submit(&store, completed_at).await.unwrap();
    assert_eq!(session.phase(), Phase::Completed);
    assert_eq!(store.evaluation_count(), 3);
    assert_eq!(store.session_count(), 1);

    let evaluations = store.list_evaluations().await.unwrap();
    for doc in &evaluations {
        let image = doc.image.as_ref().unwrap();
        let context = doc.context_image.as_ref().unwrap();
        assert_eq!(image.folder, context.folder);
        assert_eq!(context.file_name.as_deref(), Some("0"));
        assert!(doc.answer.is_some());
        assert_eq!(doc.participant.as_ref().unwrap().name, "Ada");
    }

    let summary = &store.list_sessions().await.unwrap()[0];
    assert_eq!(summary.total_evaluation_images, 3);
    assert_eq!(summary.total_questions, 1);
    assert_eq!(summary.answers.len(), 3);
    let metadata = summary.survey_metadata.as_ref().unwrap();
    // Whole seconds between session start and the supplied completion time.
    assert!((90..=92).contains(&metadata.session_duration));
    assert_eq!(metadata.completed_at, completed_at);
}

#[tokio::test]
async fn skipping_a_question_is_impossible() {
    let store = seeded_store();
    let mut session = start_session(&store).await;

    assert_eq!(session.advance(), Err(SessionError::Unanswered { index: 0 }));
    session.answer_current(Rating::One).unwrap();
    session.advance().unwrap();
    assert_eq!(session.advance(), Err(SessionError::Unanswered { index: 1 }));
}

#[tokio::test]
async fn failed_submission_keeps_answers_and_can_be_retried() {
    let store = seeded_store();
    let mut session = start_session(&store).await;
    let total = session.len();
    for _ in 0..total {
        session.answer_current(Rating::Two).unwrap();
        session.advance().unwrap();
    }

    store.set_fail_writes(true);
    let err = session.submit(&store, Utc::now()).await;
    assert!(matches!(err, Err(SurveyError::Submission(_))));
    assert_eq!(session.phase(), Phase::Failed);
    assert_eq!(store.session_count(), 0);

    store.set_fail_writes(false);
    session.submit(&store, Utc::now()).await.unwrap();
    assert_eq!(session.phase(), Phase::Completed);
    assert_eq!(store.evaluation_count(), total);
    assert_eq!(store.session_count(), 1);

    let summary = &store.list_sessions().await.unwrap()[0];
    assert!(summary
        .answers
        .iter()
        .all(|answer| answer.answer == Rating::Two.as_str()));
}

#[tokio::test]
async fn submitted_folders_are_excluded_from_the_next_session() {
    let store = seeded_store();
    let mut session = start_session(&store).await;
    for _ in 0..session.len() {
        session.answer_current(Rating::Four).unwrap();
        session.advance().unwrap();
    }
    session.submit(&store, Utc::now()).await.unwrap();

    let next = start_session(&store).await;
    assert!(next.is_empty());
}
