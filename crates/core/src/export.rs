//! Flat CSV views of the stored collections for the admin surface.

use chrono::{DateTime, Utc};
use providers::{EvaluationDoc, Participant, SessionDoc};
use regex::Regex;
use std::sync::OnceLock;

/// Face index and bounding box recovered from an evaluation filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceInfo {
    pub face: String,
    pub bbox: Option<[String; 4]>,
}

fn face_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^face(\d+)-(\d+)_(\d+)_(\d+)_(\d+)$").expect("face regex"))
}

/// Parse `face<N>-<x1>_<y1>_<x2>_<y2>` out of a filename. Falls back to an
/// underscore split into five tokens (an older naming scheme), and finally to
/// the whole stem with no bounding box. Never fails: malformed names degrade
/// to placeholders in the export.
pub fn parse_face_info(file_name: &str) -> FaceInfo {
    let stem = file_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(file_name);

    if let Some(captures) = face_pattern().captures(stem) {
        return FaceInfo {
            face: captures[1].to_string(),
            bbox: Some([
                captures[2].to_string(),
                captures[3].to_string(),
                captures[4].to_string(),
                captures[5].to_string(),
            ]),
        };
    }

    let parts: Vec<&str> = stem.split('_').collect();
    if parts.len() >= 5 {
        return FaceInfo {
            face: parts[0].to_string(),
            bbox: Some([
                parts[1].to_string(),
                parts[2].to_string(),
                parts[3].to_string(),
                parts[4].to_string(),
            ]),
        };
    }

    FaceInfo {
        face: stem.to_string(),
        bbox: None,
    }
}

pub const DATASET_HEADERS: [&str; 11] = [
    "dataset",
    "datetime",
    "face",
    "face_bbox_x1",
    "face_bbox_y1",
    "face_bbox_x2",
    "face_bbox_y2",
    "engagement",
    "participant_name",
    "participant_email",
    "survey_timestamp",
];

/// One evaluation per row; the `datetime` column carries the folder name,
/// which encodes the capture moment.
pub fn dataset_csv(evaluations: &[EvaluationDoc]) -> String {
    let mut out = String::new();
    push_row(&mut out, DATASET_HEADERS.iter().copied());
    for eval in evaluations {
        let image = eval.image.as_ref();
        let info = image
            .and_then(|image| image.file_name.as_deref())
            .map(parse_face_info);
        let bbox = info.as_ref().and_then(|info| info.bbox.as_ref());
        let bbox_field =
            |i: usize| bbox.map(|b| b[i].as_str()).unwrap_or("N/A").to_string();
        let row = [
            image
                .and_then(|image| image.dataset.as_deref())
                .unwrap_or("N/A")
                .to_string(),
            image
                .and_then(|image| image.folder.as_deref())
                .unwrap_or("N/A")
                .to_string(),
            info.as_ref()
                .map(|info| info.face.clone())
                .unwrap_or_else(|| "N/A".to_string()),
            bbox_field(0),
            bbox_field(1),
            bbox_field(2),
            bbox_field(3),
            eval.answer.clone().unwrap_or_else(|| "N/A".to_string()),
            participant_name(eval.participant.as_ref()),
            participant_email(eval.participant.as_ref()),
            format_timestamp(eval.timestamp),
        ];
        push_row(&mut out, row.iter().map(String::as_str));
    }
    out
}

pub const SESSION_HEADERS: [&str; 7] = [
    "participant_name",
    "participant_email",
    "total_images",
    "total_questions",
    "duration_seconds",
    "started_at",
    "completed_at",
];

/// One session summary per row.
pub fn sessions_csv(sessions: &[SessionDoc]) -> String {
    let mut out = String::new();
    push_row(&mut out, SESSION_HEADERS.iter().copied());
    for session in sessions {
        let metadata = session.survey_metadata.as_ref();
        let row = [
            participant_name(session.participant.as_ref()),
            participant_email(session.participant.as_ref()),
            session.total_evaluation_images.to_string(),
            session.total_questions.to_string(),
            metadata
                .map(|m| m.session_duration.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            format_timestamp(metadata.map(|m| m.started_at)),
            format_timestamp(metadata.map(|m| m.completed_at)),
        ];
        push_row(&mut out, row.iter().map(String::as_str));
    }
    out
}

fn participant_name(participant: Option<&Participant>) -> String {
    match participant {
        Some(p) if !p.name.is_empty() => p.name.clone(),
        _ => "Anonymous".to_string(),
    }
}

fn participant_email(participant: Option<&Participant>) -> String {
    match participant {
        Some(p) if !p.email.is_empty() => p.email.clone(),
        _ => "Anonymous".to_string(),
    }
}

fn format_timestamp(timestamp: Option<DateTime<Utc>>) -> String {
    timestamp
        .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

fn push_row<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>) {
    let mut first = true;
    for field in fields {
        if !first {
            out.push(',');
        }
        first = false;
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    }
    out.push('\n');
}
