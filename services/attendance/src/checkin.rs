//! Matching a live descriptor and recording attendance

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::{
    config::MatchingConfig,
    descriptor::normalize_descriptor,
    error::{ApiError, ApiResult},
    matching::{attendance_status, best_match, round_similarity},
    models::attendance::{AttendanceRecord, AttendanceStatus},
    repositories::AttendanceStore,
};

/// Result of a recorded check-in
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckInOutcome {
    pub matched_student_id: i64,
    /// Rounded to four decimal places
    pub similarity: f64,
    pub status: AttendanceStatus,
    pub course_id: i64,
    pub session_id: i64,
}

/// Match a live descriptor against the course's enrolled students and upsert
/// the attendance of the best match
///
/// `now` decides present/late and is stored as the record timestamp.
pub async fn check_in<S: AttendanceStore>(
    store: &S,
    config: &MatchingConfig,
    course_id: i64,
    session_id: i64,
    embedding: Vec<f64>,
    now: DateTime<Utc>,
) -> ApiResult<CheckInOutcome> {
    let live = normalize_descriptor(embedding, &config.limits)?;

    let session = store
        .find_session(session_id, course_id)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!(
                "session {} not found for course {}",
                session_id, course_id
            ))
        })?;

    let candidates = store.course_embeddings(course_id).await?;
    if candidates.is_empty() {
        return Err(ApiError::NotFound(format!(
            "no enrolled student of course {} has a saved embedding",
            course_id
        )));
    }

    let best = best_match(&live, &candidates)
        .filter(|best| best.similarity >= config.match_threshold)
        .ok_or_else(|| {
            warn!(course_id, session_id, "No student matched above threshold");
            ApiError::NotFound("no matching student".to_string())
        })?;

    let status = attendance_status(&session, now);

    store
        .upsert_attendance(&AttendanceRecord {
            session_id,
            student_id: best.student_id,
            status,
            marked_at: now,
        })
        .await?;

    info!(
        course_id = session.course_id,
        session_id = session.id,
        student_id = best.student_id,
        similarity = best.similarity,
        status = status.as_str(),
        "Recorded attendance"
    );

    Ok(CheckInOutcome {
        matched_student_id: best.student_id,
        similarity: round_similarity(best.similarity),
        status,
        course_id,
        session_id,
    })
}
