//! API models for request and response payloads

use serde::{Deserialize, Serialize};

pub mod attendance;

use self::attendance::AttendanceStatus;

/// Body shared by the enrollment and check-in endpoints
#[derive(Debug, Deserialize)]
pub struct EmbeddingRequest {
    pub embedding: Vec<f64>,
}

/// Response for a saved reference embedding
#[derive(Debug, Serialize)]
pub struct SaveEmbeddingResponse {
    pub ok: bool,
    pub student_id: i64,
    pub saved_dims: usize,
}

/// Query parameters for a check-in
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CheckInQuery {
    pub course_id: i64,
    pub session_id: i64,
}

/// Response for a recorded check-in
#[derive(Debug, Serialize)]
pub struct CheckInResponse {
    pub ok: bool,
    pub matched_student_id: i64,
    /// Rounded to four decimal places
    pub similarity: f64,
    pub status: AttendanceStatus,
    pub course_id: i64,
    pub session_id: i64,
}
