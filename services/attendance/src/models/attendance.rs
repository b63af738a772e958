//! Domain models for users, sessions, embeddings and attendance records

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Role a user must hold to own a reference embedding
pub const STUDENT_ROLE: &str = "student";

/// User row as far as this service is concerned
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub role: String,
}

impl User {
    pub fn is_student(&self) -> bool {
        self.role == STUDENT_ROLE
    }
}

/// A scheduled class meeting
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: i64,
    pub course_id: i64,
    pub start_time: DateTime<Utc>,
    /// Grace period in minutes; `None` means no grace period
    pub late_after_minutes: Option<i32>,
}

impl Session {
    /// Last instant at which a check-in still counts as on time
    pub fn late_cutoff(&self) -> DateTime<Utc> {
        self.start_time + Duration::minutes(i64::from(self.late_after_minutes.unwrap_or(0)))
    }
}

/// A stored reference embedding as read back from the store
///
/// The value is kept undecoded so that one corrupt row can be skipped
/// during matching without failing the whole candidate load.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEmbedding {
    pub student_id: i64,
    pub embedding: serde_json::Value,
}

/// Outcome of the on-time check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Late,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Late => "late",
        }
    }
}

/// Attendance row written by a successful check-in
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceRecord {
    pub session_id: i64,
    pub student_id: i64,
    pub status: AttendanceStatus,
    pub marked_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_late_cutoff_adds_grace_period() {
        let session = Session {
            id: 1,
            course_id: 1,
            start_time: Utc.with_ymd_and_hms(2024, 9, 2, 9, 0, 0).unwrap(),
            late_after_minutes: Some(10),
        };
        assert_eq!(
            session.late_cutoff(),
            Utc.with_ymd_and_hms(2024, 9, 2, 9, 10, 0).unwrap()
        );
    }

    #[test]
    fn test_late_cutoff_without_grace_period() {
        let start = Utc.with_ymd_and_hms(2024, 9, 2, 9, 0, 0).unwrap();
        let session = Session {
            id: 1,
            course_id: 1,
            start_time: start,
            late_after_minutes: None,
        };
        assert_eq!(session.late_cutoff(), start);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(AttendanceStatus::Late).unwrap(),
            serde_json::json!("late")
        );
        assert_eq!(AttendanceStatus::Present.as_str(), "present");
    }
}
