//! Repositories for database operations
//!
//! Handlers and the enrollment/check-in operations only see the
//! [`AttendanceStore`] trait. [`postgres::PgAttendanceStore`] is the
//! production implementation; tests use an in-memory one.

use std::future::Future;

use common::error::DatabaseResult;

use crate::models::attendance::{AttendanceRecord, Session, StoredEmbedding, User};

#[cfg(test)]
pub mod memory;
pub mod postgres;

/// Reads and upserts required by enrollment and check-in
pub trait AttendanceStore: Clone + Send + Sync + 'static {
    /// Find a user by id
    fn find_user(&self, user_id: i64) -> impl Future<Output = DatabaseResult<Option<User>>> + Send;

    /// Insert or replace the reference embedding of a student
    fn upsert_student_embedding(
        &self,
        student_id: i64,
        embedding: &[f64],
    ) -> impl Future<Output = DatabaseResult<()>> + Send;

    /// Find a session only if it belongs to the given course
    fn find_session(
        &self,
        session_id: i64,
        course_id: i64,
    ) -> impl Future<Output = DatabaseResult<Option<Session>>> + Send;

    /// Reference embeddings of every student enrolled in a course, ordered by
    /// student id
    fn course_embeddings(
        &self,
        course_id: i64,
    ) -> impl Future<Output = DatabaseResult<Vec<StoredEmbedding>>> + Send;

    /// Insert or overwrite the attendance row of a (session, student) pair
    fn upsert_attendance(
        &self,
        record: &AttendanceRecord,
    ) -> impl Future<Output = DatabaseResult<()>> + Send;

    /// Check that the store is reachable
    fn ping(&self) -> impl Future<Output = DatabaseResult<bool>> + Send;
}
