//! PostgreSQL implementation of the attendance store

use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgPool, Row, types::Json};
use tracing::warn;

use crate::models::attendance::{AttendanceRecord, Session, StoredEmbedding, User};

use super::AttendanceStore;

/// Attendance store backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgAttendanceStore {
    pool: PgPool,
}

impl PgAttendanceStore {
    /// Create a new store over an initialized pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl AttendanceStore for PgAttendanceStore {
    async fn find_user(&self, user_id: i64) -> DatabaseResult<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id::BIGINT AS id, role::TEXT AS role
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        match row {
            Some(row) => Ok(Some(User {
                id: row.try_get("id").map_err(DatabaseError::Query)?,
                role: row.try_get("role").map_err(DatabaseError::Query)?,
            })),
            None => Ok(None),
        }
    }

    async fn upsert_student_embedding(&self, student_id: i64, embedding: &[f64]) -> DatabaseResult<()> {
        sqlx::query(
            r#"
            INSERT INTO student_embeddings (student_id, embedding, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (student_id)
            DO UPDATE SET embedding = EXCLUDED.embedding, updated_at = NOW()
            "#,
        )
        .bind(student_id)
        .bind(Json(embedding))
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(())
    }

    async fn find_session(&self, session_id: i64, course_id: i64) -> DatabaseResult<Option<Session>> {
        // A naive TIMESTAMP column is read in the connection's TimeZone.
        let row = sqlx::query(
            r#"
            SELECT id::BIGINT AS id,
                   course_id::BIGINT AS course_id,
                   start_time::TIMESTAMPTZ AS start_time,
                   late_after_minutes::INT AS late_after_minutes
            FROM sessions
            WHERE id = $1 AND course_id = $2
            "#,
        )
        .bind(session_id)
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        match row {
            Some(row) => Ok(Some(Session {
                id: row.try_get("id").map_err(DatabaseError::Query)?,
                course_id: row.try_get("course_id").map_err(DatabaseError::Query)?,
                start_time: row.try_get("start_time").map_err(DatabaseError::Query)?,
                late_after_minutes: row
                    .try_get("late_after_minutes")
                    .map_err(DatabaseError::Query)?,
            })),
            None => Ok(None),
        }
    }

    async fn course_embeddings(&self, course_id: i64) -> DatabaseResult<Vec<StoredEmbedding>> {
        let rows = sqlx::query(
            r#"
            SELECT se.student_id::BIGINT AS student_id, se.embedding
            FROM student_embeddings se
            JOIN enrollments e ON e.student_id = se.student_id
            WHERE e.course_id = $1
            ORDER BY se.student_id
            "#,
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        rows.into_iter()
            .map(|row| -> DatabaseResult<StoredEmbedding> {
                let student_id: i64 = row.try_get("student_id").map_err(DatabaseError::Query)?;
                // Left as Null on a type mismatch; the matcher skips it.
                let embedding = row
                    .try_get::<serde_json::Value, _>("embedding")
                    .unwrap_or_else(|e| {
                        warn!(student_id, "Stored embedding is not JSON: {}", e);
                        serde_json::Value::Null
                    });
                Ok(StoredEmbedding {
                    student_id,
                    embedding,
                })
            })
            .collect()
    }

    async fn upsert_attendance(&self, record: &AttendanceRecord) -> DatabaseResult<()> {
        sqlx::query(
            r#"
            INSERT INTO attendance (session_id, student_id, status, marked_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (session_id, student_id)
            DO UPDATE SET status = EXCLUDED.status, marked_at = EXCLUDED.marked_at
            "#,
        )
        .bind(record.session_id)
        .bind(record.student_id)
        .bind(record.status.as_str())
        .bind(record.marked_at)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(())
    }

    async fn ping(&self) -> DatabaseResult<bool> {
        common::database::health_check(&self.pool).await
    }
}
