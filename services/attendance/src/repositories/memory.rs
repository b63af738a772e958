//! In-memory attendance store used by tests

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard},
};

use common::error::DatabaseResult;
use serde_json::Value;

use crate::models::attendance::{AttendanceRecord, Session, StoredEmbedding, User};

use super::AttendanceStore;

#[derive(Default)]
struct Tables {
    users: HashMap<i64, User>,
    embeddings: BTreeMap<i64, Value>,
    enrollments: HashSet<(i64, i64)>,
    sessions: HashMap<i64, Session>,
    attendance: HashMap<(i64, i64), AttendanceRecord>,
}

/// Store keeping every table in process memory
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().expect("memory store lock poisoned")
    }

    pub fn add_user(&self, id: i64, role: &str) {
        self.tables().users.insert(
            id,
            User {
                id,
                role: role.to_string(),
            },
        );
    }

    pub fn enroll(&self, course_id: i64, student_id: i64) {
        self.tables().enrollments.insert((course_id, student_id));
    }

    pub fn add_session(&self, session: Session) {
        self.tables().sessions.insert(session.id, session);
    }

    /// Store a raw embedding value, bypassing validation
    pub fn put_raw_embedding(&self, student_id: i64, value: Value) {
        self.tables().embeddings.insert(student_id, value);
    }

    pub fn embedding_of(&self, student_id: i64) -> Option<Vec<f64>> {
        self.tables()
            .embeddings
            .get(&student_id)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    pub fn embedding_count(&self) -> usize {
        self.tables().embeddings.len()
    }

    pub fn attendance_records(&self) -> Vec<AttendanceRecord> {
        self.tables().attendance.values().cloned().collect()
    }
}

impl AttendanceStore for MemoryStore {
    async fn find_user(&self, user_id: i64) -> DatabaseResult<Option<User>> {
        Ok(self.tables().users.get(&user_id).cloned())
    }

    async fn upsert_student_embedding(&self, student_id: i64, embedding: &[f64]) -> DatabaseResult<()> {
        self.tables()
            .embeddings
            .insert(student_id, serde_json::json!(embedding));
        Ok(())
    }

    async fn find_session(&self, session_id: i64, course_id: i64) -> DatabaseResult<Option<Session>> {
        Ok(self
            .tables()
            .sessions
            .get(&session_id)
            .filter(|session| session.course_id == course_id)
            .cloned())
    }

    async fn course_embeddings(&self, course_id: i64) -> DatabaseResult<Vec<StoredEmbedding>> {
        let tables = self.tables();
        Ok(tables
            .embeddings
            .iter()
            .filter(|(student_id, _)| tables.enrollments.contains(&(course_id, **student_id)))
            .map(|(student_id, embedding)| StoredEmbedding {
                student_id: *student_id,
                embedding: embedding.clone(),
            })
            .collect())
    }

    async fn upsert_attendance(&self, record: &AttendanceRecord) -> DatabaseResult<()> {
        self.tables()
            .attendance
            .insert((record.session_id, record.student_id), record.clone());
        Ok(())
    }

    async fn ping(&self) -> DatabaseResult<bool> {
        Ok(true)
    }
}
