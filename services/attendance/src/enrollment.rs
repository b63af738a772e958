//! Saving a student's reference embedding

use tracing::info;

use crate::{
    config::MatchingConfig,
    descriptor::normalize_descriptor,
    error::{ApiError, ApiResult},
    repositories::AttendanceStore,
};

/// Result of a successful save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavedEmbedding {
    pub student_id: i64,
    pub saved_dims: usize,
}

/// Validate and upsert the reference embedding of a student
///
/// The latest save always replaces any earlier one.
pub async fn save_student_embedding<S: AttendanceStore>(
    store: &S,
    config: &MatchingConfig,
    student_id: i64,
    embedding: Vec<f64>,
) -> ApiResult<SavedEmbedding> {
    let embedding = normalize_descriptor(embedding, &config.limits)?;

    let user = store
        .find_user(student_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("student {} not found", student_id)))?;

    if !user.is_student() {
        return Err(ApiError::InvalidInput(format!(
            "user {} has role '{}', only students can enroll a face embedding",
            user.id, user.role
        )));
    }

    store.upsert_student_embedding(student_id, &embedding).await?;

    info!(student_id, dims = embedding.len(), "Saved student embedding");

    Ok(SavedEmbedding {
        student_id,
        saved_dims: embedding.len(),
    })
}
