//! Cosine similarity, best-match selection and the on-time decision

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::warn;

use crate::models::attendance::{AttendanceStatus, Session, StoredEmbedding};

/// Returned for inputs that cannot be compared; lower than any real score
pub const INCOMPARABLE: f64 = -1.0;

/// Cosine similarity in [-1, 1]
///
/// Returns [`INCOMPARABLE`] when the vectors differ in length, either is
/// empty, either has zero magnitude, or the arithmetic overflows.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return INCOMPARABLE;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return INCOMPARABLE;
    }

    let similarity = dot / (norm_a.sqrt() * norm_b.sqrt());
    if !similarity.is_finite() || !norm_a.is_finite() || !norm_b.is_finite() {
        return INCOMPARABLE;
    }

    similarity
}

/// Highest-scoring candidate of a scan
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestMatch {
    pub student_id: i64,
    pub similarity: f64,
}

/// Scan every candidate and keep the most similar one
///
/// Candidates whose stored value is not a numeric array are skipped. The
/// comparison is strict, so on a tie the candidate seen first wins; callers
/// supply candidates in a stable order. Returns `None` when no candidate
/// could be decoded.
pub fn best_match(live: &[f64], candidates: &[StoredEmbedding]) -> Option<BestMatch> {
    let mut best: Option<BestMatch> = None;

    for candidate in candidates {
        let stored = match Vec::<f64>::deserialize(&candidate.embedding) {
            Ok(values) => values,
            Err(e) => {
                warn!(
                    student_id = candidate.student_id,
                    "Skipping undecodable stored embedding: {}", e
                );
                continue;
            }
        };

        let similarity = cosine_similarity(live, &stored);
        match best {
            Some(current) if similarity <= current.similarity => {}
            _ => {
                best = Some(BestMatch {
                    student_id: candidate.student_id,
                    similarity,
                })
            }
        }
    }

    best
}

/// `present` up to and including the session's late cutoff, `late` after it
pub fn attendance_status(session: &Session, now: DateTime<Utc>) -> AttendanceStatus {
    if now <= session.late_cutoff() {
        AttendanceStatus::Present
    } else {
        AttendanceStatus::Late
    }
}

/// Round a similarity score to four decimal places for display
pub fn round_similarity(similarity: f64) -> f64 {
    (similarity * 10_000.0).round() / 10_000.0
}
