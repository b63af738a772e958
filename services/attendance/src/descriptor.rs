//! Descriptor length validation and truncation
//!
//! Applied identically on the enrollment and check-in paths so stored and
//! live vectors always end up the same length.

use crate::{
    config::DescriptorLimits,
    error::{ApiError, ApiResult},
};

/// Validate the length of a raw descriptor, truncate it to the canonical
/// dimension count and check the kept values can be compared
pub fn normalize_descriptor(mut raw: Vec<f64>, limits: &DescriptorLimits) -> ApiResult<Vec<f64>> {
    if raw.len() < limits.min_dims {
        return Err(ApiError::InvalidInput(format!(
            "embedding must have at least {} values (got {})",
            limits.min_dims,
            raw.len()
        )));
    }

    if raw.len() > limits.max_dims {
        return Err(ApiError::InvalidInput(format!(
            "embedding must have at most {} values (got {})",
            limits.max_dims,
            raw.len()
        )));
    }

    raw.truncate(limits.canonical_dims);

    if raw.iter().any(|value| !value.is_finite()) {
        return Err(ApiError::InvalidInput(
            "embedding values must be finite numbers".to_string(),
        ));
    }

    let squared_norm: f64 = raw.iter().map(|value| value * value).sum();
    if !squared_norm.is_finite() {
        return Err(ApiError::InvalidInput(
            "embedding magnitude is too large to compare".to_string(),
        ));
    }

    Ok(raw)
}
