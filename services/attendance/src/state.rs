//! Application state shared across handlers

use crate::config::MatchingConfig;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState<S> {
    pub store: S,
    pub matching: MatchingConfig,
}

impl<S> AppState<S> {
    pub fn new(store: S, matching: MatchingConfig) -> Self {
        Self { store, matching }
    }
}
