//! # Feedback Log
//!
//! Page feedback kept locally. Nothing is sent anywhere.

use crate::PlaybookError;
use crate::primitives::MAX_FEEDBACK_COMMENT_LENGTH;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Lowest accepted rating.
pub const MIN_RATING: u8 = 1;

/// Highest accepted rating.
pub const MAX_RATING: u8 = 5;

/// One submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub page: String,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// Every submission, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedbackLog(Vec<FeedbackEntry>);

impl FeedbackLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and append a submission.
    pub fn submit(
        &mut self,
        page: &str,
        rating: u8,
        comment: &str,
        now: OffsetDateTime,
    ) -> Result<&FeedbackEntry, PlaybookError> {
        let page = page.trim();
        if page.is_empty() {
            return Err(PlaybookError::InvalidInput(
                "Feedback page must be non-empty".to_string(),
            ));
        }
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(PlaybookError::InvalidInput(format!(
                "Rating must be between {} and {}, got {}",
                MIN_RATING, MAX_RATING, rating
            )));
        }
        let comment = comment.trim();
        if comment.chars().count() > MAX_FEEDBACK_COMMENT_LENGTH {
            return Err(PlaybookError::InvalidInput(format!(
                "Comment exceeds {} characters",
                MAX_FEEDBACK_COMMENT_LENGTH
            )));
        }

        self.0.push(FeedbackEntry {
            page: page.to_string(),
            rating,
            comment: comment.to_string(),
            timestamp: now,
        });
        Ok(&self.0[self.0.len() - 1])
    }

    #[must_use]
    pub fn entries(&self) -> &[FeedbackEntry] {
        &self.0
    }

    /// Mean rating in tenths (4.5 stars = 45). `None` when empty.
    #[must_use]
    pub fn average_rating_tenths(&self) -> Option<u32> {
        if self.0.is_empty() {
            return None;
        }
        let sum: u32 = self.0.iter().map(|e| u32::from(e.rating)).sum();
        Some(sum * 10 / self.0.len() as u32)
    }
}
