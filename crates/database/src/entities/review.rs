//! Review entity definitions

use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// Comment written when the customer closes the comment prompt without text.
pub const NO_COMMENT: &str = "-";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Review {
    pub id: i64,
    pub user_id: UserId,
    pub rating: i64,
    /// Empty until the customer answers the comment prompt.
    pub text: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Review {
    pub fn awaiting_comment(&self) -> bool {
        self.text.is_empty()
    }
}

/// Number of reviews per rating, index 0 holding one-star reviews.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingCounts(pub [i64; 5]);

impl RatingCounts {
    pub fn get(&self, rating: u8) -> i64 {
        match rating {
            1..=5 => self.0[usize::from(rating - 1)],
            _ => 0,
        }
    }

    pub fn total(&self) -> i64 {
        self.0.iter().sum()
    }

    /// `(rating, count)` pairs from one star upwards.
    pub fn iter(&self) -> impl Iterator<Item = (u8, i64)> + '_ {
        (1u8..=5).zip(self.0.iter().copied())
    }
}
