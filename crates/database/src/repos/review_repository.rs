//! Repository for review data access operations.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::entities::{format_timestamp, now_timestamp, RatingCounts, Review};
use crate::types::{DatabaseError, DatabaseResult, UserId};

const REVIEW_COLUMNS: &str = "id, user_id, rating, text, created_at, updated_at";

/// Repository for review database operations
#[derive(Clone)]
pub struct ReviewRepository {
    pool: SqlitePool,
}

impl ReviewRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a rating; the comment stays empty until the customer answers.
    pub async fn create(&self, user_id: UserId, rating: u8) -> DatabaseResult<Review> {
        if !(1..=5).contains(&rating) {
            return Err(DatabaseError::validation(format!(
                "rating must be between 1 and 5, got {rating}"
            )));
        }

        let now = now_timestamp();
        let id = sqlx::query(
            "INSERT INTO reviews (user_id, rating, text, created_at, updated_at) VALUES (?, ?, '', ?, ?)",
        )
        .bind(user_id)
        .bind(i64::from(rating))
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        info!(review_id = id, user_id, rating, "review created");

        Ok(Review {
            id,
            user_id,
            rating: i64::from(rating),
            text: String::new(),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// The participant's most recent review still waiting for its comment.
    pub async fn find_awaiting_comment(&self, user_id: UserId) -> DatabaseResult<Option<Review>> {
        let review = sqlx::query_as::<_, Review>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE user_id = ? AND text = '' ORDER BY id DESC LIMIT 1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(review)
    }

    pub async fn update_text(&self, id: i64, text: &str) -> DatabaseResult<()> {
        let result = sqlx::query("UPDATE reviews SET text = ?, updated_at = ? WHERE id = ?")
            .bind(text)
            .bind(now_timestamp())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found(format!("review {id}")));
        }
        Ok(())
    }

    /// Fill in the pending review's comment. Returns `None` when nothing was pending.
    pub async fn complete_pending(
        &self,
        user_id: UserId,
        text: &str,
    ) -> DatabaseResult<Option<Review>> {
        let Some(mut review) = self.find_awaiting_comment(user_id).await? else {
            debug!(user_id, "no review awaiting a comment");
            return Ok(None);
        };

        self.update_text(review.id, text).await?;
        review.text = text.to_string();
        Ok(Some(review))
    }

    /// Reviews created between `from` and `to` (both inclusive), oldest first.
    pub async fn list_in_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DatabaseResult<Vec<Review>> {
        let reviews = sqlx::query_as::<_, Review>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE created_at BETWEEN ? AND ? ORDER BY id ASC"
        ))
        .bind(format_timestamp(from))
        .bind(format_timestamp(to))
        .fetch_all(&self.pool)
        .await?;

        Ok(reviews)
    }

    pub async fn count_by_rating(&self) -> DatabaseResult<RatingCounts> {
        let rows: Vec<(i64, i64)> =
            sqlx::query_as("SELECT rating, COUNT(*) FROM reviews GROUP BY rating")
                .fetch_all(&self.pool)
                .await?;

        let mut counts = RatingCounts::default();
        for (rating, count) in rows {
            if let Some(slot) = usize::try_from(rating - 1)
                .ok()
                .and_then(|index| counts.0.get_mut(index))
            {
                *slot = count;
            }
        }
        Ok(counts)
    }
}
