//! Review reports for employees.

use chrono::{DateTime, Duration, Months, NaiveTime, Utc};
use feedback_database::{FeedbackStore, RatingCounts, Review};
use feedback_telegram::{ChatId, Keyboard, MessagingGateway};
use std::sync::Arc;
use tracing::debug;

use crate::error::BotResult;
use crate::rating::stars;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportInterval {
    Day,
    Week,
    Month,
    /// Counts per rating over every review ever left.
    All,
}

impl ReportInterval {
    /// `[tomorrow midnight - interval, tomorrow midnight]` in UTC; `None` for [`ReportInterval::All`].
    pub fn range(self, now: DateTime<Utc>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let tomorrow = (now.date_naive() + Duration::days(1))
            .and_time(NaiveTime::MIN)
            .and_utc();

        let from = match self {
            Self::Day => tomorrow - Duration::days(1),
            Self::Week => tomorrow - Duration::days(7),
            Self::Month => tomorrow.checked_sub_months(Months::new(1))?,
            Self::All => return None,
        };
        Some((from, tomorrow))
    }
}

pub fn format_review(review: &Review) -> String {
    format!("{}\n{}", stars(review.rating), review.text)
}

pub fn format_counts(counts: &RatingCounts) -> String {
    counts
        .iter()
        .map(|(rating, count)| format!("{} - {count}\n", stars(i64::from(rating))))
        .collect()
}

#[derive(Clone)]
pub struct ReviewReporter {
    store: FeedbackStore,
    gateway: Arc<dyn MessagingGateway>,
}

impl ReviewReporter {
    pub fn new(store: FeedbackStore, gateway: Arc<dyn MessagingGateway>) -> Self {
        Self { store, gateway }
    }

    /// Send the report for `interval`. Returns the number of messages delivered.
    pub async fn send_report(
        &self,
        chat_id: ChatId,
        interval: ReportInterval,
        now: DateTime<Utc>,
    ) -> BotResult<usize> {
        let Some((from, to)) = interval.range(now) else {
            let counts = self.store.reviews().count_by_rating().await?;
            self.gateway
                .send_text(chat_id, &format_counts(&counts), Keyboard::None)
                .await?;
            return Ok(1);
        };

        let reviews = self.store.reviews().list_in_range(from, to).await?;
        debug!(chat_id, ?interval, count = reviews.len(), "sending review report");

        for review in &reviews {
            self.gateway
                .send_text(chat_id, &format_review(review), Keyboard::None)
                .await?;
        }
        Ok(reviews.len())
    }
}
