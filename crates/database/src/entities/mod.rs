//! Domain entities for the database layer

pub mod correspondence;
pub mod question;
pub mod review;
pub mod user;

pub use correspondence::{CorrespondenceEntry, NewCorrespondenceEntry};
pub use question::Question;
pub use review::{Review, RatingCounts, NO_COMMENT};
pub use user::{ParticipantState, User};

use chrono::{DateTime, SecondsFormat, Utc};

/// Fixed-width UTC timestamp so that stored values sort lexicographically.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}
