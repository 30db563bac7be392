//! Feedback Desk Database Crate
//!
//! Connection management, migrations, entities and repositories for the
//! participants, reviews, questions and correspondence the bot works with.

use feedback_config::DatabaseConfig;
use sqlx::SqlitePool;

pub mod connection;
pub mod entities;
pub mod migrations;
pub mod repos;
pub mod store;
pub mod types;

pub use connection::prepare_database;
pub use migrations::run_migrations;
pub use store::FeedbackStore;

// Re-export repositories
pub use repos::{
    CorrespondenceRepository, CursorRepository, QuestionRepository, ReviewRepository,
    UserRepository,
};

// Re-export entities
pub use entities::{
    format_timestamp, CorrespondenceEntry, NewCorrespondenceEntry, ParticipantState, Question,
    RatingCounts, Review, User, NO_COMMENT,
};

// Re-export types
pub use types::{ChatId, DatabaseError, DatabaseResult, MessageId, QuestionId, UserId};

/// Initialize the database with migrations
pub async fn initialize_database(config: &DatabaseConfig) -> DatabaseResult<SqlitePool> {
    let pool = prepare_database(config)
        .await
        .map_err(|e| DatabaseError::ConnectionError(format!("{e:#}")))?;

    run_migrations(&pool)
        .await
        .map_err(|e| DatabaseError::MigrationError(format!("{e:#}")))?;

    Ok(pool)
}
