//! Single handle over all repositories sharing one pool.

use sqlx::SqlitePool;

use crate::repos::{
    CorrespondenceRepository, CursorRepository, QuestionRepository, ReviewRepository,
    UserRepository,
};

/// Correspondence store used by the bot and the operator console.
#[derive(Clone)]
pub struct FeedbackStore {
    pool: SqlitePool,
    users: UserRepository,
    reviews: ReviewRepository,
    questions: QuestionRepository,
    correspondence: CorrespondenceRepository,
    cursor: CursorRepository,
}

impl FeedbackStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            reviews: ReviewRepository::new(pool.clone()),
            questions: QuestionRepository::new(pool.clone()),
            correspondence: CorrespondenceRepository::new(pool.clone()),
            cursor: CursorRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn users(&self) -> &UserRepository {
        &self.users
    }

    pub fn reviews(&self) -> &ReviewRepository {
        &self.reviews
    }

    pub fn questions(&self) -> &QuestionRepository {
        &self.questions
    }

    pub fn correspondence(&self) -> &CorrespondenceRepository {
        &self.correspondence
    }

    pub fn cursor(&self) -> &CursorRepository {
        &self.cursor
    }
}
