//! Shared types and result types for the database layer

pub mod errors;

pub use errors::DatabaseError;

pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Stable chat identity assigned by the transport.
pub type ChatId = i64;

/// Row id of a participant.
pub type UserId = i64;

/// Row id of a question; also the number shown to participants.
pub type QuestionId = i64;

/// Transport-assigned id of a message inside one chat.
pub type MessageId = i64;
