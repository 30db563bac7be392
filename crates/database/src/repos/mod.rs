//! Database repository implementations

pub mod correspondence_repository;
pub mod cursor_repository;
pub mod question_repository;
pub mod review_repository;
pub mod user_repository;

// Re-export all repositories for convenience
pub use correspondence_repository::*;
pub use cursor_repository::*;
pub use question_repository::*;
pub use review_repository::*;
pub use user_repository::*;
