//! Repository implementations for database access
//!
//! Each repository borrows the pool and exposes one method per operation.
//! Statement bodies shared between pool and transaction callers are plain
//! functions generic over the sqlx executor.

pub mod diaries;
pub mod comments;

pub use diaries::{DbError, Diary, DiaryRepo, DiaryWithComments, Exchange};
pub use comments::{Comment, CommentRepo};
