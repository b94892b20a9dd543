//! Domain values with validation at construction
//!
//! All user input is validated when creating these types.
//! Invalid input returns ValidationError, not panic.

pub mod validation;
pub mod author;
pub mod content;

pub use validation::ValidationError;
pub use author::AuthorName;
pub use content::{CommentContent, DiaryContent};
