//! Diary and comment body validation

use super::ValidationError;

/// Maximum size of a diary body (256KB). Diaries are rich-text HTML;
/// images are uploaded separately and referenced by URL.
const MAX_DIARY_LEN: usize = 256 * 1024;

/// Maximum size of a comment body (8KB)
const MAX_COMMENT_LEN: usize = 8 * 1024;

/// Validated diary body (rich-text HTML, stored as-is)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiaryContent(String);

impl DiaryContent {
    /// Create new diary content.
    ///
    /// # Rules
    /// - Must contain something other than whitespace
    /// - Max 256KB (bytes)
    ///
    /// The body is stored untrimmed so the editor's markup survives.
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        check_body("content", s, MAX_DIARY_LEN)?;
        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Validated comment body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentContent(String);

impl CommentContent {
    /// Create new comment content.
    ///
    /// # Example
    /// ```
    /// use diaryswap_server::models::CommentContent;
    ///
    /// assert!(CommentContent::new("lovely entry").is_ok());
    /// assert!(CommentContent::new("").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        check_body("content", s, MAX_COMMENT_LEN)?;
        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

fn check_body(field: &'static str, s: &str, max: usize) -> Result<(), ValidationError> {
    if s.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if s.len() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}
