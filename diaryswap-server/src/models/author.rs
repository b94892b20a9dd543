//! Author name validation

use super::ValidationError;

/// Maximum length for author names, in characters
const MAX_AUTHOR_LEN: usize = 64;

/// Validated author name (diaries and comments)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AuthorName(String);

impl AuthorName {
    /// Create a new author name.
    ///
    /// # Rules
    /// - Surrounding whitespace is trimmed
    /// - Must not be empty after trimming
    /// - Max 64 characters
    /// - No control characters
    ///
    /// # Example
    /// ```
    /// use diaryswap_server::models::AuthorName;
    ///
    /// assert_eq!(AuthorName::new("  mio ").unwrap().as_str(), "mio");
    /// assert!(AuthorName::new("   ").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let s = s.trim();

        if s.is_empty() {
            return Err(ValidationError::Empty { field: "author" });
        }

        if s.chars().count() > MAX_AUTHOR_LEN {
            return Err(ValidationError::TooLong {
                field: "author",
                max: MAX_AUTHOR_LEN,
            });
        }

        if s.chars().any(char::is_control) {
            return Err(ValidationError::InvalidFormat {
                field: "author",
                reason: "must not contain control characters",
            });
        }

        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for AuthorName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
