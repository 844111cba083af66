//! The core category types and their validation rules.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, UserID};

/// Alias for the ID for a category.
pub type CategoryId = i64;

/// The maximum number of characters allowed in a category name.
pub const MAX_CATEGORY_NAME_LENGTH: usize = 100;

/// The name of a category.
///
/// The inner string is guaranteed to be non-empty after trimming and at most
/// [MAX_CATEGORY_NAME_LENGTH] characters long.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name.
    ///
    /// Leading and trailing whitespace is removed.
    ///
    /// # Errors
    /// Returns a:
    /// - [Error::EmptyCategoryName] if `name` is empty or blank (all whitespace),
    /// - or [Error::CategoryNameTooLong] if the trimmed name is longer than
    ///   [MAX_CATEGORY_NAME_LENGTH] characters.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            return Err(Error::EmptyCategoryName);
        }

        if name.chars().count() > MAX_CATEGORY_NAME_LENGTH {
            return Err(Error::CategoryNameTooLong(MAX_CATEGORY_NAME_LENGTH));
        }

        Ok(Self(name.to_owned()))
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure the string is not empty and within the length
    /// limit.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CategoryName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The raw data submitted by the category creation form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryFormData {
    /// The desired category name, validated by [CategoryName::new].
    pub name: String,
}

/// A category for grouping the transactions of a single user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,
    /// The name of the category.
    pub name: CategoryName,
    /// The user that owns the category.
    pub user_id: UserID,
}

#[cfg(test)]
mod category_name_tests {
    use crate::Error;

    use super::{CategoryName, MAX_CATEGORY_NAME_LENGTH};

    #[test]
    fn new_fails_on_empty_string() {
        let category_name = CategoryName::new("");

        assert_eq!(category_name, Err(Error::EmptyCategoryName));
    }

    #[test]
    fn new_fails_on_just_whitespace() {
        let category_name = CategoryName::new("\n\t \r");

        assert_eq!(category_name, Err(Error::EmptyCategoryName));
    }

    #[test]
    fn new_fails_on_overlong_name() {
        let name = "a".repeat(MAX_CATEGORY_NAME_LENGTH + 1);

        let category_name = CategoryName::new(&name);

        assert_eq!(
            category_name,
            Err(Error::CategoryNameTooLong(MAX_CATEGORY_NAME_LENGTH))
        );
    }

    #[test]
    fn new_succeeds_at_max_length() {
        let name = "a".repeat(MAX_CATEGORY_NAME_LENGTH);

        let category_name = CategoryName::new(&name);

        assert!(category_name.is_ok());
    }

    #[test]
    fn new_trims_whitespace() {
        let category_name = CategoryName::new("  Groceries \n").unwrap();

        assert_eq!(category_name.as_ref(), "Groceries");
    }

    #[test]
    fn new_succeeds_on_non_empty_string() {
        let category_name = CategoryName::new("🔥");

        assert!(category_name.is_ok())
    }
}
