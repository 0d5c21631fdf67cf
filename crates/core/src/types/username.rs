//! Username type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Username`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum UsernameError {
    /// The input string is empty.
    #[error("username cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("username must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains whitespace.
    #[error("username cannot contain whitespace")]
    ContainsWhitespace,
}

/// A store account username.
///
/// This type enforces only structural constraints. The registration flow
/// additionally requires a minimum length, but that rule belongs to account
/// creation, not to the type: usernames returned by the server are accepted
/// as-is.
///
/// ## Constraints
///
/// - Length: 1-32 characters
/// - No whitespace
///
/// ## Examples
///
/// ```
/// use tamarind_core::Username;
///
/// assert!(Username::parse("crio.do").is_ok());
/// assert!(Username::parse("").is_err());          // empty
/// assert!(Username::parse("two words").is_err()); // whitespace
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// Maximum length of a username.
    pub const MAX_LENGTH: usize = 32;

    /// Parse a `Username` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input:
    /// - Is empty
    /// - Is longer than 32 characters
    /// - Contains whitespace
    pub fn parse(s: &str) -> Result<Self, UsernameError> {
        if s.is_empty() {
            return Err(UsernameError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(UsernameError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if s.chars().any(char::is_whitespace) {
            return Err(UsernameError::ContainsWhitespace);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the username as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Username` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Username {
    type Err = UsernameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_usernames() {
        assert!(Username::parse("crio.do").is_ok());
        assert!(Username::parse("user_42").is_ok());
        assert!(Username::parse("a").is_ok());
        assert!(Username::parse(&"x".repeat(32)).is_ok());
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(Username::parse(""), Err(UsernameError::Empty)));
    }

    #[test]
    fn test_parse_too_long() {
        assert!(matches!(
            Username::parse(&"x".repeat(33)),
            Err(UsernameError::TooLong { .. })
        ));
    }

    #[test]
    fn test_parse_whitespace() {
        assert!(matches!(
            Username::parse("two words"),
            Err(UsernameError::ContainsWhitespace)
        ));
        assert!(matches!(
            Username::parse("tab\tname"),
            Err(UsernameError::ContainsWhitespace)
        ));
    }

    #[test]
    fn test_display() {
        let name = Username::parse("crio.do").unwrap();
        assert_eq!(format!("{name}"), "crio.do");
    }

    #[test]
    fn test_serde_roundtrip() {
        let name = Username::parse("crio.do").unwrap();
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"crio.do\"");

        let parsed: Username = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, name);
    }

    #[test]
    fn test_from_str() {
        let name: Username = "crio.do".parse().unwrap();
        assert_eq!(name.as_str(), "crio.do");
    }
}
