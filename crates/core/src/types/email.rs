//! Customer email addresses.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Why a string was rejected as an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("email is required")]
    Empty,
    #[error("email is longer than {} characters", Email::MAX_LENGTH)]
    TooLong,
    #[error("email cannot contain spaces")]
    Whitespace,
    /// Not exactly one `@` with text on both sides.
    #[error("email must look like name@domain")]
    Malformed,
}

/// A login email, trimmed and lower-cased.
///
/// It is both the identity provider's account key and the contact copied
/// onto orders, so `Asha@Devgon.in` and `asha@devgon.in` are one account.
/// Stored values are read back as-is; only [`Email::parse`] validates.
///
/// ```
/// use devgon_core::Email;
///
/// assert_eq!(Email::parse(" Asha@Devgon.IN ").unwrap().as_str(), "asha@devgon.in");
/// assert!(Email::parse("asha@").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// RFC 5321 path limit.
    pub const MAX_LENGTH: usize = 254;

    /// Validate and normalise user input.
    ///
    /// # Errors
    ///
    /// Returns an [`EmailError`] describing the first problem found.
    pub fn parse(input: &str) -> Result<Self, EmailError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(EmailError::Empty);
        }
        if trimmed.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong);
        }
        if trimmed.contains(char::is_whitespace) {
            return Err(EmailError::Whitespace);
        }
        let well_formed = trimmed.split_once('@').is_some_and(|(name, domain)| {
            !name.is_empty() && !domain.is_empty() && !domain.contains('@')
        });
        if !well_formed {
            return Err(EmailError::Malformed);
        }
        Ok(Self(trimmed.to_lowercase()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_common_shapes() {
        for ok in ["asha@devgon.in", "asha.verma+orders@mail.devgon.co.in", "a@b"] {
            assert!(Email::parse(ok).is_ok(), "{ok}");
        }
    }

    #[test]
    fn test_normalises() {
        let email: Email = "  Ravi.K@Devgon.IN ".parse().unwrap();
        assert_eq!(email.to_string(), "ravi.k@devgon.in");
    }

    #[test]
    fn test_rejections() {
        assert_eq!(Email::parse("   "), Err(EmailError::Empty));
        assert_eq!(Email::parse("asha verma@devgon.in"), Err(EmailError::Whitespace));
        for bad in ["devgon.in", "@devgon.in", "asha@", "a@b@c"] {
            assert_eq!(Email::parse(bad), Err(EmailError::Malformed), "{bad}");
        }
        let long = format!("{}@devgon.in", "a".repeat(250));
        assert_eq!(Email::parse(&long), Err(EmailError::TooLong));
    }

    #[test]
    fn test_stored_value_is_read_verbatim() {
        let email: Email = serde_json::from_str("\"Legacy@Devgon.in\"").unwrap();
        assert_eq!(email.as_str(), "Legacy@Devgon.in");
        assert_eq!(serde_json::to_string(&email).unwrap(), "\"Legacy@Devgon.in\"");
    }
}
