//! Stop code value object

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Longest code ever printed on stop signage
const MAX_LEN: usize = 12;

/// A stop code as printed on physical signage (e.g. "PA433")
///
/// Distinct from the schedule store's internal stop id. Codes are normalized
/// on construction: whitespace is removed and letters are upper-cased, so
/// `" pa 433 "` and `"PA433"` are the same code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StopCode(String);

impl StopCode {
    /// Parse and normalize a stop code
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStopCode` if the normalized code is empty,
    /// too long, or contains anything other than ASCII letters and digits.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let normalized = Self::normalize(raw);

        if normalized.is_empty() || normalized.len() > MAX_LEN {
            return Err(DomainError::InvalidStopCode(raw.to_string()));
        }
        if !normalized.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(DomainError::InvalidStopCode(raw.to_string()));
        }

        Ok(Self(normalized))
    }

    /// Normalize a raw code without validating it
    #[must_use]
    pub fn normalize(raw: &str) -> String {
        raw.chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_uppercase)
            .collect()
    }

    /// Get the normalized code
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StopCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for StopCode {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<StopCode> for String {
    fn from(code: StopCode) -> Self {
        code.0
    }
}

impl std::str::FromStr for StopCode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
