use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of names in the catalog.
pub const TOTAL_NAMES: u8 = 99;

/// Chat-platform identifier of a user. Stable across sessions.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(i64);

impl UserId {
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn value(&self) -> i64 {
        self.0
    }
}

/// Identifier of a chat (private or group) a message lives in.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChatId(i64);

impl ChatId {
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn value(&self) -> i64 {
        self.0
    }
}

/// Identifier of a single message within a chat.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(i32);

impl MessageId {
    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn value(&self) -> i32 {
        self.0
    }
}

//
// ─── NAME NUMBER ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NameNumberError {
    #[error("name number must be between 1 and 99, got {0}")]
    OutOfRange(i64),
}

/// Position of a name in the catalog, always within `1..=99`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct NameNumber(u8);

impl NameNumber {
    /// Validates and wraps a catalog position.
    ///
    /// # Errors
    ///
    /// Returns `NameNumberError::OutOfRange` outside `1..=99`.
    pub fn new(value: u8) -> Result<Self, NameNumberError> {
        if (1..=TOTAL_NAMES).contains(&value) {
            Ok(Self(value))
        } else {
            Err(NameNumberError::OutOfRange(i64::from(value)))
        }
    }

    /// Same as [`NameNumber::new`] for wider integers coming from storage or user input.
    ///
    /// # Errors
    ///
    /// Returns `NameNumberError::OutOfRange` outside `1..=99`.
    pub fn from_i64(value: i64) -> Result<Self, NameNumberError> {
        u8::try_from(value)
            .map_err(|_| NameNumberError::OutOfRange(value))
            .and_then(Self::new)
    }

    #[must_use]
    pub fn value(&self) -> u8 {
        self.0
    }

    /// All valid numbers in ascending order.
    pub fn all() -> impl Iterator<Item = NameNumber> {
        (1..=TOTAL_NAMES).map(NameNumber)
    }
}

impl TryFrom<u8> for NameNumber {
    type Error = NameNumberError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NameNumber> for u8 {
    fn from(number: NameNumber) -> Self {
        number.0
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

impl fmt::Debug for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChatId({})", self.0)
    }
}

impl fmt::Debug for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MessageId({})", self.0)
    }
}

impl fmt::Debug for NameNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NameNumber({})", self.0)
    }
}

// ─── Display Implementations ───────────────────────────────────────────────────

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for NameNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─── FromStr Implementations ───────────────────────────────────────────────────

/// Error type for parsing an id from user input or callback payloads.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("failed to parse {kind} from {raw:?}")]
pub struct ParseIdError {
    kind: &'static str,
    raw: String,
}

impl FromStr for UserId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(UserId).map_err(|_| ParseIdError {
            kind: "UserId",
            raw: s.to_owned(),
        })
    }
}

impl FromStr for ChatId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(ChatId).map_err(|_| ParseIdError {
            kind: "ChatId",
            raw: s.to_owned(),
        })
    }
}

impl FromStr for NameNumber {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .ok()
            .and_then(|value| NameNumber::from_i64(value).ok())
            .ok_or_else(|| ParseIdError {
                kind: "NameNumber",
                raw: s.to_owned(),
            })
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_number_accepts_catalog_range() {
        assert_eq!(NameNumber::new(1).unwrap().value(), 1);
        assert_eq!(NameNumber::new(99).unwrap().value(), 99);
    }

    #[test]
    fn name_number_rejects_out_of_range() {
        assert_eq!(NameNumber::new(0), Err(NameNumberError::OutOfRange(0)));
        assert_eq!(NameNumber::new(100), Err(NameNumberError::OutOfRange(100)));
        assert_eq!(
            NameNumber::from_i64(-4),
            Err(NameNumberError::OutOfRange(-4))
        );
        assert_eq!(
            NameNumber::from_i64(1_000),
            Err(NameNumberError::OutOfRange(1_000))
        );
    }

    #[test]
    fn all_yields_every_number_once() {
        let numbers: Vec<u8> = NameNumber::all().map(|n| n.value()).collect();
        assert_eq!(numbers.len(), 99);
        assert_eq!(numbers.first(), Some(&1));
        assert_eq!(numbers.last(), Some(&99));
    }

    #[test]
    fn name_number_from_str() {
        let n: NameNumber = " 42 ".parse().unwrap();
        assert_eq!(n.value(), 42);
        assert!("0".parse::<NameNumber>().is_err());
        assert!("abc".parse::<NameNumber>().is_err());
    }

    #[test]
    fn name_number_deserialize_validates() {
        let ok: NameNumber = serde_json::from_str("7").unwrap();
        assert_eq!(ok.value(), 7);
        assert!(serde_json::from_str::<NameNumber>("120").is_err());
    }

    #[test]
    fn user_id_display_and_parse() {
        let id: UserId = "-100200".parse().unwrap();
        assert_eq!(id, UserId::new(-100_200));
        assert_eq!(id.to_string(), "-100200");
        assert!("x".parse::<UserId>().is_err());
    }
}
