use std::fmt;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

/// Name of the fixed bookmarks collection. Never a legal user list name.
pub const BOOKMARKS: &str = "bookmarks";

const MAX_NAME_BYTES: usize = 255;
const FORBIDDEN_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("List name cannot be empty")]
    Empty,

    #[error("\"{0}\" is reserved and cannot be used as a list name")]
    Reserved(String),

    #[error("Invalid list name \"{name}\": {reason}")]
    Invalid { name: String, reason: &'static str },
}

/// User list name. Doubles as the collection file name, so it must be a
/// valid file name and must not collide with the bookmarks collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ListName(String);

impl ListName {
    pub fn parse(raw: &str) -> Result<Self, NameError> {
        // NFC so visually identical names map to the same file
        let name: String = raw.nfc().collect();

        if name.is_empty() {
            return Err(NameError::Empty);
        }
        if name.eq_ignore_ascii_case(BOOKMARKS) {
            return Err(NameError::Reserved(name));
        }

        let reason = if name.len() > MAX_NAME_BYTES {
            Some("longer than 255 bytes")
        } else if name.starts_with('.') {
            Some("cannot start with '.'")
        } else if name.trim() != name {
            Some("cannot start or end with whitespace")
        } else if name.chars().any(|c| c.is_control()) {
            Some("contains control characters")
        } else if name.contains(FORBIDDEN_CHARS) {
            Some("contains a character that is not allowed in file names")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(NameError::Invalid { name, reason }),
            None => Ok(Self(name)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ListName {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ListName> for String {
    fn from(name: ListName) -> Self {
        name.0
    }
}

/// Collection an operation is aimed at
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ListTarget {
    Bookmarks,
    Named(ListName),
}

impl ListTarget {
    /// `"bookmarks"` selects the bookmarks collection, anything else must be
    /// a valid list name
    pub fn parse(raw: &str) -> Result<Self, NameError> {
        if raw == BOOKMARKS {
            Ok(Self::Bookmarks)
        } else {
            ListName::parse(raw).map(Self::Named)
        }
    }

    pub fn collection_name(&self) -> &str {
        match self {
            Self::Bookmarks => BOOKMARKS,
            Self::Named(name) => name.as_str(),
        }
    }
}

impl fmt::Display for ListTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plain_and_cjk_names() {
        assert_eq!(ListName::parse("HSK1").unwrap().as_str(), "HSK1");
        assert_eq!(ListName::parse("生词 本").unwrap().as_str(), "生词 本");
    }

    #[test]
    fn test_rejects_reserved_name_in_any_case() {
        assert!(matches!(ListName::parse("bookmarks"), Err(NameError::Reserved(_))));
        assert!(matches!(ListName::parse("BookMarks"), Err(NameError::Reserved(_))));
    }

    #[test]
    fn test_rejects_unusable_file_names() {
        assert_eq!(ListName::parse(""), Err(NameError::Empty));
        for bad in ["..", ".hidden", "a/b", "a\\b", "what?", " padded", "tab\tname"] {
            assert!(
                matches!(ListName::parse(bad), Err(NameError::Invalid { .. })),
                "{bad:?} should be rejected"
            );
        }
        assert!(ListName::parse(&"x".repeat(256)).is_err());
    }

    #[test]
    fn test_normalizes_to_nfc() {
        let decomposed = "e\u{301}tude";
        let name = ListName::parse(decomposed).unwrap();
        assert_eq!(name.as_str(), "\u{e9}tude");
    }

    #[test]
    fn test_target_dispatch() {
        assert_eq!(ListTarget::parse("bookmarks").unwrap(), ListTarget::Bookmarks);

        let target = ListTarget::parse("HSK1").unwrap();
        assert_eq!(target.collection_name(), "HSK1");
        assert!(matches!(target, ListTarget::Named(_)));
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: ListName = serde_json::from_str("\"HSK2\"").unwrap();
        assert_eq!(ok.as_str(), "HSK2");
        assert!(serde_json::from_str::<ListName>("\"a/b\"").is_err());
    }
}
