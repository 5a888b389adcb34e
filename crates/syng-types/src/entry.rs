use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Backend-assigned record identifier, unique within one collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(RecordId)
    }
}

/// A stored vocabulary entry (bookmark or user list word)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabEntry {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub simplified: String,
    pub traditional: String,
    pub pronunciation: String,
    #[serde(default)]
    pub definitions: Vec<String>,
    /// Tone number per syllable
    #[serde(rename = "toneMarks", default)]
    pub tone_marks: Vec<u8>,
    #[serde(default)]
    pub notes: String,
}

/// Fields submitted when saving a word, before the backend assigns an id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEntry {
    pub simplified: String,
    pub traditional: String,
    pub pronunciation: String,
    pub definitions: Vec<String>,
    #[serde(rename = "toneMarks")]
    pub tone_marks: Vec<u8>,
}

impl NewEntry {
    pub fn new(
        simplified: impl Into<String>,
        traditional: impl Into<String>,
        pronunciation: impl Into<String>,
        definitions: Vec<String>,
        tone_marks: Vec<u8>,
    ) -> Self {
        Self {
            simplified: simplified.into(),
            traditional: traditional.into(),
            pronunciation: pronunciation.into(),
            definitions,
            tone_marks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_uses_stored_field_names() {
        let entry = VocabEntry {
            id: RecordId(7),
            simplified: "你好".to_string(),
            traditional: "你好".to_string(),
            pronunciation: "nǐ hǎo".to_string(),
            definitions: vec!["hello".to_string()],
            tone_marks: vec![3, 3],
            notes: String::new(),
        };

        let value = serde_json::to_value(&entry).unwrap();

        assert_eq!(value["_id"], 7);
        assert_eq!(value["toneMarks"], serde_json::json!([3, 3]));
        assert_eq!(value["notes"], "");
    }

    #[test]
    fn test_entry_missing_notes_defaults_to_empty() {
        let raw = r#"{"_id":1,"simplified":"书","traditional":"書","pronunciation":"shū"}"#;

        let entry: VocabEntry = serde_json::from_str(raw).unwrap();

        assert_eq!(entry.id, RecordId(1));
        assert!(entry.notes.is_empty());
        assert!(entry.definitions.is_empty());
    }

    #[test]
    fn test_record_id_from_str() {
        assert_eq!(" 42 ".parse::<RecordId>().unwrap(), RecordId(42));
        assert!("abc".parse::<RecordId>().is_err());
    }
}
