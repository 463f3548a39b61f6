//! Core record types for rollbook.
//!
//! This module defines the student record as it lives in memory and on disk,
//! the partial update applied by the store, and the timestamp helpers shared
//! by both.

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Format of the `created` and `modified` timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format of a calendar day, the prefix of every timestamp.
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// The current local time formatted as a record timestamp.
#[must_use]
pub fn timestamp_now() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// The current local day formatted as `YYYY-MM-DD`.
#[must_use]
pub fn today() -> String {
    Local::now().format(DAY_FORMAT).to_string()
}

/// A single student.
///
/// On disk the id is the key of the enclosing map, so it is not serialized
/// with the rest of the fields; the store fills it in from the key on load.
///
/// Records created here always carry every field. Files edited by hand may
/// leave the optional ones out, and those stay out when the file is saved
/// again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Unique key, never changed after creation.
    #[serde(skip)]
    pub id: String,

    /// Full name.
    pub name: String,

    /// Free-form grade such as `10th`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,

    /// Contact email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Contact phone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// When the record was added.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,

    /// When the record was last updated, absent until the first update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
}

impl Record {
    /// Create a new record stamped with the current time.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        grade: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            grade: Some(grade.into()),
            email: Some(email.into()),
            phone: Some(phone.into()),
            created: Some(timestamp_now()),
            modified: None,
        }
    }

    /// Check whether this record matches a search query.
    ///
    /// Id, name and email are compared case-insensitively. Phone is compared
    /// verbatim, so a query containing letters only matches a phone number
    /// with the same letters in the same case. A missing field never matches.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let folded = query.to_lowercase();
        self.id.to_lowercase().contains(&folded)
            || self.name.to_lowercase().contains(&folded)
            || self
                .email
                .as_deref()
                .is_some_and(|email| email.to_lowercase().contains(&folded))
            || self.phone.as_deref().is_some_and(|phone| phone.contains(query))
    }

    /// Check whether this record was created on the given `YYYY-MM-DD` day.
    #[must_use]
    pub fn created_on(&self, day: &str) -> bool {
        self.created.as_deref().is_some_and(|created| created.starts_with(day))
    }

    /// The grade, or an empty string when the record has none.
    #[must_use]
    pub fn grade_or_blank(&self) -> &str {
        self.grade.as_deref().unwrap_or_default()
    }

    /// Check whether this record has been updated since it was created.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.modified.is_some()
    }
}

/// A partial update to a record.
///
/// Fields left as `None` or set to an empty string are not applied: an update
/// can set a field to a new value but never blank it out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordUpdate {
    /// New name.
    pub name: Option<String>,
    /// New grade.
    pub grade: Option<String>,
    /// New email.
    pub email: Option<String>,
    /// New phone.
    pub phone: Option<String>,
}

impl RecordUpdate {
    /// Create an update that changes nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the grade.
    #[must_use]
    pub fn grade(mut self, grade: impl Into<String>) -> Self {
        self.grade = Some(grade.into());
        self
    }

    /// Set the email.
    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Set the phone.
    #[must_use]
    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Copy every non-empty field onto `record`.
    ///
    /// Leaves `id`, `created` and `modified` alone.
    pub fn apply_to(&self, record: &mut Record) {
        fn non_empty(value: Option<&String>) -> Option<&String> {
            value.filter(|v| !v.is_empty())
        }

        if let Some(name) = non_empty(self.name.as_ref()) {
            record.name.clone_from(name);
        }
        for (target, value) in [
            (&mut record.grade, &self.grade),
            (&mut record.email, &self.email),
            (&mut record.phone, &self.phone),
        ] {
            if let Some(value) = non_empty(value.as_ref()) {
                *target = Some(value.clone());
            }
        }
    }
}

/// Validate the identity of a record before it is added.
///
/// The store does not call this; it is the caller's check, applied to input
/// that has already been trimmed.
///
/// # Errors
///
/// Returns [`Error::Validation`] if the id or the name is blank.
pub fn validate_new_record(id: &str, name: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(Error::validation("student id is required"));
    }
    if name.trim().is_empty() {
        return Err(Error::validation("student name is required"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ana() -> Record {
        Record::new("S001", "Ana Lee", "10th", "ana@x.com", "+1-555-0100")
    }

    #[test]
    fn test_new_sets_created_only() {
        let record = ana();
        assert_eq!(record.id, "S001");
        assert_eq!(
            record.created.as_deref().map(str::len),
            Some("2024-01-15 09:30:00".len())
        );
        assert!(record.modified.is_none());
        assert!(!record.is_modified());
    }

    #[test]
    fn test_timestamp_format() {
        let stamp = timestamp_now();
        assert!(chrono::NaiveDateTime::parse_from_str(&stamp, TIMESTAMP_FORMAT).is_ok());
        assert!(stamp.starts_with(&today()));
    }

    #[test]
    fn test_matches_name_and_email_case_insensitive() {
        let record = ana();
        assert!(record.matches("ana"));
        assert!(record.matches("ANA"));
        assert!(record.matches("X.COM"));
    }

    #[test]
    fn test_matches_id_case_insensitive() {
        assert!(ana().matches("s00"));
    }

    #[test]
    fn test_matches_phone_substring() {
        assert!(ana().matches("555"));
        assert!(!ana().matches("999"));
    }

    #[test]
    fn test_phone_match_is_case_sensitive() {
        let record = Record::new("S002", "Bo", "", "", "+1-555-X100");
        assert!(record.matches("X100"));
        assert!(!record.matches("x100"));
    }

    #[test]
    fn test_empty_query_matches_everything() {
        assert!(Record::new("S003", "Cy", "", "", "").matches(""));
    }

    #[test]
    fn test_missing_contact_fields_never_match() {
        let mut record = Record::new("S004", "Dee", "", "", "");
        record.email = None;
        record.phone = None;
        assert!(!record.matches("@"));
        assert!(record.matches("dee"));
    }

    #[test]
    fn test_created_on() {
        let mut record = ana();
        record.created = Some("2024-01-15 09:30:00".to_string());
        assert!(record.created_on("2024-01-15"));
        assert!(!record.created_on("2024-01-16"));

        record.created = None;
        assert!(!record.created_on("2024-01-15"));
    }

    #[test]
    fn test_update_skips_empty_fields() {
        let mut record = ana();
        RecordUpdate::new()
            .name("")
            .grade("11th")
            .email("")
            .apply_to(&mut record);

        assert_eq!(record.name, "Ana Lee");
        assert_eq!(record.grade.as_deref(), Some("11th"));
        assert_eq!(record.email.as_deref(), Some("ana@x.com"));
        assert_eq!(record.phone.as_deref(), Some("+1-555-0100"));
    }

    #[test]
    fn test_update_fills_missing_field() {
        let mut record: Record = serde_json::from_str(r#"{"name": "Dee"}"#).unwrap();
        RecordUpdate::new().grade("9th").email("").apply_to(&mut record);

        assert_eq!(record.grade.as_deref(), Some("9th"));
        assert!(record.email.is_none());
    }

    #[test]
    fn test_update_leaves_timestamps_alone() {
        let mut record = ana();
        let created = record.created.clone();
        RecordUpdate::new().phone("555-0199").apply_to(&mut record);

        assert_eq!(record.created, created);
        assert!(record.modified.is_none());
        assert_eq!(record.phone.as_deref(), Some("555-0199"));
    }

    #[test]
    fn test_serialized_shape() {
        let mut record = ana();
        record.created = Some("2024-01-15 09:30:00".to_string());
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "name": "Ana Lee",
                "grade": "10th",
                "email": "ana@x.com",
                "phone": "+1-555-0100",
                "created": "2024-01-15 09:30:00"
            })
        );
    }

    #[test]
    fn test_deserialize_missing_optional_fields() {
        let record: Record = serde_json::from_str(r#"{"name": "Dee"}"#).unwrap();
        assert_eq!(record.name, "Dee");
        assert!(record.grade.is_none());
        assert!(record.created.is_none());
        assert!(record.id.is_empty());
        assert_eq!(record.grade_or_blank(), "");
    }

    #[test]
    fn test_missing_fields_stay_missing_when_serialized() {
        let record: Record = serde_json::from_str(r#"{"name": "Dee", "phone": ""}"#).unwrap();
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value, serde_json::json!({"name": "Dee", "phone": ""}));
    }

    #[test]
    fn test_deserialize_requires_name() {
        let result = serde_json::from_str::<Record>(r#"{"grade": "9th"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_new_record() {
        assert!(validate_new_record("S001", "Ana").is_ok());

        let err = validate_new_record("  ", "Ana").unwrap_err();
        assert!(err.to_string().contains("id"));

        let err = validate_new_record("S001", "").unwrap_err();
        assert!(err.is_validation_error());
        assert!(err.to_string().contains("name"));
    }
}
