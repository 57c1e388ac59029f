use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::ordering::Position;

/// A field failed shape validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct InvalidField {
    pub field: &'static str,
    pub message: String,
}

impl InvalidField {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Trim a name and reject it when nothing is left.
pub fn validate_name(field: &'static str, name: &str) -> Result<String, InvalidField> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(InvalidField::new(field, "must not be empty"));
    }
    Ok(trimmed.to_string())
}

pub fn validate_position(position: Position) -> Result<(), InvalidField> {
    if position < 0 {
        return Err(InvalidField::new("position", "must not be negative"));
    }
    Ok(())
}

fn validate_repeat_days(days: &[u8]) -> Result<(), InvalidField> {
    match days.iter().find(|day| **day > 6) {
        Some(day) => Err(InvalidField::new(
            "repeatDays",
            format!("{day} is not a weekday (0-6)"),
        )),
        None => Ok(()),
    }
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskList {
    pub id: i64,
    pub name: String,
    pub board_id: i64,
    pub position: Position,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatInterval {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl RepeatInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepeatInterval::Daily => "daily",
            RepeatInterval::Weekly => "weekly",
            RepeatInterval::Monthly => "monthly",
            RepeatInterval::Yearly => "yearly",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "daily" => Some(RepeatInterval::Daily),
            "weekly" => Some(RepeatInterval::Weekly),
            "monthly" => Some(RepeatInterval::Monthly),
            "yearly" => Some(RepeatInterval::Yearly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub name: String,
    pub list_id: i64,
    pub position: Position,
    pub description: Option<String>,
    pub started_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_completed: bool,
    pub repeat_interval: Option<RepeatInterval>,
    #[serde(default)]
    pub repeat_days: Vec<u8>,
    pub has_reminder: bool,
    pub reminder_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Only populated when a single task is fetched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: i64,
    pub task_id: i64,
    pub file_name: String,
    pub file_url: String,
    pub file_size: i64,
    pub mime_type: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBoardRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub is_favorite: bool,
}

impl CreateBoardRequest {
    pub fn validate(mut self) -> Result<Self, InvalidField> {
        self.name = validate_name("name", &self.name)?;
        Ok(self)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateListRequest {
    pub name: String,
    pub board_id: i64,
}

impl CreateListRequest {
    pub fn validate(mut self) -> Result<Self, InvalidField> {
        self.name = validate_name("name", &self.name)?;
        Ok(self)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub name: String,
    pub list_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CreateTaskRequest {
    pub fn validate(mut self) -> Result<Self, InvalidField> {
        self.name = validate_name("name", &self.name)?;
        Ok(self)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
}

impl BoardPatch {
    pub fn validate(mut self) -> Result<Self, InvalidField> {
        if let Some(name) = &self.name {
            self.name = Some(validate_name("name", name)?);
        }
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.is_favorite.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl ListPatch {
    pub fn validate(mut self) -> Result<Self, InvalidField> {
        if let Some(name) = &self.name {
            self.name = Some(validate_name("name", name)?);
        }
        if let Some(position) = self.position {
            validate_position(position)?;
        }
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.position.is_none()
    }
}

/// Partial task update. Fields left out are untouched; nullable fields take
/// an explicit `null` to clear them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_id: Option<i64>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub started_date: Option<Option<DateTime<Utc>>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub repeat_interval: Option<Option<RepeatInterval>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_days: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_reminder: Option<bool>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub reminder_time: Option<Option<DateTime<Utc>>>,
}

impl TaskPatch {
    pub fn validate(mut self) -> Result<Self, InvalidField> {
        if let Some(name) = &self.name {
            self.name = Some(validate_name("name", name)?);
        }
        if let Some(position) = self.position {
            validate_position(position)?;
        }
        if let Some(days) = &self.repeat_days {
            validate_repeat_days(days)?;
        }
        if let (Some(Some(start)), Some(Some(end))) = (self.started_date, self.end_date) {
            if end < start {
                return Err(InvalidField::new("endDate", "must not precede startedDate"));
            }
        }
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.position.is_none()
            && self.list_id.is_none()
            && self.description.is_none()
            && self.started_date.is_none()
            && self.end_date.is_none()
            && self.is_completed.is_none()
            && self.repeat_interval.is_none()
            && self.repeat_days.is_none()
            && self.has_reminder.is_none()
            && self.reminder_time.is_none()
    }

    /// Apply the patch to an in-memory task. `updated_at` is left to the caller.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(name) = &self.name {
            task.name = name.clone();
        }
        if let Some(position) = self.position {
            task.position = position;
        }
        if let Some(list_id) = self.list_id {
            task.list_id = list_id;
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(started_date) = self.started_date {
            task.started_date = started_date;
        }
        if let Some(end_date) = self.end_date {
            task.end_date = end_date;
        }
        if let Some(is_completed) = self.is_completed {
            task.is_completed = is_completed;
        }
        if let Some(repeat_interval) = self.repeat_interval {
            task.repeat_interval = repeat_interval;
        }
        if let Some(repeat_days) = &self.repeat_days {
            task.repeat_days = repeat_days.clone();
        }
        if let Some(has_reminder) = self.has_reminder {
            task.has_reminder = has_reminder;
        }
        if let Some(reminder_time) = self.reminder_time {
            task.reminder_time = reminder_time;
        }
    }
}

/// Desired order of every member of one scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderRequest {
    pub ids: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveTaskRequest {
    pub list_id: i64,
    /// Clamped into `[0, destination length]`
    pub index: i64,
}

/// Both task orders touched by a move. `source` equals `destination` for a
/// move inside one list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveTaskResponse {
    pub source: Vec<Task>,
    pub destination: Vec<Task>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name_trims() {
        assert_eq!(validate_name("name", "  Todo ").unwrap(), "Todo");
        assert!(validate_name("name", "   ").is_err());
    }

    #[test]
    fn test_task_patch_distinguishes_null_from_absent() {
        let patch: TaskPatch =
            serde_json::from_str(r#"{"description": null, "isCompleted": true}"#).unwrap();
        assert_eq!(patch.description, Some(None));
        assert_eq!(patch.started_date, None);
        assert_eq!(patch.is_completed, Some(true));
        assert!(!patch.is_empty());

        let empty: TaskPatch = serde_json::from_str("{}").unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_task_patch_rejects_bad_values() {
        let negative = TaskPatch {
            position: Some(-1),
            ..Default::default()
        };
        assert_eq!(negative.validate().unwrap_err().field, "position");

        let bad_day = TaskPatch {
            repeat_days: Some(vec![1, 7]),
            ..Default::default()
        };
        assert_eq!(bad_day.validate().unwrap_err().field, "repeatDays");
    }

    #[test]
    fn test_task_patch_serializes_only_present_fields() {
        let patch = TaskPatch {
            list_id: Some(4),
            position: Some(0),
            ..Default::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({"position": 0, "listId": 4}));
    }

    #[test]
    fn test_list_patch_validation() {
        let patch: ListPatch = serde_json::from_str(r#"{"name": " Done "}"#).unwrap();
        let patch = patch.validate().unwrap();
        assert_eq!(patch.name.as_deref(), Some("Done"));
        assert!(ListPatch::default().is_empty());
    }

    #[test]
    fn test_repeat_interval_wire_format() {
        let interval: RepeatInterval = serde_json::from_str(r#""weekly""#).unwrap();
        assert_eq!(interval, RepeatInterval::Weekly);
        assert_eq!(RepeatInterval::parse(interval.as_str()), Some(interval));
        assert_eq!(RepeatInterval::parse("hourly"), None);
    }
}
