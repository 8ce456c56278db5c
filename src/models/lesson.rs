use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of content a lesson delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LessonType {
    Video,
    Text,
    Pdf,
    Quiz,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(rename = "type", default)]
    pub lesson_type: Option<LessonType>,
    /// Duration in minutes
    pub duration: Option<u32>,
    pub content: Option<String>,
    #[serde(rename = "videoUrl")]
    pub video_url: Option<String>,
    #[serde(rename = "isCompleted", default)]
    pub is_completed: bool,
    pub order: Option<u32>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Lesson creation payload.
#[derive(Debug, Clone, Serialize)]
pub struct NewLesson {
    pub title: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub lesson_type: Option<LessonType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(rename = "videoUrl", skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
}

/// Lesson update payload; absent fields are left untouched server-side.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LessonUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub lesson_type: Option<LessonType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(rename = "videoUrl", skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lesson() {
        let json = r#"{
            "_id": "7f3a01",
            "title": "Ownership and Borrowing",
            "type": "video",
            "duration": 18,
            "videoUrl": "https://youtu.be/abcdefghijk",
            "isCompleted": true,
            "order": 3
        }"#;

        let lesson: Lesson = serde_json::from_str(json).unwrap();
        assert_eq!(lesson.lesson_type, Some(LessonType::Video));
        assert_eq!(lesson.duration, Some(18));
        assert!(lesson.is_completed);
    }

    #[test]
    fn test_completion_defaults_to_false() {
        let lesson: Lesson =
            serde_json::from_str(r#"{"_id": "1", "title": "Intro"}"#).unwrap();
        assert!(!lesson.is_completed);
        assert_eq!(lesson.lesson_type, None);
    }

    #[test]
    fn test_new_lesson_serializes_type_under_wire_name() {
        let payload = NewLesson {
            title: "Slices".to_string(),
            lesson_type: Some(LessonType::Text),
            duration: None,
            content: Some("…".to_string()),
            video_url: None,
            order: Some(4),
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["type"], serde_json::json!("text"));
        assert!(value.get("duration").is_none());
    }
}
