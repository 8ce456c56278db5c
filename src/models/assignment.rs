use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::PersonRef;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "dueDate")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(rename = "maxScore")]
    pub max_score: Option<f64>,
    /// The current user's own submission, when one exists
    pub submission: Option<Submission>,
}

impl Assignment {
    /// Whether the due date has passed without a submission.
    pub fn is_overdue(&self) -> bool {
        match (&self.due_date, &self.submission) {
            (Some(due), None) => Utc::now() > *due,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    #[serde(rename = "_id")]
    pub id: String,
    pub content: Option<String>,
    #[serde(rename = "fileUrl")]
    pub file_url: Option<String>,
    pub grade: Option<f64>,
    pub feedback: Option<String>,
    pub student: Option<PersonRef>,
    #[serde(rename = "submittedAt")]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl Submission {
    pub fn is_graded(&self) -> bool {
        self.grade.is_some()
    }
}

/// Assignment creation payload.
#[derive(Debug, Clone, Serialize)]
pub struct NewAssignment {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "dueDate", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(rename = "maxScore", skip_serializing_if = "Option::is_none")]
    pub max_score: Option<f64>,
}

/// Assignment update payload; absent fields are left untouched server-side.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AssignmentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "dueDate", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(rename = "maxScore", skip_serializing_if = "Option::is_none")]
    pub max_score: Option<f64>,
}

/// Student submission payload: inline text, an uploaded file URL, or both.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewSubmission {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(rename = "fileUrl", skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
}

/// Grading payload applied to a submission.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionGrade {
    pub grade: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}
