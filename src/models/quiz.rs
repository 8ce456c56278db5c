use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub questions: Vec<QuizQuestion>,
    /// Time limit in minutes
    #[serde(rename = "timeLimit")]
    pub time_limit: Option<u32>,
    /// How many times the current user has taken this quiz
    #[serde(default)]
    pub attempts: u32,
}

impl Quiz {
    pub fn attempted(&self) -> bool {
        self.attempts > 0
    }
}

/// A single quiz question as served to students. The correct answer never
/// appears here; grading happens server-side on submit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    pub points: Option<f64>,
}

/// Quiz creation payload.
#[derive(Debug, Clone, Serialize)]
pub struct NewQuiz {
    pub title: String,
    pub questions: Vec<NewQuizQuestion>,
    #[serde(rename = "timeLimit", skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<u32>,
}

/// Question payload for quiz authoring; includes the correct answer.
#[derive(Debug, Clone, Serialize)]
pub struct NewQuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    #[serde(rename = "correctAnswer")]
    pub correct_answer: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<f64>,
}

/// Graded outcome of a quiz submission.
#[derive(Debug, Clone, Deserialize)]
pub struct QuizResult {
    pub score: f64,
    #[serde(rename = "totalPoints")]
    pub total_points: f64,
    #[serde(rename = "submittedAt")]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl QuizResult {
    /// Score as a 0-100 percentage; empty quizzes count as zero.
    pub fn percentage(&self) -> f64 {
        if self.total_points == 0.0 {
            0.0
        } else {
            (self.score / self.total_points * 100.0).round()
        }
    }
}
