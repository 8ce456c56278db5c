use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::course::Course;

/// A student's membership in a course, with rolled-up progress.
#[derive(Debug, Clone, Deserialize)]
pub struct Enrollment {
    #[serde(rename = "_id")]
    pub id: String,
    pub course: Course,
    /// Completion percentage, 0-100
    #[serde(default)]
    pub progress: f64,
    #[serde(rename = "enrolledAt")]
    pub enrolled_at: Option<DateTime<Utc>>,
}

/// Per-course progress detail.
#[derive(Debug, Clone, Deserialize)]
pub struct CourseProgress {
    #[serde(rename = "courseId")]
    pub course_id: Option<String>,
    #[serde(rename = "completedLessons", default)]
    pub completed_lessons: Vec<String>,
    #[serde(rename = "totalLessons")]
    pub total_lessons: Option<u32>,
    /// Completion percentage, 0-100
    #[serde(default)]
    pub progress: f64,
}

impl CourseProgress {
    pub fn is_complete(&self) -> bool {
        match self.total_lessons {
            Some(total) => total > 0 && self.completed_lessons.len() as u32 >= total,
            None => self.progress >= 100.0,
        }
    }
}

/// Cross-course progress summary for one student.
#[derive(Debug, Clone, Deserialize)]
pub struct StudentProgress {
    #[serde(rename = "studentId")]
    pub student_id: Option<String>,
    #[serde(default)]
    pub courses: Vec<CourseProgress>,
    #[serde(rename = "overallProgress")]
    pub overall_progress: Option<f64>,
}
