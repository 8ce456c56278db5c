//! Data models for Lectern entities.
//!
//! This module contains the data structures exchanged with the Lectern
//! backend, including:
//!
//! - `User`, `AuthSession`: accounts, roles, and sign-in responses
//! - `Course`, `Category`, `Review`: the course catalog and its ratings
//! - `Lesson`, `Quiz`, `Assignment`: course content and coursework
//! - `Enrollment`, `CourseProgress`: membership and completion tracking
//! - `PaymentIntent`, `PaymentRecord`: purchases
//!
//! Responses use the backend's camelCase field naming and `_id` identifiers;
//! the structs map those to idiomatic names via serde renames.

pub mod assignment;
pub mod course;
pub mod enrollment;
pub mod lesson;
pub mod payment;
pub mod quiz;
pub mod user;

pub use assignment::{
    Assignment, AssignmentUpdate, NewAssignment, NewSubmission, Submission, SubmissionGrade,
};
pub use course::{
    Category, Course, CoursePage, CourseQuery, CourseUpdate, NewCourse, NewReview, Review,
    SearchFilters, SearchResults,
};
pub use enrollment::{CourseProgress, Enrollment, StudentProgress};
pub use lesson::{Lesson, LessonType, LessonUpdate, NewLesson};
pub use payment::{PaymentIntent, PaymentRecord};
pub use quiz::{NewQuiz, NewQuizQuestion, Quiz, QuizQuestion, QuizResult};
pub use user::{
    AuthSession, NewUser, PasswordChange, PersonRef, ProfileUpdate, User, UserPage, UserQuery,
    UserRole,
};
