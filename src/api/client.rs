//! API client for communicating with the Lectern REST API.
//!
//! This module provides the `ApiClient` struct: the authenticated request
//! pipeline (bearer attachment, 401-driven token refresh, single retry) and
//! typed methods for every backend endpoint group.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::auth::{NullEvents, SessionEvents, TokenVault};
use crate::config::Config;
use crate::models::{
    Assignment, AssignmentUpdate, AuthSession, Category, Course, CoursePage, CourseProgress,
    CourseQuery, CourseUpdate, Enrollment, Lesson, LessonUpdate, NewAssignment, NewCourse,
    NewLesson, NewQuiz, NewReview, NewSubmission, NewUser, PasswordChange, PaymentIntent,
    PaymentRecord, ProfileUpdate, Quiz, QuizResult, Review, SearchFilters, SearchResults,
    StudentProgress, Submission, SubmissionGrade, User, UserPage, UserQuery, UserRole,
};

use super::{ApiError, ApiRequest};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// 15s allows for slow endpoints while failing fast enough for interactive use.
const REQUEST_TIMEOUT_SECS: u64 = 15;

/// Path of the sign-in endpoint. A 401 from here is a failed sign-in rather
/// than an expired session, so it never triggers a navigation event.
const LOGIN_PATH: &str = "/auth/login";

/// Path of the token refresh endpoint.
const REFRESH_PATH: &str = "/auth/refresh";

/// Millisecond-timestamp header attached to every request to defeat
/// intermediary caches.
const REQUEST_TIME_HEADER: &str = "x-request-time";

/// Client for the Lectern REST API.
/// Clone is cheap - reqwest::Client shares its connection pool via Arc, and
/// the vault, event sink, and refresh gate are shared the same way.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    vault: TokenVault,
    events: Arc<dyn SessionEvents>,
    refresh_gate: Arc<Mutex<()>>,
}

impl ApiClient {
    /// Create a client against the given base URL with the default token
    /// storage: a config-dir file for the durable scope, memory for the
    /// session scope.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_vault(base_url, TokenVault::open()?)
    }

    /// Create a client against the configured base URL (environment override,
    /// then config file, then the compiled default).
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.base_url())
    }

    /// Create a client with caller-supplied token storage.
    pub fn with_vault(base_url: impl Into<String>, vault: TokenVault) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        // Paths supply the leading slash
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }

        Ok(Self {
            client,
            base_url,
            vault,
            events: Arc::new(NullEvents),
            refresh_gate: Arc::new(Mutex::new(())),
        })
    }

    /// Replace the session event sink.
    pub fn with_events(mut self, events: Arc<dyn SessionEvents>) -> Self {
        self.events = events;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The token store backing this client.
    pub fn vault(&self) -> &TokenVault {
        &self.vault
    }

    /// Whether either storage scope currently holds an access token.
    pub fn is_authenticated(&self) -> bool {
        self.vault.is_authenticated()
    }

    /// Store credentials directly, e.g. after an out-of-band sign-in.
    pub fn set_credentials(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
        remember: bool,
    ) -> Result<()> {
        self.vault.store(access_token, refresh_token, remember)
    }

    /// Drop all stored credentials. Safe to call when none are stored.
    pub fn clear_credentials(&self) -> Result<()> {
        self.vault.clear()
    }

    // ========================================================================
    // Request pipeline
    // ========================================================================

    /// Send a request through the authenticated pipeline.
    ///
    /// Attaches the stored access token when one exists and classifies
    /// non-success statuses into [`ApiError`]. On the first 401 the client
    /// attempts a single token refresh followed by a single retry; the retry
    /// outcome is final, so a second 401 surfaces without another refresh.
    /// When the refresh itself fails, or no refresh token is stored, both
    /// storage scopes are cleared, session events fire, and the original
    /// error is returned.
    pub async fn dispatch(&self, mut request: ApiRequest) -> Result<Response, ApiError> {
        let token_at_send = self.vault.access_token();

        let err = match self.send(&request, token_at_send.as_deref()).await {
            Ok(response) => return Ok(response),
            Err(err) => err,
        };

        if !err.is_unauthorized() || request.retried {
            return Err(err);
        }
        request.retried = true;

        match self.refresh_access_token(token_at_send.as_deref()).await {
            Ok(fresh_token) => {
                debug!(method = %request.method, path = %request.path, "Retrying request with refreshed token");
                self.send(&request, Some(&fresh_token)).await
            }
            Err(refresh_err) => {
                warn!(error = %refresh_err, "Token refresh failed, ending session");
                self.expire_session(&request);
                Err(err)
            }
        }
    }

    async fn send(&self, request: &ApiRequest, token: Option<&str>) -> Result<Response, ApiError> {
        let url = format!("{}{}", self.base_url, request.path);

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .header(REQUEST_TIME_HEADER, Utc::now().timestamp_millis());
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        debug!(method = %request.method, path = %request.path, "Sending request");
        let response = builder.send().await?;
        Self::check_response(response).await
    }

    /// Check if a response is successful, classifying the body if not.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Exchange the stored refresh token for a new access token.
    ///
    /// Refreshes funnel through one gate so a burst of 401s produces a
    /// single refresh call; a dispatch that waited on the gate picks up the
    /// replacement token instead of issuing its own call. The refresh
    /// request itself carries no Authorization header.
    async fn refresh_access_token(&self, token_at_send: Option<&str>) -> Result<String, ApiError> {
        let _gate = self.refresh_gate.lock().await;

        // A concurrent dispatch may have refreshed while this one waited
        if let Some(current) = self.vault.access_token() {
            if token_at_send != Some(current.as_str()) {
                debug!("Reusing access token refreshed by a concurrent request");
                return Ok(current);
            }
        }

        let refresh_token = self
            .vault
            .refresh_token()
            .ok_or_else(|| ApiError::Unauthorized("No refresh token stored".to_string()))?;

        let url = format!("{}{}", self.base_url, REFRESH_PATH);
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "refreshToken": refresh_token }))
            .send()
            .await?;
        let response = Self::check_response(response).await?;

        let body = response.text().await?;
        let refreshed: RefreshResponse = serde_json::from_str(&body)
            .map_err(|e| ApiError::UnknownError(format!("Malformed refresh response: {}", e)))?;

        if let Err(err) = self.vault.replace_access_token(&refreshed.token) {
            warn!(error = %err, "Failed to persist refreshed access token");
        }
        info!("Access token refreshed");
        Ok(refreshed.token)
    }

    /// Unrecoverable 401: wipe credentials and notify the owner.
    ///
    /// The navigation event is suppressed when the failing request was the
    /// sign-in call itself; a rejected sign-in must not bounce the user back
    /// to the surface they are already on.
    fn expire_session(&self, request: &ApiRequest) {
        if let Err(err) = self.vault.clear() {
            warn!(error = %err, "Failed to clear stored credentials");
        }
        self.events.session_expired();
        if request.path != LOGIN_PATH {
            self.events.login_required();
        }
    }

    /// Dispatch and deserialize a top-level JSON response.
    async fn request_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let path = request.path.clone();
        let response = self.dispatch(request).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            ApiError::UnknownError(format!("Failed to parse response from {}: {}", path, e))
        })
    }

    /// Dispatch and unwrap the standard `{ "data": ... }` success envelope.
    async fn request_data<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let envelope: Envelope<T> = self.request_json(request).await?;
        Ok(envelope.data)
    }

    /// Dispatch a request whose response body is only an acknowledgement.
    async fn request_ack(&self, request: ApiRequest) -> Result<(), ApiError> {
        self.dispatch(request).await?;
        Ok(())
    }

    fn to_body<B: Serialize>(body: &B) -> Result<Value, ApiError> {
        serde_json::to_value(body)
            .map_err(|e| ApiError::UnknownError(format!("Failed to encode request body: {}", e)))
    }

    // ===== Auth Endpoints =====

    /// Sign in and store the returned credentials.
    ///
    /// `remember` keeps the access token across restarts; either way the
    /// refresh token, when the server issues one, is stored durably.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        remember: bool,
    ) -> Result<AuthSession, ApiError> {
        let request = ApiRequest::post(LOGIN_PATH)
            .json(serde_json::json!({ "email": email, "password": password }));
        let session: AuthSession = self.request_json(request).await?;

        if let Err(err) = self
            .vault
            .store(&session.token, session.refresh_token.as_deref(), remember)
        {
            warn!(error = %err, "Failed to persist credentials after sign-in");
        }
        Ok(session)
    }

    /// Create an account and store the returned credentials.
    pub async fn register(
        &self,
        new_user: &NewUser,
        remember: bool,
    ) -> Result<AuthSession, ApiError> {
        let request = ApiRequest::post("/auth/register").json(Self::to_body(new_user)?);
        let session: AuthSession = self.request_json(request).await?;

        if let Err(err) = self
            .vault
            .store(&session.token, session.refresh_token.as_deref(), remember)
        {
            warn!(error = %err, "Failed to persist credentials after registration");
        }
        Ok(session)
    }

    /// Sign out: best-effort server revocation, then local credential wipe.
    /// A failing server call never blocks the wipe.
    pub async fn logout(&self) -> Result<(), ApiError> {
        if let Err(err) = self.dispatch(ApiRequest::post("/auth/logout")).await {
            debug!(error = %err, "Logout request failed, clearing credentials anyway");
        }
        if let Err(err) = self.vault.clear() {
            warn!(error = %err, "Failed to clear stored credentials");
        }
        Ok(())
    }

    /// Fetch the signed-in user's account.
    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.request_data(ApiRequest::get("/auth/me")).await
    }

    /// Update the signed-in user's profile.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, ApiError> {
        let request = ApiRequest::put("/auth/profile").json(Self::to_body(update)?);
        self.request_data(request).await
    }

    /// Change the signed-in user's password.
    pub async fn change_password(&self, change: &PasswordChange) -> Result<(), ApiError> {
        let request = ApiRequest::patch("/auth/change-password").json(Self::to_body(change)?);
        self.request_ack(request).await
    }

    /// Delete the signed-in user's account, then wipe local credentials.
    pub async fn delete_account(&self, password: &str) -> Result<(), ApiError> {
        let request =
            ApiRequest::delete("/auth/account").json(serde_json::json!({ "password": password }));
        self.dispatch(request).await?;
        if let Err(err) = self.vault.clear() {
            warn!(error = %err, "Failed to clear stored credentials");
        }
        Ok(())
    }

    // ===== Course Endpoints =====

    /// Fetch a page of the course catalog.
    pub async fn courses(&self, query: &CourseQuery) -> Result<CoursePage, ApiError> {
        let mut request = ApiRequest::get("/courses");
        for (key, value) in query.params() {
            request = request.query(key, value);
        }
        self.request_data(request).await
    }

    /// Fetch a single course with its embedded lessons.
    pub async fn course(&self, id: &str) -> Result<Course, ApiError> {
        self.request_data(ApiRequest::get(format!("/courses/{}", id)))
            .await
    }

    /// Create a course (instructor only).
    pub async fn create_course(&self, course: &NewCourse) -> Result<Course, ApiError> {
        let request = ApiRequest::post("/courses").json(Self::to_body(course)?);
        self.request_data(request).await
    }

    /// Update a course.
    pub async fn update_course(&self, id: &str, update: &CourseUpdate) -> Result<Course, ApiError> {
        let request =
            ApiRequest::put(format!("/courses/{}", id)).json(Self::to_body(update)?);
        self.request_data(request).await
    }

    /// Delete a course.
    pub async fn delete_course(&self, id: &str) -> Result<(), ApiError> {
        self.request_ack(ApiRequest::delete(format!("/courses/{}", id)))
            .await
    }

    /// Fetch the students enrolled in a course (instructor only).
    pub async fn course_students(&self, id: &str) -> Result<Vec<User>, ApiError> {
        self.request_data(ApiRequest::get(format!("/courses/{}/students", id)))
            .await
    }

    // ===== Search Endpoints =====

    /// Full-text course search with optional filters.
    pub async fn search_courses(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> Result<SearchResults, ApiError> {
        let mut request = ApiRequest::get("/courses/search").query("q", query);
        if let Some(ref category) = filters.category {
            request = request.query("category", category);
        }
        if let Some(ref level) = filters.level {
            request = request.query("level", level);
        }
        if let Some(ref price) = filters.price {
            request = request.query("price", price);
        }
        self.request_data(request).await
    }

    /// Fetch the most popular courses.
    pub async fn popular_courses(&self) -> Result<Vec<Course>, ApiError> {
        self.request_data(ApiRequest::get("/courses/popular")).await
    }

    /// Autocomplete suggestions. Queries shorter than two characters skip
    /// the network round trip entirely.
    pub async fn search_suggestions(&self, query: &str) -> Result<Vec<String>, ApiError> {
        if query.chars().count() < 2 {
            return Ok(Vec::new());
        }
        self.request_data(ApiRequest::get("/courses/suggestions").query("q", query))
            .await
    }

    /// Fetch currently trending search terms.
    pub async fn trending_searches(&self) -> Result<Vec<String>, ApiError> {
        self.request_data(ApiRequest::get("/search/trending")).await
    }

    // ===== Lesson Endpoints =====

    /// Fetch all lessons of a course.
    pub async fn course_lessons(&self, course_id: &str) -> Result<Vec<Lesson>, ApiError> {
        self.request_data(ApiRequest::get(format!("/courses/{}/lessons", course_id)))
            .await
    }

    /// Fetch a single lesson.
    pub async fn lesson(&self, id: &str) -> Result<Lesson, ApiError> {
        self.request_data(ApiRequest::get(format!("/lessons/{}", id)))
            .await
    }

    /// Add a lesson to a course (instructor only).
    pub async fn create_lesson(
        &self,
        course_id: &str,
        lesson: &NewLesson,
    ) -> Result<Lesson, ApiError> {
        let request = ApiRequest::post(format!("/courses/{}/lessons", course_id))
            .json(Self::to_body(lesson)?);
        self.request_data(request).await
    }

    /// Update a lesson.
    pub async fn update_lesson(&self, id: &str, update: &LessonUpdate) -> Result<Lesson, ApiError> {
        let request =
            ApiRequest::put(format!("/lessons/{}", id)).json(Self::to_body(update)?);
        self.request_data(request).await
    }

    /// Delete a lesson.
    pub async fn delete_lesson(&self, id: &str) -> Result<(), ApiError> {
        self.request_ack(ApiRequest::delete(format!("/lessons/{}", id)))
            .await
    }

    /// Mark a lesson finished for the signed-in student; returns the updated
    /// course progress.
    pub async fn complete_lesson(&self, id: &str) -> Result<CourseProgress, ApiError> {
        self.request_data(ApiRequest::patch(format!("/lessons/{}/complete", id)))
            .await
    }

    // ===== Quiz Endpoints =====

    /// Fetch a quiz with its questions.
    pub async fn quiz(&self, id: &str) -> Result<Quiz, ApiError> {
        self.request_data(ApiRequest::get(format!("/quizzes/{}", id)))
            .await
    }

    /// Attach a quiz to a lesson (instructor only).
    pub async fn create_quiz(&self, lesson_id: &str, quiz: &NewQuiz) -> Result<Quiz, ApiError> {
        let request = ApiRequest::post(format!("/lessons/{}/quizzes", lesson_id))
            .json(Self::to_body(quiz)?);
        self.request_data(request).await
    }

    /// Replace a quiz's content.
    pub async fn update_quiz(&self, id: &str, quiz: &NewQuiz) -> Result<Quiz, ApiError> {
        let request = ApiRequest::put(format!("/quizzes/{}", id)).json(Self::to_body(quiz)?);
        self.request_data(request).await
    }

    /// Delete a quiz.
    pub async fn delete_quiz(&self, id: &str) -> Result<(), ApiError> {
        self.request_ack(ApiRequest::delete(format!("/quizzes/{}", id)))
            .await
    }

    /// Submit answers keyed by question id; grading happens server-side.
    pub async fn submit_quiz(
        &self,
        id: &str,
        answers: &HashMap<String, Value>,
    ) -> Result<QuizResult, ApiError> {
        let request = ApiRequest::post(format!("/quizzes/{}/submit", id))
            .json(serde_json::json!({ "answers": answers }));
        self.request_data(request).await
    }

    /// Fetch past results for a quiz.
    pub async fn quiz_results(&self, id: &str) -> Result<Vec<QuizResult>, ApiError> {
        self.request_data(ApiRequest::get(format!("/quizzes/{}/results", id)))
            .await
    }

    // ===== Assignment Endpoints =====

    /// Fetch an assignment, including the caller's own submission if any.
    pub async fn assignment(&self, id: &str) -> Result<Assignment, ApiError> {
        self.request_data(ApiRequest::get(format!("/assignments/{}", id)))
            .await
    }

    /// Attach an assignment to a lesson (instructor only).
    pub async fn create_assignment(
        &self,
        lesson_id: &str,
        assignment: &NewAssignment,
    ) -> Result<Assignment, ApiError> {
        let request = ApiRequest::post(format!("/lessons/{}/assignments", lesson_id))
            .json(Self::to_body(assignment)?);
        self.request_data(request).await
    }

    /// Update an assignment.
    pub async fn update_assignment(
        &self,
        id: &str,
        update: &AssignmentUpdate,
    ) -> Result<Assignment, ApiError> {
        let request =
            ApiRequest::put(format!("/assignments/{}", id)).json(Self::to_body(update)?);
        self.request_data(request).await
    }

    /// Delete an assignment.
    pub async fn delete_assignment(&self, id: &str) -> Result<(), ApiError> {
        self.request_ack(ApiRequest::delete(format!("/assignments/{}", id)))
            .await
    }

    /// Submit work for an assignment.
    pub async fn submit_assignment(
        &self,
        id: &str,
        submission: &NewSubmission,
    ) -> Result<Submission, ApiError> {
        let request = ApiRequest::post(format!("/assignments/{}/submit", id))
            .json(Self::to_body(submission)?);
        self.request_data(request).await
    }

    /// Fetch all submissions for an assignment (instructor only).
    pub async fn assignment_submissions(&self, id: &str) -> Result<Vec<Submission>, ApiError> {
        self.request_data(ApiRequest::get(format!("/assignments/{}/submissions", id)))
            .await
    }

    /// Grade a submission (instructor only).
    pub async fn grade_submission(
        &self,
        submission_id: &str,
        grade: &SubmissionGrade,
    ) -> Result<Submission, ApiError> {
        let request = ApiRequest::patch(format!(
            "/assignments/submissions/{}/grade",
            submission_id
        ))
        .json(Self::to_body(grade)?);
        self.request_data(request).await
    }

    // ===== Enrollment & Progress Endpoints =====

    /// Enroll the signed-in student in a course.
    pub async fn enroll(&self, course_id: &str) -> Result<Enrollment, ApiError> {
        self.request_data(ApiRequest::post(format!("/courses/{}/enroll", course_id)))
            .await
    }

    /// Fetch the signed-in student's enrollments.
    pub async fn my_enrollments(&self) -> Result<Vec<Enrollment>, ApiError> {
        self.request_data(ApiRequest::get("/enrollments/my-courses"))
            .await
    }

    /// Leave a course.
    pub async fn unenroll(&self, enrollment_id: &str) -> Result<(), ApiError> {
        self.request_ack(ApiRequest::delete(format!("/enrollments/{}", enrollment_id)))
            .await
    }

    /// Fetch the signed-in student's progress in a course.
    pub async fn course_progress(&self, course_id: &str) -> Result<CourseProgress, ApiError> {
        self.request_data(ApiRequest::get(format!("/courses/{}/progress", course_id)))
            .await
    }

    /// Fetch a student's cross-course progress (instructor only).
    pub async fn student_progress(&self, student_id: &str) -> Result<StudentProgress, ApiError> {
        self.request_data(ApiRequest::get(format!("/students/{}/progress", student_id)))
            .await
    }

    // ===== Review Endpoints =====

    /// Fetch the reviews of a course.
    pub async fn course_reviews(&self, course_id: &str) -> Result<Vec<Review>, ApiError> {
        self.request_data(ApiRequest::get(format!("/courses/{}/reviews", course_id)))
            .await
    }

    /// Post a review for a course.
    pub async fn create_review(
        &self,
        course_id: &str,
        review: &NewReview,
    ) -> Result<Review, ApiError> {
        let request = ApiRequest::post(format!("/courses/{}/reviews", course_id))
            .json(Self::to_body(review)?);
        self.request_data(request).await
    }

    /// Update one of the caller's reviews.
    pub async fn update_review(&self, id: &str, review: &NewReview) -> Result<Review, ApiError> {
        let request =
            ApiRequest::put(format!("/reviews/{}", id)).json(Self::to_body(review)?);
        self.request_data(request).await
    }

    /// Delete one of the caller's reviews.
    pub async fn delete_review(&self, id: &str) -> Result<(), ApiError> {
        self.request_ack(ApiRequest::delete(format!("/reviews/{}", id)))
            .await
    }

    // ===== Payment Endpoints =====

    /// Open a payment intent for a course purchase.
    pub async fn create_payment_intent(&self, course_id: &str) -> Result<PaymentIntent, ApiError> {
        let request = ApiRequest::post("/payments/create-intent")
            .json(serde_json::json!({ "courseId": course_id }));
        self.request_data(request).await
    }

    /// Confirm a payment after the provider widget completes.
    pub async fn confirm_payment(&self, payment_id: &str) -> Result<PaymentRecord, ApiError> {
        let request = ApiRequest::post("/payments/confirm")
            .json(serde_json::json!({ "paymentId": payment_id }));
        self.request_data(request).await
    }

    /// Fetch the signed-in user's payment history.
    pub async fn payment_history(&self) -> Result<Vec<PaymentRecord>, ApiError> {
        self.request_data(ApiRequest::get("/payments/history")).await
    }

    // ===== User Endpoints (admin) =====

    /// Fetch a page of the user directory.
    pub async fn users(&self, query: &UserQuery) -> Result<UserPage, ApiError> {
        let mut request = ApiRequest::get("/users");
        for (key, value) in query.params() {
            request = request.query(key, value);
        }
        self.request_data(request).await
    }

    /// Fetch a single user.
    pub async fn user(&self, id: &str) -> Result<User, ApiError> {
        self.request_data(ApiRequest::get(format!("/users/{}", id)))
            .await
    }

    /// Change a user's platform role.
    pub async fn set_user_role(&self, id: &str, role: UserRole) -> Result<User, ApiError> {
        let request = ApiRequest::patch(format!("/users/{}/role", id))
            .json(serde_json::json!({ "role": role }));
        self.request_data(request).await
    }

    /// Delete a user.
    pub async fn delete_user(&self, id: &str) -> Result<(), ApiError> {
        self.request_ack(ApiRequest::delete(format!("/users/{}", id)))
            .await
    }

    /// Fetch all instructors.
    pub async fn instructors(&self) -> Result<Vec<User>, ApiError> {
        self.request_data(ApiRequest::get("/instructors")).await
    }

    /// Fetch all students.
    pub async fn students(&self) -> Result<Vec<User>, ApiError> {
        self.request_data(ApiRequest::get("/students")).await
    }

    // ===== Category Endpoints =====

    /// Fetch all course categories.
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        self.request_data(ApiRequest::get("/categories")).await
    }

    /// Create a category (admin only).
    pub async fn create_category(&self, name: &str) -> Result<Category, ApiError> {
        let request = ApiRequest::post("/categories").json(serde_json::json!({ "name": name }));
        self.request_data(request).await
    }

    /// Rename a category (admin only).
    pub async fn update_category(&self, id: &str, name: &str) -> Result<Category, ApiError> {
        let request = ApiRequest::put(format!("/categories/{}", id))
            .json(serde_json::json!({ "name": name }));
        self.request_data(request).await
    }

    /// Delete a category (admin only).
    pub async fn delete_category(&self, id: &str) -> Result<(), ApiError> {
        self.request_ack(ApiRequest::delete(format!("/categories/{}", id)))
            .await
    }
}

// Internal API response types for parsing

/// Standard success envelope most endpoints wrap their payload in.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{MemoryScope, TokenScope, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
    use mockito::{Matcher, Server, ServerGuard};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingEvents {
        expired: AtomicUsize,
        login: AtomicUsize,
    }

    impl SessionEvents for CountingEvents {
        fn session_expired(&self) {
            self.expired.fetch_add(1, Ordering::SeqCst);
        }

        fn login_required(&self) {
            self.login.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn test_client(server: &ServerGuard) -> ApiClient {
        ApiClient::with_vault(server.url(), TokenVault::in_memory()).unwrap()
    }

    fn client_with_scopes(server: &ServerGuard) -> (ApiClient, Arc<MemoryScope>, Arc<MemoryScope>) {
        let durable = Arc::new(MemoryScope::new());
        let session = Arc::new(MemoryScope::new());
        let vault = TokenVault::new(durable.clone(), session.clone());
        let client = ApiClient::with_vault(server.url(), vault).unwrap();
        (client, durable, session)
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client =
            ApiClient::with_vault("http://localhost:5000/api/", TokenVault::in_memory()).unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000/api");
    }

    #[tokio::test]
    async fn test_attaches_stored_token_and_timestamp() {
        let mut server = Server::new_async().await;
        let client = test_client(&server);
        client.vault().store("tok-1", None, true).unwrap();

        let mock = server
            .mock("GET", "/auth/me")
            .match_header("authorization", "Bearer tok-1")
            .match_header("x-request-time", Matcher::Regex(r"^\d+$".to_string()))
            .with_status(200)
            .with_body(r#"{"data": {"_id": "u1", "name": "Anik Rahman"}}"#)
            .create_async()
            .await;

        let user = client.current_user().await.unwrap();
        assert_eq!(user.id, "u1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_no_token_sends_no_authorization_header() {
        let mut server = Server::new_async().await;
        let client = test_client(&server);

        let mock = server
            .mock("GET", "/courses/popular")
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body(r#"{"data": []}"#)
            .create_async()
            .await;

        let courses = client.popular_courses().await.unwrap();
        assert!(courses.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_401_refreshes_and_retries_once() {
        let mut server = Server::new_async().await;
        let (client, durable, _session) = client_with_scopes(&server);
        client
            .vault()
            .store("stale", Some("refresh-1"), true)
            .unwrap();

        let rejected = server
            .mock("GET", "/courses/c1")
            .match_header("authorization", "Bearer stale")
            .with_status(401)
            .with_body(r#"{"message": "jwt expired"}"#)
            .expect(1)
            .create_async()
            .await;

        let refresh = server
            .mock("POST", "/auth/refresh")
            .match_header("authorization", Matcher::Missing)
            .match_body(Matcher::Json(
                serde_json::json!({ "refreshToken": "refresh-1" }),
            ))
            .with_status(200)
            .with_body(r#"{"token": "fresh"}"#)
            .expect(1)
            .create_async()
            .await;

        let retried = server
            .mock("GET", "/courses/c1")
            .match_header("authorization", "Bearer fresh")
            .with_status(200)
            .with_body(r#"{"data": {"_id": "c1", "title": "Intro to Rust"}}"#)
            .expect(1)
            .create_async()
            .await;

        let course = client.course("c1").await.unwrap();
        assert_eq!(course.title, "Intro to Rust");
        assert_eq!(durable.get(ACCESS_TOKEN_KEY).as_deref(), Some("fresh"));

        rejected.assert_async().await;
        refresh.assert_async().await;
        retried.assert_async().await;
    }

    #[tokio::test]
    async fn test_refresh_recovers_a_session_with_no_access_token() {
        let mut server = Server::new_async().await;
        let (client, durable, _session) = client_with_scopes(&server);
        // Only the refresh token survived, e.g. a restart that kept the
        // durable scope but not the session one
        durable.set(REFRESH_TOKEN_KEY, "refresh-1").unwrap();

        let rejected = server
            .mock("GET", "/auth/me")
            .match_header("authorization", Matcher::Missing)
            .with_status(401)
            .with_body(r#"{"message": "No token provided"}"#)
            .expect(1)
            .create_async()
            .await;

        let refresh = server
            .mock("POST", "/auth/refresh")
            .match_body(Matcher::Json(
                serde_json::json!({ "refreshToken": "refresh-1" }),
            ))
            .with_status(200)
            .with_body(r#"{"token": "fresh"}"#)
            .expect(1)
            .create_async()
            .await;

        let retried = server
            .mock("GET", "/auth/me")
            .match_header("authorization", "Bearer fresh")
            .with_status(200)
            .with_body(r#"{"data": {"_id": "u1", "name": "Anik Rahman"}}"#)
            .expect(1)
            .create_async()
            .await;

        let user = client.current_user().await.unwrap();
        assert_eq!(user.id, "u1");
        // With neither scope holding a token, the replacement lands durable
        assert_eq!(durable.get(ACCESS_TOKEN_KEY).as_deref(), Some("fresh"));

        rejected.assert_async().await;
        refresh.assert_async().await;
        retried.assert_async().await;
    }

    #[tokio::test]
    async fn test_custom_headers_survive_the_retry() {
        let mut server = Server::new_async().await;
        let client = test_client(&server);
        client
            .vault()
            .store("stale", Some("refresh-1"), true)
            .unwrap();

        let rejected = server
            .mock("GET", "/courses/c1")
            .match_header("authorization", "Bearer stale")
            .match_header("x-client-feature", "beta")
            .with_status(401)
            .expect(1)
            .create_async()
            .await;

        let refresh = server
            .mock("POST", "/auth/refresh")
            .with_status(200)
            .with_body(r#"{"token": "fresh"}"#)
            .expect(1)
            .create_async()
            .await;

        let retried = server
            .mock("GET", "/courses/c1")
            .match_header("authorization", "Bearer fresh")
            .match_header("x-client-feature", "beta")
            .with_status(200)
            .with_body(r#"{"data": {"_id": "c1", "title": "Intro to Rust"}}"#)
            .expect(1)
            .create_async()
            .await;

        let request = ApiRequest::get("/courses/c1").header("x-client-feature", "beta");
        let response = client.dispatch(request).await.unwrap();
        assert!(response.status().is_success());

        rejected.assert_async().await;
        refresh.assert_async().await;
        retried.assert_async().await;
    }

    #[tokio::test]
    async fn test_retry_outcome_is_final_even_on_second_401() {
        let mut server = Server::new_async().await;
        let (client, durable, _session) = client_with_scopes(&server);
        client
            .vault()
            .store("stale", Some("refresh-1"), true)
            .unwrap();
        let events = Arc::new(CountingEvents::default());
        let client = client.with_events(events.clone());

        let data = server
            .mock("GET", "/courses/c1")
            .with_status(401)
            .with_body(r#"{"message": "jwt expired"}"#)
            .expect(2)
            .create_async()
            .await;

        let refresh = server
            .mock("POST", "/auth/refresh")
            .with_status(200)
            .with_body(r#"{"token": "fresh"}"#)
            .expect(1)
            .create_async()
            .await;

        let err = client.course("c1").await.unwrap_err();
        assert!(err.is_unauthorized());

        // The replacement token survives; a failed retry is not a sign-out
        assert_eq!(durable.get(ACCESS_TOKEN_KEY).as_deref(), Some("fresh"));
        assert_eq!(events.expired.load(Ordering::SeqCst), 0);
        assert_eq!(events.login.load(Ordering::SeqCst), 0);

        data.assert_async().await;
        refresh.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_refresh_token_ends_session() {
        let mut server = Server::new_async().await;
        let (client, durable, session) = client_with_scopes(&server);
        client.vault().store("stale", None, true).unwrap();
        let events = Arc::new(CountingEvents::default());
        let client = client.with_events(events.clone());

        let data = server
            .mock("GET", "/enrollments/my-courses")
            .with_status(401)
            .with_body(r#"{"message": "jwt expired"}"#)
            .expect(1)
            .create_async()
            .await;

        let refresh = server
            .mock("POST", "/auth/refresh")
            .expect(0)
            .create_async()
            .await;

        let err = client.my_enrollments().await.unwrap_err();
        match err {
            ApiError::Unauthorized(message) => assert_eq!(message, "jwt expired"),
            other => panic!("Expected Unauthorized, got {:?}", other),
        }

        assert_eq!(durable.get(ACCESS_TOKEN_KEY), None);
        assert_eq!(session.get(ACCESS_TOKEN_KEY), None);
        assert!(!client.is_authenticated());
        assert_eq!(events.expired.load(Ordering::SeqCst), 1);
        assert_eq!(events.login.load(Ordering::SeqCst), 1);

        data.assert_async().await;
        refresh.assert_async().await;
    }

    #[tokio::test]
    async fn test_failed_refresh_ends_session_with_original_error() {
        let mut server = Server::new_async().await;
        let client = test_client(&server);
        client
            .vault()
            .store("stale", Some("refresh-1"), true)
            .unwrap();
        let events = Arc::new(CountingEvents::default());
        let client = client.with_events(events.clone());

        let data = server
            .mock("GET", "/courses/c1")
            .with_status(401)
            .with_body(r#"{"message": "jwt expired"}"#)
            .expect(1)
            .create_async()
            .await;

        let refresh = server
            .mock("POST", "/auth/refresh")
            .with_status(401)
            .with_body(r#"{"message": "refresh token expired"}"#)
            .expect(1)
            .create_async()
            .await;

        let err = client.course("c1").await.unwrap_err();
        match err {
            // The original failure surfaces, not the refresh failure
            ApiError::Unauthorized(message) => assert_eq!(message, "jwt expired"),
            other => panic!("Expected Unauthorized, got {:?}", other),
        }

        assert!(!client.is_authenticated());
        assert_eq!(client.vault().refresh_token(), None);
        assert_eq!(events.expired.load(Ordering::SeqCst), 1);
        assert_eq!(events.login.load(Ordering::SeqCst), 1);

        data.assert_async().await;
        refresh.assert_async().await;
    }

    #[tokio::test]
    async fn test_login_rejection_does_not_request_navigation() {
        let mut server = Server::new_async().await;
        let events = Arc::new(CountingEvents::default());
        let client = test_client(&server).with_events(events.clone());

        let mock = server
            .mock("POST", "/auth/login")
            .with_status(401)
            .with_body(r#"{"message": "Invalid credentials"}"#)
            .expect(1)
            .create_async()
            .await;

        let err = client
            .login("anik@example.com", "wrong", true)
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());

        assert_eq!(events.expired.load(Ordering::SeqCst), 1);
        assert_eq!(events.login.load(Ordering::SeqCst), 0);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_login_stores_credentials_per_remember_flag() {
        let mut server = Server::new_async().await;
        let (client, durable, session) = client_with_scopes(&server);

        let mock = server
            .mock("POST", "/auth/login")
            .match_body(Matcher::Json(serde_json::json!({
                "email": "anik@example.com",
                "password": "hunter2"
            })))
            .with_status(200)
            .with_body(
                r#"{
                    "token": "jwt-access",
                    "refreshToken": "jwt-refresh",
                    "user": {"_id": "u1", "name": "Anik Rahman", "role": "student"},
                    "message": "Login successful"
                }"#,
            )
            .expect(2)
            .create_async()
            .await;

        let signed_in = client
            .login("anik@example.com", "hunter2", false)
            .await
            .unwrap();
        assert_eq!(signed_in.user.display_name(), "Anik Rahman");
        assert_eq!(session.get(ACCESS_TOKEN_KEY).as_deref(), Some("jwt-access"));
        assert_eq!(durable.get(ACCESS_TOKEN_KEY), None);
        assert_eq!(
            durable.get(REFRESH_TOKEN_KEY).as_deref(),
            Some("jwt-refresh")
        );

        client
            .login("anik@example.com", "hunter2", true)
            .await
            .unwrap();
        assert_eq!(durable.get(ACCESS_TOKEN_KEY).as_deref(), Some("jwt-access"));
        assert_eq!(session.get(ACCESS_TOKEN_KEY), None);

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_validation_error_carries_field_detail_without_refresh() {
        let mut server = Server::new_async().await;
        let client = test_client(&server);
        client
            .vault()
            .store("tok-1", Some("refresh-1"), true)
            .unwrap();

        let mock = server
            .mock("POST", "/auth/register")
            .with_status(422)
            .with_body(r#"{"message": "Validation failed", "errors": {"email": "invalid"}}"#)
            .expect(1)
            .create_async()
            .await;
        let refresh = server
            .mock("POST", "/auth/refresh")
            .expect(0)
            .create_async()
            .await;

        let new_user = NewUser {
            name: "Anik".to_string(),
            email: "not-an-email".to_string(),
            password: "hunter2".to_string(),
            role: None,
        };
        let err = client.register(&new_user, true).await.unwrap_err();
        match err {
            ApiError::ValidationFailed { message, errors } => {
                assert_eq!(message, "Validation failed");
                assert_eq!(errors.get("email").map(String::as_str), Some("invalid"));
            }
            other => panic!("Expected ValidationFailed, got {:?}", other),
        }

        mock.assert_async().await;
        refresh.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_does_not_refresh() {
        let mut server = Server::new_async().await;
        let client = test_client(&server);
        client
            .vault()
            .store("tok-1", Some("refresh-1"), true)
            .unwrap();

        let mock = server
            .mock("GET", "/quizzes/q1")
            .with_status(500)
            .with_body(r#"{"message": "boom"}"#)
            .expect(1)
            .create_async()
            .await;
        let refresh = server
            .mock("POST", "/auth/refresh")
            .expect(0)
            .create_async()
            .await;

        let err = client.quiz("q1").await.unwrap_err();
        match err {
            ApiError::ServerError(message) => assert_eq!(message, "boom"),
            other => panic!("Expected ServerError, got {:?}", other),
        }
        // A non-401 failure leaves credentials alone
        assert!(client.is_authenticated());

        mock.assert_async().await;
        refresh.assert_async().await;
    }

    #[tokio::test]
    async fn test_concurrent_401s_share_one_refresh() {
        let mut server = Server::new_async().await;
        let client = test_client(&server);
        client
            .vault()
            .store("stale", Some("refresh-1"), true)
            .unwrap();

        let mut data_mocks = Vec::new();
        for path in ["/lessons/l1", "/lessons/l2"] {
            data_mocks.push(
                server
                    .mock("GET", path)
                    .match_header("authorization", "Bearer stale")
                    .with_status(401)
                    .create_async()
                    .await,
            );
            data_mocks.push(
                server
                    .mock("GET", path)
                    .match_header("authorization", "Bearer fresh")
                    .with_status(200)
                    .with_body(r#"{"data": {"_id": "l1", "title": "Lesson"}}"#)
                    .create_async()
                    .await,
            );
        }

        let refresh = server
            .mock("POST", "/auth/refresh")
            .with_status(200)
            .with_body(r#"{"token": "fresh"}"#)
            .expect(1)
            .create_async()
            .await;

        let (a, b) = futures::future::join(client.lesson("l1"), client.lesson("l2")).await;
        assert!(a.is_ok());
        assert!(b.is_ok());
        assert_eq!(client.vault().access_token().as_deref(), Some("fresh"));

        refresh.assert_async().await;
    }

    #[tokio::test]
    async fn test_refresh_preserves_session_scope() {
        let mut server = Server::new_async().await;
        let (client, durable, session) = client_with_scopes(&server);
        client
            .vault()
            .store("stale", Some("refresh-1"), false)
            .unwrap();

        let _rejected = server
            .mock("GET", "/auth/me")
            .match_header("authorization", "Bearer stale")
            .with_status(401)
            .create_async()
            .await;
        let _refresh = server
            .mock("POST", "/auth/refresh")
            .with_status(200)
            .with_body(r#"{"token": "fresh"}"#)
            .create_async()
            .await;
        let _retried = server
            .mock("GET", "/auth/me")
            .match_header("authorization", "Bearer fresh")
            .with_status(200)
            .with_body(r#"{"data": {"_id": "u1"}}"#)
            .create_async()
            .await;

        client.current_user().await.unwrap();

        // An unremembered sign-in stays session-scoped across refreshes
        assert_eq!(session.get(ACCESS_TOKEN_KEY).as_deref(), Some("fresh"));
        assert_eq!(durable.get(ACCESS_TOKEN_KEY), None);
    }

    #[tokio::test]
    async fn test_logout_clears_credentials_even_when_server_fails() {
        let mut server = Server::new_async().await;
        let client = test_client(&server);
        client
            .vault()
            .store("tok-1", Some("refresh-1"), true)
            .unwrap();

        let mock = server
            .mock("POST", "/auth/logout")
            .with_status(500)
            .expect(1)
            .create_async()
            .await;

        client.logout().await.unwrap();
        assert!(!client.is_authenticated());
        assert_eq!(client.vault().refresh_token(), None);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_malformed_success_body_is_unknown_error() {
        let mut server = Server::new_async().await;
        let client = test_client(&server);

        let mock = server
            .mock("GET", "/courses/c9")
            .with_status(200)
            .with_body("<!doctype html>")
            .expect(1)
            .create_async()
            .await;

        let err = client.course("c9").await.unwrap_err();
        assert!(matches!(err, ApiError::UnknownError(_)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_short_suggestion_queries_skip_the_network() {
        let server = Server::new_async().await;
        let client = test_client(&server);

        // No mock registered: any request would fail the test
        let suggestions = client.search_suggestions("r").await.unwrap();
        assert!(suggestions.is_empty());
    }
}
