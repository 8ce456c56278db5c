use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::lesson::Lesson;
use super::user::PersonRef;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub instructor: Option<PersonRef>,
    pub price: Option<f64>,
    pub rating: Option<f64>,
    #[serde(rename = "totalReviews")]
    pub total_reviews: Option<u32>,
    pub level: Option<String>,
    pub category: Option<Category>,
    /// Ids of enrolled students; present on detail responses
    #[serde(default)]
    pub students: Vec<String>,
    /// Embedded lesson list; present on detail responses
    #[serde(default)]
    pub lessons: Vec<Lesson>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Course {
    pub fn is_free(&self) -> bool {
        self.price.unwrap_or(0.0) == 0.0
    }

    pub fn category_name(&self) -> &str {
        self.category
            .as_ref()
            .map(|c| c.name.as_str())
            .unwrap_or("Uncategorized")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub name: String,
    pub description: Option<String>,
}

/// Course creation payload.
#[derive(Debug, Clone, Serialize)]
pub struct NewCourse {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Category id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

/// Course update payload; absent fields are left untouched server-side.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CourseUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

/// One page of the course catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct CoursePage {
    #[serde(default)]
    pub courses: Vec<Course>,
    pub page: Option<u32>,
    #[serde(rename = "totalPages")]
    pub total_pages: Option<u32>,
    pub total: Option<u32>,
}

impl CoursePage {
    /// Whether a further page exists.
    pub fn has_next_page(&self) -> bool {
        match (self.page, self.total_pages) {
            (Some(page), Some(total)) => page < total,
            _ => false,
        }
    }
}

/// Filters for the course catalog listing.
#[derive(Debug, Clone, Default)]
pub struct CourseQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub category: Option<String>,
    pub level: Option<String>,
    pub search: Option<String>,
}

impl CourseQuery {
    /// Wire form of the present filters.
    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(page) = self.page {
            params.push(("page".to_string(), page.to_string()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(ref category) = self.category {
            params.push(("category".to_string(), category.clone()));
        }
        if let Some(ref level) = self.level {
            params.push(("level".to_string(), level.clone()));
        }
        if let Some(ref search) = self.search {
            params.push(("search".to_string(), search.clone()));
        }
        params
    }
}

/// Optional narrowing of a course search.
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    pub category: Option<String>,
    pub level: Option<String>,
    /// "free", "paid", or a price cap, passed through as-is
    pub price: Option<String>,
}

/// Result set of a course search.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub results: Vec<Course>,
    pub total: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    #[serde(rename = "_id")]
    pub id: String,
    pub rating: f64,
    pub comment: Option<String>,
    pub user: Option<PersonRef>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Review creation/update payload.
#[derive(Debug, Clone, Serialize)]
pub struct NewReview {
    pub rating: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}
