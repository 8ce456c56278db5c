use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::course::Course;

/// Server-created intent handed to the payment provider widget.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    #[serde(rename = "clientSecret")]
    pub client_secret: String,
    #[serde(rename = "paymentId")]
    pub payment_id: Option<String>,
    pub amount: Option<f64>,
    pub currency: Option<String>,
}

/// A settled (or attempted) payment in the user's history.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub course: Option<Course>,
    pub amount: Option<f64>,
    pub currency: Option<String>,
    /// "pending", "succeeded", or "failed"
    pub status: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
}

impl PaymentRecord {
    pub fn succeeded(&self) -> bool {
        self.status.as_deref() == Some("succeeded")
    }
}
