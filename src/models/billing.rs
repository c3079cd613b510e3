/// Plans, subscriptions and VNPay payments.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum PlanType {
    Free,
    Pro,
    Enterprise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum BillingInterval {
    Monthly,
    Yearly,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: i64,
    #[serde(rename = "type")]
    pub plan_type: PlanType,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    pub billing_interval: BillingInterval,
    #[serde(default)]
    pub max_short_urls: Option<u64>,
    #[serde(default)]
    pub max_usage_per_url: Option<u64>,
    #[serde(default)]
    pub custom_domain_enabled: bool,
    #[serde(default)]
    pub statistics_enabled: bool,
    #[serde(default)]
    pub api_access_enabled: bool,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlanRequest {
    #[serde(rename = "type")]
    pub plan_type: PlanType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: f64,
    pub billing_interval: BillingInterval,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_short_urls: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_usage_per_url: Option<u64>,
    pub custom_domain_enabled: bool,
    pub statistics_enabled: bool,
    pub api_access_enabled: bool,
}

#[derive(Debug, Clone, Default, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlanRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_short_urls: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_usage_per_url: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanStatusRequest {
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    Pending,
    Active,
    Cancelled,
    Expired,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: String,
    pub plan: Plan,
    pub status: SubscriptionStatus,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionRequest {
    pub plan_id: i64,
    /// Apply immediately instead of at the end of the current period.
    pub apply_immediately: bool,
}

/// Price quote for switching to a plan, including pro-rata credit.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionCost {
    pub plan_id: i64,
    pub amount: f64,
    #[serde(default)]
    pub credit_amount: f64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl SubscriptionCost {
    /// Amount due after credit, never negative.
    pub fn amount_due(&self) -> f64 {
        (self.amount - self.credit_amount).max(0.0)
    }
}

#[derive(Debug, Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VnpayPaymentRequest {
    pub subscription_id: String,
    #[validate(range(min = 1.0, message = "Amount must be positive"))]
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VnpayPaymentResponse {
    pub payment_url: String,
    #[serde(default)]
    pub payment_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
