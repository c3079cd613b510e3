use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use validator::Validate;

/// Placeholder segment some backend builds leave in generated short URLs.
const SHORT_CODE_PLACEHOLDER: &str = "{shortCode}/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum ShortUrlStatus {
    Enabled,
    Disabled,
    Expired,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortUrl {
    #[serde(default)]
    pub id: Option<i64>,
    pub short_code: String,
    pub original_url: String,
    #[serde(default)]
    pub short_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub status: ShortUrlStatus,
    #[serde(default)]
    pub total_clicks: u64,
    #[serde(default)]
    pub max_usage: Option<u64>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub has_password: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ShortUrl {
    /// Short URL with any placeholder segment removed.
    pub fn display_url(&self) -> Option<String> {
        self.short_url.as_deref().map(fix_short_url_format)
    }

    /// Remaining uses before the usage limit is hit, if there is one.
    pub fn remaining_usage(&self) -> Option<u64> {
        self.max_usage
            .map(|max| max.saturating_sub(self.total_clicks))
    }

    pub fn is_usable(&self) -> bool {
        self.status == ShortUrlStatus::Enabled && self.remaining_usage() != Some(0)
    }
}

/// Drop the literal `{shortCode}/` segment from a generated short URL.
///
/// `http://host/{shortCode}/abc123` becomes `http://host/abc123`. Applying it
/// to an already fixed URL returns it unchanged.
pub fn fix_short_url_format(url: &str) -> String {
    let mut fixed = url.to_string();
    // Removing one placeholder can splice its neighbours into another
    while let Some(start) = fixed.find(SHORT_CODE_PLACEHOLDER) {
        fixed.replace_range(start..start + SHORT_CODE_PLACEHOLDER.len(), "");
    }
    fixed
}

#[derive(Debug, Clone, Default, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateShortUrlRequest {
    #[validate(url(message = "Please enter a valid URL"))]
    pub original_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 3, max = 32, message = "Custom code must be 3-32 characters"))]
    pub custom_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 255, message = "Description is too long"))]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 4, message = "Password must be at least 4 characters"))]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, message = "Usage limit must be at least 1"))]
    pub max_usage: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateShortUrlRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(url(message = "Please enter a valid URL"))]
    pub original_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 255, message = "Description is too long"))]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, message = "Usage limit must be at least 1"))]
    pub max_usage: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    /// `None` removes the password.
    #[validate(length(min = 4, message = "Password must be at least 4 characters"))]
    pub password: Option<String>,
}

/// Query of `GET /url` and `GET /url/search`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShortUrlSearch {
    pub query: String,
    pub status: Option<ShortUrlStatus>,
    pub page: u32,
    pub size: u32,
    pub sort_by: Option<String>,
    pub descending: bool,
}

impl ShortUrlSearch {
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.to_string()),
            ("size", self.size.max(1).to_string()),
        ];
        if !self.query.trim().is_empty() {
            params.push(("query", self.query.trim().to_string()));
        }
        if let Some(status) = self.status {
            params.push(("status", status.to_string()));
        }
        if let Some(ref sort_by) = self.sort_by {
            params.push(("sortBy", sort_by.clone()));
            params.push((
                "sortDirection",
                if self.descending { "desc" } else { "asc" }.to_string(),
            ));
        }
        params
    }
}
