use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// Stored paste
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Paste {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    // Remove the paste once it has been read this many times, 0 = never
    #[serde(default)]
    pub delete_after: u32,
    #[serde(default)]
    pub current_reads: u32,
}

// Body of POST /pastes
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct CreatePaste {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub delete_after: u32,
}

// Body of PUT /pastes/{id}
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct UpdatePaste {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum Window {
    #[serde(rename = "last-day")]
    LastDay,
    #[serde(rename = "last-week")]
    LastWeek,
    #[serde(rename = "last-month")]
    LastMonth,
    #[serde(rename = "last-year")]
    LastYear,
    #[default]
    #[serde(other)]
    All,
}

impl Window {
    // Oldest creation time included by this window
    pub fn since(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Window::LastDay => Some(now - Duration::days(1)),
            Window::LastWeek => Some(now - Duration::days(7)),
            Window::LastMonth => now.checked_sub_months(chrono::Months::new(1)),
            Window::LastYear => now.checked_sub_months(chrono::Months::new(12)),
            Window::All => None,
        }
    }
}

// Query string of GET /pastes
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ListQuery {
    // 1 = oldest first, -1 = newest first, anything else falls back to 1
    #[serde(default, deserialize_with = "lenient")]
    pub sort: i32,
    #[serde(default, deserialize_with = "lenient")]
    pub page: usize,
    #[serde(default)]
    pub filter: Window,
}

// Unparseable numbers fall back to the default instead of rejecting the query
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Default,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or_default())
}

impl ListQuery {
    pub fn newest_first(&self) -> bool {
        self.sort == -1
    }

    // Pages start at 1
    pub fn page(&self) -> usize {
        self.page.max(1)
    }
}

// Response of GET /pastes
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PastePage {
    pub pastes: Vec<Paste>,
    pub page: usize,
    pub next: usize,
    pub prev: usize,
}
