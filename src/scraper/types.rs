//! Pin data extracted from result pages

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::Topic;

/// One pin card as read out of the page by the extraction script.
///
/// Fields are whatever the DOM had; a card without an id or image URL is
/// not a usable pin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPin {
    #[serde(default)]
    pub pin_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub pin_url: Option<String>,
}

impl RawPin {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.pin_id.trim().is_empty()
            && self
                .image_url
                .as_deref()
                .is_some_and(|u| !u.trim().is_empty())
    }
}

/// An accepted pin. Immutable once the dedup index has admitted it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pin {
    pub id: String,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub pin_url: String,
    pub topic: Topic,
    pub scraped_at: DateTime<Utc>,
}

impl Pin {
    /// Build from a validated raw card. Returns `None` for invalid cards.
    #[must_use]
    pub fn from_raw(raw: RawPin, topic: &Topic) -> Option<Self> {
        if !raw.is_valid() {
            return None;
        }
        let id = raw.pin_id.trim().to_string();
        let pin_url = raw
            .pin_url
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| format!("{}/pin/{id}/", crate::utils::PIN_URL_BASE));
        Some(Self {
            title: raw.title.trim().to_string(),
            description: raw.description.trim().to_string(),
            image_url: raw.image_url.unwrap_or_default().trim().to_string(),
            pin_url,
            topic: topic.clone(),
            scraped_at: Utc::now(),
            id,
        })
    }
}

/// Why a topic's scroll loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    CapReached,
    Stalled,
    DeadlineElapsed,
    Cancelled,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::CapReached => "cap reached",
            Self::Stalled => "no new pins",
            Self::DeadlineElapsed => "topic deadline elapsed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}
