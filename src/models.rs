//! Domain models shared by the ports, the view coordinator and the TUI. These
//! types stay plain data holders; the only behaviour here is display-oriented
//! formatting that several screens would otherwise duplicate.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Placeholder shown wherever the directory had no value for a field.
pub const NO_DATA: &str = "No Data Available";

#[derive(Debug, Clone, PartialEq, Eq)]
/// A signed-in person as reported by the identity provider. We only ever read
/// these two fields.
pub struct User {
    pub id: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// One species as returned by the bird directory. The same struct doubles as
/// the snapshot embedded in a [`ListEntry`], which is why it round-trips
/// through serde in both directions.
pub struct BirdRecord {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sci_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub order: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub family: String,
    /// Conservation status exactly as the directory spells it.
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub region: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<String>,
    #[serde(default, deserialize_with = "measurement")]
    pub wingspan_min: Option<f64>,
    #[serde(default, deserialize_with = "measurement")]
    pub wingspan_max: Option<f64>,
    #[serde(default, deserialize_with = "measurement")]
    pub length_min: Option<f64>,
    #[serde(default, deserialize_with = "measurement")]
    pub length_max: Option<f64>,
}

/// The directory sends `null` for fields it has no value for.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The directory is inconsistent about measurements: some records carry
/// numbers, others numeric strings, others empty strings.
fn measurement<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(value)) => Some(value),
        Some(Raw::Text(text)) => text.trim().parse::<f64>().ok(),
        None => None,
    })
}

impl BirdRecord {
    pub fn primary_image(&self) -> Option<&str> {
        self.images
            .iter()
            .map(|url| url.trim())
            .find(|url| !url.is_empty())
    }

    pub fn conservation(&self) -> ConservationStatus {
        ConservationStatus::classify(&self.status)
    }

    pub fn region_summary(&self) -> String {
        if self.region.is_empty() {
            NO_DATA.to_string()
        } else {
            self.region.join(", ")
        }
    }

    pub fn wingspan_summary(&self) -> String {
        range_summary(self.wingspan_min, self.wingspan_max)
    }

    pub fn length_summary(&self) -> String {
        range_summary(self.length_min, self.length_max)
    }
}

/// Both bounds have to be present; a half-open range reads as missing data.
fn range_summary(min: Option<f64>, max: Option<f64>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!("{min} - {max} cm"),
        _ => NO_DATA.to_string(),
    }
}

/// Text to show in place of an empty scalar field.
pub fn or_no_data(value: &str) -> &str {
    if value.trim().is_empty() {
        NO_DATA
    } else {
        value
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Buckets used to colour the status tag on bird cards.
pub enum ConservationStatus {
    LowConcern,
    SteepDecline,
    Declining,
    RedWatchList,
    Unknown,
}

impl ConservationStatus {
    pub fn classify(status: &str) -> Self {
        match status.trim() {
            "Low Concern" => ConservationStatus::LowConcern,
            "Common Bird in Steep Decline" => ConservationStatus::SteepDecline,
            "Declining" => ConservationStatus::Declining,
            "Red Watch List" => ConservationStatus::RedWatchList,
            _ => ConservationStatus::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
/// A bird snapshot stored under a list. `bird` is copied at add time and
/// never reconciled with the directory afterwards.
pub struct ListEntry {
    pub id: String,
    pub bird: BirdRecord,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
/// A user-owned named collection, hydrated with its entries.
pub struct BirdList {
    pub id: String,
    pub name: String,
    pub description: String,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub entries: Vec<ListEntry>,
}

impl BirdList {
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Creation date in the long form used on the list header, e.g.
    /// `March 4, 2024`.
    pub fn created_on(&self) -> String {
        self.created_at.format("%B %-d, %Y").to_string()
    }
}

impl fmt::Display for BirdList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Parameters for one directory request. Pages are 1-based.
pub struct SearchQuery {
    pub name: String,
    pub region: Option<String>,
    pub page: u32,
    pub page_size: u32,
}

impl SearchQuery {
    pub fn new(name: impl Into<String>, page_size: u32) -> Self {
        Self {
            name: name.into(),
            region: None,
            page: 1,
            page_size,
        }
    }

    pub fn with_region(mut self, region: Option<String>) -> Self {
        self.region = region
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        self
    }

    pub fn at_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchPage {
    pub birds: Vec<BirdRecord>,
    pub page: u32,
    pub total_pages: u32,
}

impl Default for SearchPage {
    fn default() -> Self {
        Self {
            birds: Vec::new(),
            page: 1,
            total_pages: 1,
        }
    }
}
