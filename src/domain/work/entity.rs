use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::{
    Collection, Contributor, DomainError, NewCollection, NewContributor, NewTag, NewVolume, Tag,
    Volume,
};

/// A cataloged serialized publication (manga, novel or doujinshi).
/// This is the root entity of the catalog; contributors, tags and
/// collections are shared across works, volumes are owned exclusively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Work {
    /// Store-assigned identifier
    pub id: i64,

    /// Display title (required, non-empty)
    pub title: String,

    /// Title in the original language, if known
    pub native_title: Option<String>,

    /// Where the user is in reading this work
    pub reading_status: Option<ReadingStatus>,

    /// Publication state of the work itself
    pub publication_status: Option<PublicationStatus>,

    /// Star rating, inclusive range 1–5
    pub star_rating: Option<f64>,

    /// Language tag of this edition (e.g. "EN", "DE")
    pub language: Option<String>,

    /// Classification category
    pub category: Category,

    /// Synopsis / summary text
    pub summary: Option<String>,

    /// Local cover filename in the cover store, if any
    pub cover: Option<String>,

    pub contributors: Vec<Contributor>,
    pub tags: Vec<Tag>,
    pub collections: Vec<Collection>,
    pub volumes: Vec<Volume>,

    /// Creation timestamp (repository-maintained)
    pub created_at: DateTime<Utc>,

    /// Last update timestamp (repository-maintained)
    pub updated_at: DateTime<Utc>,
}

/// The canonical "create" shape for a Work. Both source adapters and direct
/// user entry produce this; nested entries are name-only and get reconciled
/// against existing rows on persist. The cover may still be a remote URL at
/// this point; resolution happens in the cover asset manager.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewWork {
    pub title: String,
    pub native_title: Option<String>,
    pub reading_status: Option<ReadingStatus>,
    pub publication_status: Option<PublicationStatus>,
    pub star_rating: Option<f64>,
    pub language: Option<String>,
    pub category: Category,
    pub summary: Option<String>,
    pub cover: Option<String>,
    pub contributors: Vec<NewContributor>,
    pub tags: Vec<NewTag>,
    pub collections: Vec<NewCollection>,
    pub volumes: Vec<NewVolume>,
}

impl NewWork {
    pub fn new(title: impl Into<String>, category: Category) -> Self {
        Self {
            title: title.into(),
            category,
            ..Self::default()
        }
    }
}

/// Reading progress of the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingStatus {
    NotStarted,
    InProgress,
    Completed,
    OnHold,
    Dropped,
}

/// Publication state of the work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicationStatus {
    Ongoing,
    Completed,
    Hiatus,
    Cancelled,
}

/// Classification category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Manga,
    Novel,
    Doujinshi,
}

impl Default for Category {
    fn default() -> Self {
        Category::Manga
    }
}

impl ReadingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingStatus::NotStarted => "not_started",
            ReadingStatus::InProgress => "in_progress",
            ReadingStatus::Completed => "completed",
            ReadingStatus::OnHold => "on_hold",
            ReadingStatus::Dropped => "dropped",
        }
    }
}

impl PublicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublicationStatus::Ongoing => "ongoing",
            PublicationStatus::Completed => "completed",
            PublicationStatus::Hiatus => "hiatus",
            PublicationStatus::Cancelled => "cancelled",
        }
    }
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Manga => "manga",
            Category::Novel => "novel",
            Category::Doujinshi => "doujinshi",
        }
    }
}

impl FromStr for ReadingStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(ReadingStatus::NotStarted),
            "in_progress" => Ok(ReadingStatus::InProgress),
            "completed" => Ok(ReadingStatus::Completed),
            "on_hold" => Ok(ReadingStatus::OnHold),
            "dropped" => Ok(ReadingStatus::Dropped),
            _ => Err(DomainError::UnknownValue {
                kind: "reading status",
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for PublicationStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ongoing" => Ok(PublicationStatus::Ongoing),
            "completed" => Ok(PublicationStatus::Completed),
            "hiatus" => Ok(PublicationStatus::Hiatus),
            "cancelled" => Ok(PublicationStatus::Cancelled),
            _ => Err(DomainError::UnknownValue {
                kind: "publication status",
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for Category {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manga" => Ok(Category::Manga),
            "novel" => Ok(Category::Novel),
            "doujinshi" => Ok(Category::Doujinshi),
            _ => Err(DomainError::UnknownValue {
                kind: "category",
                value: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::fmt::Display for PublicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
