// src/sources/jikan.rs
//
// Jikan (api.jikan.moe) adapter - JSON API over the MyAnimeList catalog.
//
// References are MAL ids, as returned in search results on the provider
// side. Jikan serves the international audience, so mapped works carry
// language "EN".

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::{Category, NewContributor, NewTag, NewWork};
use crate::error::{AppError, AppResult};
use crate::sources::{dedup_names_case_insensitive, SourceAdapter};

const DEFAULT_BASE_URL: &str = "https://api.jikan.moe/v4";
const SEARCH_LIMIT: &str = "10";

pub struct JikanAdapter {
    base_url: String,
    http_client: Client,
}

/// Manga payload subset this adapter maps. Entries missing a title fail
/// deserialization and are treated as unparseable candidates.
#[derive(Debug, Deserialize)]
struct JikanManga {
    title: String,
    title_japanese: Option<String>,
    synopsis: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    images: Option<JikanImages>,
    #[serde(default)]
    authors: Vec<JikanNamed>,
    #[serde(default)]
    genres: Vec<JikanNamed>,
    #[serde(default)]
    themes: Vec<JikanNamed>,
    #[serde(default)]
    demographics: Vec<JikanNamed>,
}

#[derive(Debug, Deserialize)]
struct JikanImages {
    jpg: Option<JikanImageSet>,
}

#[derive(Debug, Deserialize)]
struct JikanImageSet {
    image_url: Option<String>,
    large_image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JikanNamed {
    name: Option<String>,
}

impl JikanAdapter {
    pub const NAME: &'static str = "Jikan";

    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.into(),
            http_client,
        }
    }

    /// Fixed lookup from Jikan type strings; anything unmapped is a manga.
    fn map_category(kind: &str) -> Category {
        match kind {
            "Manga" | "One-shot" | "Manhwa" | "Manhua" | "OEL" => Category::Manga,
            "Novel" | "Light Novel" => Category::Novel,
            "Doujinshi" => Category::Doujinshi,
            _ => Category::Manga,
        }
    }

    fn map_entry(entry: JikanManga) -> NewWork {
        let category = entry
            .kind
            .as_deref()
            .map(Self::map_category)
            .unwrap_or(Category::Manga);

        let cover = entry
            .images
            .and_then(|images| images.jpg)
            .and_then(|jpg| jpg.large_image_url.or(jpg.image_url));

        let author_names: Vec<String> = entry
            .authors
            .into_iter()
            .filter_map(|author| author.name)
            .collect();
        let contributors = dedup_names_case_insensitive(author_names)
            .into_iter()
            .map(NewContributor::new)
            .collect();

        // Genres, themes and demographics all land in one tag namespace
        let mut tag_names: Vec<String> = Vec::new();
        for group in [entry.genres, entry.themes, entry.demographics] {
            tag_names.extend(group.into_iter().filter_map(|tag| tag.name));
        }
        let mut seen = std::collections::HashSet::new();
        let tags = tag_names
            .into_iter()
            .filter(|name| seen.insert(name.clone()))
            .map(NewTag::new)
            .collect();

        NewWork {
            title: entry.title,
            native_title: entry.title_japanese,
            reading_status: None,
            publication_status: None,
            // Ratings are never inferred from provider data
            star_rating: None,
            language: Some("EN".to_string()),
            category,
            summary: Some(entry.synopsis.unwrap_or_default()),
            cover,
            contributors,
            tags,
            collections: Vec::new(),
            volumes: Vec::new(),
        }
    }

    /// Map each raw search item, dropping the ones that fail to parse.
    fn parse_candidates(items: Vec<Value>) -> Vec<NewWork> {
        items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<JikanManga>(item) {
                Ok(entry) => Some(Self::map_entry(entry)),
                Err(e) => {
                    log::warn!("Dropping unparseable Jikan search candidate: {}", e);
                    None
                }
            })
            .collect()
    }
}

impl Default for JikanAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceAdapter for JikanAdapter {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn search(&self, term: &str) -> AppResult<Vec<NewWork>> {
        let url = format!("{}/manga", self.base_url);

        let response = self
            .http_client
            .get(&url)
            .query(&[("q", term), ("limit", SEARCH_LIMIT)])
            .send()
            .await
            .map_err(|e| AppError::FetchFailed(format!("Jikan search request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| AppError::FetchFailed(format!("Jikan search request failed: {}", e)))?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::FetchFailed(format!("Jikan search response invalid: {}", e)))?;

        let items = body
            .get("data")
            .and_then(|data| data.as_array())
            .cloned()
            .unwrap_or_default();

        Ok(Self::parse_candidates(items))
    }

    async fn fetch(&self, reference: &str) -> AppResult<NewWork> {
        let url = format!("{}/manga/{}", self.base_url, reference);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::FetchFailed(format!("Jikan fetch request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| AppError::FetchFailed(format!("Jikan fetch request failed: {}", e)))?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::FetchFailed(format!("Jikan fetch response invalid: {}", e)))?;

        let data = body
            .get("data")
            .cloned()
            .ok_or_else(|| AppError::FetchFailed("Jikan fetch response missing data".to_string()))?;

        let entry = serde_json::from_value::<JikanManga>(data)
            .map_err(|e| AppError::FetchFailed(format!("Jikan fetch response invalid: {}", e)))?;

        Ok(Self::map_entry(entry))
    }
}
