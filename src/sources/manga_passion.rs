// src/sources/manga_passion.rs
//
// Manga-Passion adapter - the provider has no public API, so pages are
// rendered by an injected `PageRenderer` (a headless browser session owned
// by the caller) and scraped. Search listings carry titles only; the
// edition URL shown alongside a candidate is what callers pass back into
// `fetch`.

use std::sync::Arc;

use async_trait::async_trait;
use scraper::{Html, Selector};

use crate::domain::{Category, NewContributor, NewTag, NewWork};
use crate::error::{AppError, AppResult};
use crate::sources::{dedup_names_case_insensitive, SourceAdapter};

const DEFAULT_BASE_URL: &str = "https://api.manga-passion.de";
const SEARCH_RESULT_LIMIT: usize = 5;

/// Rendered-page capability. Construction and lifetime of the underlying
/// browser session are the caller's concern; when the capability cannot be
/// built, this provider is simply not registered.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, url: &str) -> AppResult<String>;
}

pub struct MangaPassionAdapter {
    base_url: String,
    renderer: Arc<dyn PageRenderer>,
}

impl MangaPassionAdapter {
    pub const NAME: &'static str = "MangaPassion";

    pub fn new(renderer: Arc<dyn PageRenderer>) -> Self {
        Self::with_base_url(renderer, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(renderer: Arc<dyn PageRenderer>, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            renderer,
        }
    }
}

fn selector(css: &str) -> AppResult<Selector> {
    Selector::parse(css)
        .map_err(|e| AppError::FetchFailed(format!("Invalid selector {}: {:?}", css, e)))
}

fn element_text(element: scraper::ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Candidates come from the search listing. Items missing a title or a
/// detail link are skipped; the rest become minimal canonical works.
fn parse_search(html: &str) -> AppResult<Vec<NewWork>> {
    let document = Html::parse_document(html);
    let item_sel = selector(".manga-list_listItemWrapper__bwhIS")?;
    let title_sel = selector(".manga-list_title__GKlEd")?;
    let link_sel = selector("a[href]")?;

    let mut results = Vec::new();
    for item in document.select(&item_sel).take(SEARCH_RESULT_LIMIT) {
        let title = item.select(&title_sel).next().map(element_text);
        let link = item
            .select(&link_sel)
            .next()
            .and_then(|a| a.value().attr("href"));

        match (title, link) {
            (Some(title), Some(_)) if !title.is_empty() => {
                let mut work = NewWork::new(title, Category::Manga);
                work.language = Some("DE".to_string());
                results.push(work);
            }
            _ => log::warn!("Skipping Manga-Passion search item with missing title or link"),
        }
    }
    Ok(results)
}

fn parse_detail(html: &str, base_url: &str) -> AppResult<NewWork> {
    let document = Html::parse_document(html);
    let title_sel = selector("h1")?;
    let details_sel = selector("ul.manga_details__UYMcm")?;
    let anchor_sel = selector("a")?;
    let summary_sel = selector("div.manga_description__vzPCx p")?;
    let meta_sel = selector(r#"meta[name="description"]"#)?;
    let cover_sel = selector("img.img_img__jkdIh")?;

    let title = document
        .select(&title_sel)
        .next()
        .map(element_text)
        .filter(|title| !title.is_empty())
        .ok_or_else(|| AppError::FetchFailed("Title not found on the page".to_string()))?;

    let mut author_names: Vec<String> = Vec::new();
    let mut tag_names: Vec<String> = Vec::new();
    for section in document.select(&details_sel) {
        let section_text: String = section.text().collect();
        if section_text.contains("Autor") || section_text.contains("Zeichner") {
            author_names.extend(
                section
                    .select(&anchor_sel)
                    .map(element_text)
                    .filter(|name| !name.is_empty()),
            );
        } else if section_text.contains("Genres") {
            tag_names.extend(
                section
                    .select(&anchor_sel)
                    .map(element_text)
                    .filter(|name| !name.is_empty()),
            );
        }
    }

    let summary = document
        .select(&summary_sel)
        .next()
        .map(element_text)
        .filter(|text| !text.is_empty())
        .or_else(|| {
            document
                .select(&meta_sel)
                .next()
                .and_then(|meta| meta.value().attr("content"))
                .map(|content| content.trim().to_string())
        })
        .unwrap_or_default();

    // Cover URL stays unresolved; downloading is the asset manager's job.
    let cover = document
        .select(&cover_sel)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(|src| {
            if src.starts_with("http") {
                src.to_string()
            } else {
                format!("{}{}", base_url, src)
            }
        });

    Ok(NewWork {
        title,
        native_title: None,
        reading_status: None,
        publication_status: None,
        star_rating: None,
        language: Some("DE".to_string()),
        category: Category::Manga,
        summary: Some(summary),
        cover,
        contributors: dedup_names_case_insensitive(author_names)
            .into_iter()
            .map(NewContributor::new)
            .collect(),
        tags: tag_names.into_iter().map(NewTag::new).collect(),
        collections: Vec::new(),
        volumes: Vec::new(),
    })
}

#[async_trait]
impl SourceAdapter for MangaPassionAdapter {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn search(&self, term: &str) -> AppResult<Vec<NewWork>> {
        let url = format!("{}/search?q={}", self.base_url, term);
        let html = self
            .renderer
            .render(&url)
            .await
            .map_err(|e| AppError::FetchFailed(format!("Manga-Passion search failed: {}", e)))?;

        parse_search(&html)
    }

    async fn fetch(&self, reference: &str) -> AppResult<NewWork> {
        let html = self
            .renderer
            .render(reference)
            .await
            .map_err(|e| AppError::FetchFailed(format!("Manga-Passion fetch failed: {}", e)))?;

        parse_detail(&html, &self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;

    mock! {
        Renderer {}

        #[async_trait]
        impl PageRenderer for Renderer {
            async fn render(&self, url: &str) -> AppResult<String>;
        }
    }

    const SEARCH_HTML: &str = r#"
        <html><body>
          <div class="manga-list_listItemWrapper__bwhIS">
            <a href="/editions/42"><span class="manga-list_title__GKlEd">Berserk</span></a>
          </div>
          <div class="manga-list_listItemWrapper__bwhIS">
            <span class="manga-list_title__GKlEd">No Link Here</span>
          </div>
          <div class="manga-list_listItemWrapper__bwhIS">
            <a href="/editions/7"><span class="manga-list_title__GKlEd">Monster</span></a>
          </div>
        </body></html>
    "#;

    const DETAIL_HTML: &str = r##"
        <html>
        <head><meta name="description" content="Fallback summary"></head>
        <body>
          <h1>Berserk</h1>
          <ul class="manga_details__UYMcm">
            <li>Autor: <a href="#">Kentaro Miura</a></li>
          </ul>
          <ul class="manga_details__UYMcm">
            <li>Zeichner: <a href="#">KENTARO MIURA</a></li>
          </ul>
          <ul class="manga_details__UYMcm">
            <li>Genres: <a href="#">Action</a><a href="#">Dark Fantasy</a></li>
          </ul>
          <div class="manga_description__vzPCx"><p>Ein dunkles Epos.</p></div>
          <img class="img_img__jkdIh" src="/covers/berserk.jpg">
        </body>
        </html>
    "##;

    fn adapter(html: &'static str) -> MangaPassionAdapter {
        let mut renderer = MockRenderer::new();
        renderer
            .expect_render()
            .returning(move |_| Ok(html.to_string()));
        MangaPassionAdapter::with_base_url(Arc::new(renderer), "https://mp.example")
    }

    #[tokio::test]
    async fn test_search_skips_incomplete_items() {
        let works = adapter(SEARCH_HTML).search("berserk").await.unwrap();

        let titles: Vec<&str> = works.iter().map(|w| w.title.as_str()).collect();
        assert_eq!(titles, vec!["Berserk", "Monster"]);
        assert_eq!(works[0].language.as_deref(), Some("DE"));
        assert_eq!(works[0].category, Category::Manga);
    }

    #[tokio::test]
    async fn test_fetch_maps_detail_page() {
        let work = adapter(DETAIL_HTML)
            .fetch("https://mp.example/editions/42")
            .await
            .unwrap();

        assert_eq!(work.title, "Berserk");
        assert_eq!(work.summary.as_deref(), Some("Ein dunkles Epos."));

        // Author and artist sections collapse case-insensitively
        let names: Vec<&str> = work.contributors.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Kentaro Miura"]);

        let tags: Vec<&str> = work.tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(tags, vec!["Action", "Dark Fantasy"]);

        // Relative cover src is absolutized but stays a URL
        assert_eq!(
            work.cover.as_deref(),
            Some("https://mp.example/covers/berserk.jpg")
        );
    }

    #[tokio::test]
    async fn test_fetch_summary_falls_back_to_meta_description() {
        const NO_SUMMARY: &str = r#"
            <html>
            <head><meta name="description" content="Fallback summary"></head>
            <body><h1>Berserk</h1></body>
            </html>
        "#;

        let work = adapter(NO_SUMMARY)
            .fetch("https://mp.example/editions/42")
            .await
            .unwrap();
        assert_eq!(work.summary.as_deref(), Some("Fallback summary"));
        assert_eq!(work.cover, None);
    }

    #[tokio::test]
    async fn test_fetch_without_title_fails() {
        let err = adapter("<html><body></body></html>")
            .fetch("https://mp.example/editions/42")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::FetchFailed(_)));
    }
}
