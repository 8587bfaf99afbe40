// src/sources/mod.rs
//
// External content providers.
//
// Each provider gets one adapter implementing the fixed capability set
// {search, fetch}; the registry dispatches on the provider name. Adapters
// only map provider payloads into the canonical NewWork shape; nothing here
// touches the store, and cover URLs stay unresolved for the asset manager.

pub mod jikan;
pub mod manga_passion;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::NewWork;
use crate::error::{AppError, AppResult};

pub use jikan::JikanAdapter;
pub use manga_passion::{MangaPassionAdapter, PageRenderer};

#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Registry key; must match the seeded provider row.
    fn name(&self) -> &'static str;

    /// Best-effort search: candidates that fail to parse are dropped, a
    /// transport failure for the whole request surfaces as `FetchFailed`.
    async fn search(&self, term: &str) -> AppResult<Vec<NewWork>>;

    /// Fetch one work by provider-specific reference. Any failure is fatal
    /// to this call.
    async fn fetch(&self, reference: &str) -> AppResult<NewWork>;
}

/// Static name → adapter registry.
pub struct SourceRegistry {
    adapters: HashMap<&'static str, Arc<dyn SourceAdapter>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// Registry with every adapter this build knows about. The Manga-Passion
    /// adapter needs a page renderer (headless browser capability, owned by
    /// the caller); without one the provider is simply not registered and
    /// lookups for it fail with `UnknownProvider`.
    pub fn with_default_providers(renderer: Option<Arc<dyn PageRenderer>>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(JikanAdapter::new()));
        if let Some(renderer) = renderer {
            registry.register(Arc::new(MangaPassionAdapter::new(renderer)));
        }
        registry
    }

    pub fn register(&mut self, adapter: Arc<dyn SourceAdapter>) {
        self.adapters.insert(adapter.name(), adapter);
    }

    pub fn get(&self, provider: &str) -> AppResult<Arc<dyn SourceAdapter>> {
        self.adapters
            .get(provider)
            .cloned()
            .ok_or_else(|| AppError::UnknownProvider(provider.to_string()))
    }

    pub async fn search(&self, provider: &str, term: &str) -> AppResult<Vec<NewWork>> {
        self.get(provider)?.search(term).await
    }

    pub async fn fetch(&self, provider: &str, reference: &str) -> AppResult<NewWork> {
        self.get(provider)?.fetch(reference).await
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Collapse names that differ only in case onto their first occurrence,
/// preserving input order. Providers credit the same person under several
/// sections (author, artist) with inconsistent casing.
pub(crate) fn dedup_names_case_insensitive(names: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    names
        .into_iter()
        .filter(|name| seen.insert(name.to_lowercase()))
        .collect()
}
