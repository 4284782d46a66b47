#![allow(dead_code)]

use anyhow::anyhow;
use reelpick::config::EngineSettings;
use reelpick::generator::SuggestionApi;
use reelpick::matching::normalize_title;
use reelpick::models::{CatalogRecord, Constraints, MediaKind, PickSuggestion, Suggestion};
use reelpick::tmdb::CatalogApi;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

pub fn record(
    kind: MediaKind,
    id: i32,
    title: &str,
    release_date: &str,
    language: &str,
    vote_count: u32,
    vote_average: f64,
) -> CatalogRecord {
    CatalogRecord {
        id,
        media_kind: kind,
        title: title.to_string(),
        original_title: title.to_string(),
        overview: format!("{title} overview"),
        poster_ref: Some(format!("/poster-{id}.jpg")),
        backdrop_ref: None,
        release_date: release_date.to_string(),
        vote_average,
        vote_count,
        genre_ids: vec![18],
        original_language: language.to_string(),
    }
}

pub fn movie(id: i32, title: &str, year: i32, language: &str) -> CatalogRecord {
    record(
        MediaKind::Movie,
        id,
        title,
        &format!("{year}-06-01"),
        language,
        1000,
        7.0,
    )
}

pub fn suggestion(title: &str, year: i32, language: &str) -> Suggestion {
    Suggestion::new(title, year, language)
}

pub fn quick_settings() -> EngineSettings {
    EngineSettings {
        topup_cooldown: Duration::ZERO,
        ..EngineSettings::default()
    }
}

/// Catalog keyed by normalized search title. Every search is logged.
#[derive(Default)]
pub struct FakeCatalog {
    results: HashMap<(MediaKind, String), Vec<CatalogRecord>>,
    failing: HashSet<String>,
    providers: HashMap<(MediaKind, i32), Vec<String>>,
    pub searches: Mutex<Vec<(MediaKind, String, Option<i32>)>>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers results returned when `query` is searched for `record`'s kind.
    pub fn with(mut self, query: &str, records: Vec<CatalogRecord>) -> Self {
        for r in records {
            self.results
                .entry((r.media_kind, normalize_title(query)))
                .or_default()
                .push(r);
        }
        self
    }

    pub fn failing(mut self, query: &str) -> Self {
        self.failing.insert(normalize_title(query));
        self
    }

    pub fn with_providers(mut self, kind: MediaKind, id: i32, names: &[&str]) -> Self {
        self.providers
            .insert((kind, id), names.iter().map(|n| n.to_string()).collect());
        self
    }

    pub fn searches_for(&self, query: &str) -> usize {
        let key = normalize_title(query);
        self.searches
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, title, _)| normalize_title(title) == key)
            .count()
    }
}

#[async_trait::async_trait]
impl CatalogApi for FakeCatalog {
    async fn search_by_title(
        &self,
        kind: MediaKind,
        title: &str,
        year: Option<i32>,
    ) -> anyhow::Result<Vec<CatalogRecord>> {
        self.searches
            .lock()
            .unwrap()
            .push((kind, title.to_string(), year));
        let key = normalize_title(title);
        if self.failing.contains(&key) {
            return Err(anyhow!("TMDB request failed (503) for /search/{}", kind.as_path()));
        }
        Ok(self.results.get(&(kind, key)).cloned().unwrap_or_default())
    }

    async fn watch_availability(
        &self,
        kind: MediaKind,
        id: i32,
        _region: &str,
    ) -> anyhow::Result<Vec<String>> {
        self.providers
            .get(&(kind, id))
            .cloned()
            .ok_or_else(|| anyhow!("TMDB request failed (404) for /{}/{id}", kind.as_path()))
    }
}

/// Generator that replays scripted responses in order.
#[derive(Default)]
pub struct FakeGenerator {
    batches: Mutex<VecDeque<anyhow::Result<Vec<Suggestion>>>>,
    picks: Mutex<VecDeque<anyhow::Result<PickSuggestion>>>,
    pub batch_requests: Mutex<Vec<usize>>,
    pub pick_exclusions: Mutex<Vec<Vec<String>>>,
}

impl FakeGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batch(self, suggestions: Vec<Suggestion>) -> Self {
        self.batches.lock().unwrap().push_back(Ok(suggestions));
        self
    }

    pub fn failing_batch(self, message: &str) -> Self {
        self.batches
            .lock()
            .unwrap()
            .push_back(Err(anyhow!(message.to_string())));
        self
    }

    pub fn pick(self, title: &str, year: i32, language: &str, reason: &str) -> Self {
        self.picks.lock().unwrap().push_back(Ok(PickSuggestion {
            suggestion: Suggestion::new(title, year, language),
            reason: reason.to_string(),
        }));
        self
    }

    pub fn failing_pick(self, message: &str) -> Self {
        self.picks
            .lock()
            .unwrap()
            .push_back(Err(anyhow!(message.to_string())));
        self
    }

    pub fn batch_calls(&self) -> Vec<usize> {
        self.batch_requests.lock().unwrap().clone()
    }

    pub fn pick_calls(&self) -> Vec<Vec<String>> {
        self.pick_exclusions.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl SuggestionApi for FakeGenerator {
    async fn generate_suggestions(
        &self,
        _constraints: &Constraints,
        count: usize,
    ) -> anyhow::Result<Vec<Suggestion>> {
        self.batch_requests.lock().unwrap().push(count);
        self.batches
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(anyhow!("no scripted suggestion batch")))
    }

    async fn generate_final_pick(
        &self,
        _liked: &[CatalogRecord],
        _disliked: &[CatalogRecord],
        excluded_titles: &[String],
    ) -> anyhow::Result<PickSuggestion> {
        self.pick_exclusions
            .lock()
            .unwrap()
            .push(excluded_titles.to_vec());
        self.picks
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(anyhow!("no scripted final pick")))
    }
}
