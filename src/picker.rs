use std::sync::Arc;

use tracing::{info, warn};

use crate::config::EngineSettings;
use crate::deck::resolve_on_catalog;
use crate::error::{EngineError, EngineResult, SignalGap};
use crate::generator::SuggestionApi;
use crate::matching::{normalize_language, normalize_title};
use crate::models::{CatalogRecord, FinalPick, MediaKind, PickSource};
use crate::tmdb::CatalogApi;

pub const DISTINCTIVE_PICK_REASON: &str = "You liked every option, so we picked the most distinctive one from your deck to keep your watchlist fresh.";

const GENERATOR_ATTEMPTS: usize = 2;
const PICK_KINDS: &[MediaKind] = &[MediaKind::Movie, MediaKind::Series];

/// Titles the user already turned down, compared in normalized form.
#[derive(Debug, Default)]
struct Exclusions {
    display: Vec<String>,
    keys: Vec<String>,
}

/// Titles with no ASCII letters or digits normalize to nothing, so those
/// compare case-insensitively as written.
fn exclusion_key(title: &str) -> String {
    let key = normalize_title(title);
    if key.is_empty() {
        title.trim().to_lowercase()
    } else {
        key
    }
}

impl Exclusions {
    fn new(titles: Vec<String>) -> Self {
        let mut out = Self::default();
        for title in titles {
            out.push(&title);
        }
        out
    }

    fn push(&mut self, title: &str) {
        let key = exclusion_key(title);
        if key.is_empty() || self.keys.contains(&key) {
            return;
        }
        self.keys.push(key);
        self.display.push(title.trim().to_string());
    }

    fn contains(&self, title: &str) -> bool {
        let key = exclusion_key(title);
        !key.is_empty() && self.keys.contains(&key)
    }
}

/// Least mainstream liked record not yet excluded: lowest vote count, then
/// highest vote average, then deck order.
pub fn most_distinctive<'a>(
    liked: &'a [CatalogRecord],
    excluded_titles: &[String],
) -> Option<&'a CatalogRecord> {
    let exclusions = Exclusions::new(excluded_titles.to_vec());
    let mut best: Option<&CatalogRecord> = None;
    for record in liked.iter().filter(|r| !exclusions.contains(&r.title)) {
        best = match best {
            Some(current) if !more_distinctive(record, current) => Some(current),
            _ => Some(record),
        };
    }
    best
}

fn more_distinctive(a: &CatalogRecord, b: &CatalogRecord) -> bool {
    a.vote_count < b.vote_count
        || (a.vote_count == b.vote_count && a.vote_average > b.vote_average)
}

pub struct FinalPicker {
    generator: Arc<dyn SuggestionApi>,
    catalog: Arc<dyn CatalogApi>,
    settings: EngineSettings,
}

impl FinalPicker {
    pub fn new(
        generator: Arc<dyn SuggestionApi>,
        catalog: Arc<dyn CatalogApi>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            generator,
            catalog,
            settings,
        }
    }

    /// Picks one title from the user's swipes. "Show me another" is the same
    /// call with the previous pick appended to `excluded_titles`.
    pub async fn pick(
        &self,
        liked: &[CatalogRecord],
        disliked: &[CatalogRecord],
        excluded_titles: Vec<String>,
    ) -> EngineResult<FinalPick> {
        if liked.is_empty() && disliked.is_empty() {
            return Err(EngineError::InsufficientSignal(SignalGap::NothingSwiped));
        }
        if liked.is_empty() {
            return Err(EngineError::InsufficientSignal(SignalGap::EverythingDisliked));
        }

        let mut exclusions = Exclusions::new(excluded_titles);

        if disliked.is_empty() {
            if let Some(record) = most_distinctive(liked, &exclusions.display) {
                info!(title = %record.title, "Liked everything, returning most distinctive pick");
                return Ok(FinalPick {
                    pick: record.clone(),
                    reason: DISTINCTIVE_PICK_REASON.to_string(),
                    source: PickSource::Distinctive,
                });
            }
            info!("Every liked title is excluded, asking the generator instead");
        }

        let mut last_title = String::new();
        for attempt in 1..=GENERATOR_ATTEMPTS {
            let proposal = self
                .generator
                .generate_final_pick(liked, disliked, &exclusions.display)
                .await
                .map_err(EngineError::generator)?;
            let suggestion = &proposal.suggestion;
            last_title = suggestion.title.clone();

            if exclusions.contains(&suggestion.title) {
                warn!(attempt, title = %suggestion.title, "Generator proposed an excluded title");
                continue;
            }

            let wanted = [normalize_language(&suggestion.original_language)];
            let resolved = resolve_on_catalog(
                self.catalog.as_ref(),
                suggestion,
                PICK_KINDS,
                &wanted,
                self.settings.min_score,
            )
            .await;

            match resolved {
                Some(record) if exclusions.contains(&record.title) => {
                    warn!(
                        attempt,
                        title = %record.title,
                        "Final pick resolved to an excluded title"
                    );
                    exclusions.push(&suggestion.title);
                }
                Some(record) => {
                    info!(attempt, title = %record.title, "Final pick resolved");
                    return Ok(FinalPick {
                        pick: record,
                        reason: proposal.reason.trim().to_string(),
                        source: PickSource::Generator,
                    });
                }
                None => {
                    warn!(attempt, title = %suggestion.title, "Final pick did not resolve");
                    exclusions.push(&suggestion.title);
                }
            }
        }

        Err(EngineError::ResolutionFailed { title: last_title })
    }
}
