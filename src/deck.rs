use std::collections::HashSet;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::EngineSettings;
use crate::error::{EngineError, EngineResult};
use crate::generator::SuggestionApi;
use crate::matching::{filter_by_language, normalize_language, resolve_best, suggestion_key};
use crate::models::{CatalogRecord, Constraints, MediaKind, Suggestion};
use crate::tmdb::CatalogApi;

/// Searches every applicable media kind for a suggestion, narrows the merged
/// pool by language (relaxing if nothing survives) and picks the best match.
/// Catalog failures count as "no candidates" for that kind.
pub async fn resolve_on_catalog(
    catalog: &dyn CatalogApi,
    suggestion: &Suggestion,
    kinds: &[MediaKind],
    wanted_languages: &[String],
    min_score: f64,
) -> Option<CatalogRecord> {
    let year = Some(suggestion.year).filter(|y| *y > 0);
    let mut pool = Vec::new();
    for kind in kinds {
        match catalog.search_by_title(*kind, &suggestion.title, year).await {
            Ok(results) => pool.extend(results),
            Err(e) => warn!(
                title = %suggestion.title,
                kind = kind.as_path(),
                "Catalog search failed, treating as no candidates: {e:#}"
            ),
        }
    }
    let pool = filter_by_language(pool, wanted_languages);
    let best = resolve_best(suggestion, &pool, min_score).cloned();
    debug!(
        title = %suggestion.title,
        year = suggestion.year,
        candidates = pool.len(),
        resolved = ?best.as_ref().map(|r| r.identity()),
        "Resolved suggestion"
    );
    best
}

pub struct DeckBuilder {
    generator: Arc<dyn SuggestionApi>,
    catalog: Arc<dyn CatalogApi>,
    settings: EngineSettings,
}

/// Dedupe pools shared by the first round and the top-up round.
#[derive(Default)]
struct DeckPools {
    suggestion_keys: HashSet<(String, i32, String)>,
    identities: HashSet<(MediaKind, i32)>,
    deck: Vec<CatalogRecord>,
}

impl DeckPools {
    /// Suggestions whose key has not been seen in this build, first one wins.
    fn fresh(&mut self, batch: Vec<Suggestion>) -> Vec<Suggestion> {
        batch
            .into_iter()
            .filter(|s| {
                let key = suggestion_key(&s.title, s.year, &s.original_language);
                let fresh = self.suggestion_keys.insert(key);
                if !fresh {
                    debug!(title = %s.title, year = s.year, "Skipping duplicate suggestion");
                }
                fresh
            })
            .collect()
    }
}

impl DeckBuilder {
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

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Builds a deck of at most `target_size` distinct resolved records.
    /// A short deck is a valid result; only an empty one is an error.
    pub async fn build(
        &self,
        constraints: &Constraints,
        target_size: usize,
    ) -> EngineResult<Vec<CatalogRecord>> {
        let target_size = target_size.max(1);
        let languages = constraints.language_set();
        let mut pools = DeckPools::default();

        info!(
            target_size,
            content = constraints.content_kind.as_str(),
            languages = ?languages,
            "Requesting deck suggestions"
        );
        let first = self
            .generator
            .generate_suggestions(constraints, target_size)
            .await
            .map_err(EngineError::generator)?;
        check_cardinality(&first, target_size).map_err(EngineError::Generator)?;

        let fresh = pools.fresh(first);
        self.resolve_round(constraints, &languages, fresh, &mut pools)
            .await;

        if pools.deck.len() < self.settings.min_viable_deck {
            info!(
                resolved = pools.deck.len(),
                cooldown_ms = self.settings.topup_cooldown.as_millis() as u64,
                "Deck under-filled, requesting one top-up batch"
            );
            tokio::time::sleep(self.settings.topup_cooldown).await;
            let batch_size = self.settings.topup_batch;
            match self
                .generator
                .generate_suggestions(constraints, batch_size)
                .await
                .map_err(EngineError::generator)
                .and_then(|b| {
                    check_cardinality(&b, batch_size).map_err(EngineError::Generator)?;
                    Ok(b)
                }) {
                Ok(batch) => {
                    let fresh = pools.fresh(batch);
                    self.resolve_round(constraints, &languages, fresh, &mut pools)
                        .await;
                }
                Err(e) => warn!("Top-up batch rejected, keeping current deck: {e}"),
            }
        }

        if pools.deck.is_empty() {
            warn!("Deck build produced no usable titles");
            return Err(EngineError::NoResults);
        }
        let mut deck = pools.deck;
        deck.truncate(target_size);
        info!(size = deck.len(), "Deck ready");
        Ok(deck)
    }

    /// Resolves a round of suggestions concurrently, then merges the results
    /// in suggestion order once every lookup has finished.
    async fn resolve_round(
        &self,
        constraints: &Constraints,
        languages: &[String],
        suggestions: Vec<Suggestion>,
        pools: &mut DeckPools,
    ) {
        let kinds = constraints.content_kind.media_kinds();
        let mut set = JoinSet::new();
        let count = suggestions.len();
        for (idx, suggestion) in suggestions.into_iter().enumerate() {
            let catalog = Arc::clone(&self.catalog);
            let min_score = self.settings.min_score;
            // Without a session language, prefer the suggestion's own.
            let wanted = if languages.is_empty() {
                vec![normalize_language(&suggestion.original_language)]
            } else {
                languages.to_vec()
            };
            set.spawn(async move {
                let resolved =
                    resolve_on_catalog(catalog.as_ref(), &suggestion, kinds, &wanted, min_score)
                        .await;
                (idx, resolved)
            });
        }

        let mut slots: Vec<Option<CatalogRecord>> = vec![None; count];
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((idx, resolved)) => slots[idx] = resolved,
                Err(e) => warn!("Resolution task failed: {e}"),
            }
        }

        for record in slots.into_iter().flatten() {
            if !languages.is_empty()
                && !languages.contains(&normalize_language(&record.original_language))
            {
                debug!(
                    title = %record.title,
                    language = %record.original_language,
                    "Dropping resolved title outside session languages"
                );
                continue;
            }
            if pools.identities.insert(record.identity()) {
                pools.deck.push(record);
            }
        }
    }
}

fn check_cardinality(batch: &[Suggestion], expected: usize) -> Result<(), String> {
    if batch.len() != expected {
        return Err(format!(
            "generator returned {} suggestions, expected {}",
            batch.len(),
            expected
        ));
    }
    Ok(())
}
