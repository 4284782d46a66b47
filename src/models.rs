use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Catalog side of a record. Together with the catalog id this is the only
/// stable identity a title has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Series,
}

impl MediaKind {
    /// Path segment used by the TMDB REST API.
    pub fn as_path(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Series => "tv",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "movie" => Some(MediaKind::Movie),
            "series" | "tv" => Some(MediaKind::Series),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Movie,
    Series,
    #[default]
    Both,
}

impl ContentKind {
    /// Media kinds to search, in merge order.
    pub fn media_kinds(&self) -> &'static [MediaKind] {
        match self {
            ContentKind::Movie => &[MediaKind::Movie],
            ContentKind::Series => &[MediaKind::Series],
            ContentKind::Both => &[MediaKind::Movie, MediaKind::Series],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Movie => "movie",
            ContentKind::Series => "series",
            ContentKind::Both => "both",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum YearRange {
    #[default]
    #[serde(rename = "all")]
    All,
    #[serde(rename = "2020s")]
    Twenties,
    #[serde(rename = "2010s")]
    Tens,
    #[serde(rename = "2000s")]
    Noughties,
    #[serde(rename = "classic")]
    Classic,
}

impl YearRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            YearRange::All => "all",
            YearRange::Twenties => "2020s",
            YearRange::Tens => "2010s",
            YearRange::Noughties => "2000s",
            YearRange::Classic => "classic",
        }
    }
}

/// Session filters handed to the deck builder. Genres are advisory and only
/// travel to the generator prompt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraints {
    #[serde(default)]
    pub content_kind: ContentKind,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub year_range: YearRange,
    #[serde(default)]
    pub vibe_text: Option<String>,
}

impl Constraints {
    /// Lowercased, trimmed, deduplicated language codes.
    pub fn language_set(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for code in &self.languages {
            let code = code.trim().to_ascii_lowercase();
            if !code.is_empty() && !out.contains(&code) {
                out.push(code);
            }
        }
        out
    }

    pub fn vibe(&self) -> Option<&str> {
        self.vibe_text
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SuggestionParseError {
    #[error("item is not an object")]
    NotAnObject,
    #[error("missing or invalid field '{0}'")]
    InvalidField(&'static str),
}

/// A generator-proposed title that has not been checked against the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub title: String,
    pub year: i32,
    pub original_language: String,
}

impl Suggestion {
    pub fn new(title: &str, year: i32, original_language: &str) -> Self {
        Self {
            title: title.trim().to_string(),
            year,
            original_language: original_language.trim().to_ascii_lowercase(),
        }
    }

    /// The only way untrusted generator output becomes a `Suggestion`.
    pub fn from_value(value: &Value) -> Result<Self, SuggestionParseError> {
        let obj = value.as_object().ok_or(SuggestionParseError::NotAnObject)?;
        let title = required_str(obj, "title")?;
        if title.is_empty() {
            return Err(SuggestionParseError::InvalidField("title"));
        }
        let year = required_year(obj)?;
        let language = required_str(obj, "originalLanguage")?;
        Ok(Self::new(title, year, language))
    }
}

/// The generator's single targeted pick, with its explanation.
#[derive(Debug, Clone, PartialEq)]
pub struct PickSuggestion {
    pub suggestion: Suggestion,
    pub reason: String,
}

impl PickSuggestion {
    pub fn from_value(value: &Value) -> Result<Self, SuggestionParseError> {
        let suggestion = Suggestion::from_value(value)?;
        let obj = value.as_object().ok_or(SuggestionParseError::NotAnObject)?;
        let reason = required_str(obj, "reason")?;
        Ok(Self {
            suggestion,
            reason: reason.to_string(),
        })
    }
}

fn required_str<'a>(
    obj: &'a serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, SuggestionParseError> {
    obj.get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .ok_or(SuggestionParseError::InvalidField(field))
}

fn required_year(obj: &serde_json::Map<String, Value>) -> Result<i32, SuggestionParseError> {
    let raw = obj
        .get("year")
        .and_then(Value::as_f64)
        .filter(|y| y.is_finite())
        .ok_or(SuggestionParseError::InvalidField("year"))?;
    let year = raw.floor();
    if year < i32::MIN as f64 || year > i32::MAX as f64 {
        return Err(SuggestionParseError::InvalidField("year"));
    }
    Ok(year as i32)
}

/// A verified media record from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogRecord {
    pub id: i32,
    pub media_kind: MediaKind,
    pub title: String,
    #[serde(default)]
    pub original_title: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub poster_ref: Option<String>,
    #[serde(default)]
    pub backdrop_ref: Option<String>,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u32,
    #[serde(default)]
    pub genre_ids: Vec<i32>,
    #[serde(default)]
    pub original_language: String,
}

impl CatalogRecord {
    pub fn identity(&self) -> (MediaKind, i32) {
        (self.media_kind, self.id)
    }

    /// Leading four-digit year of the release date, if there is one.
    pub fn release_year(&self) -> Option<i32> {
        let head = self.release_date.get(..4)?;
        if !head.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        head.parse().ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwipeResult {
    Like,
    Dislike,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwipeableMovie {
    #[serde(flatten)]
    pub record: CatalogRecord,
    pub swiped: bool,
    pub result: Option<SwipeResult>,
}

impl From<CatalogRecord> for SwipeableMovie {
    fn from(record: CatalogRecord) -> Self {
        Self {
            record,
            swiped: false,
            result: None,
        }
    }
}

impl SwipeableMovie {
    pub fn mark(&mut self, result: SwipeResult) {
        self.swiped = true;
        self.result = Some(result);
    }
}

/// Splits a swiped deck into liked and disliked records, in deck order.
pub fn partition_swipes(deck: &[SwipeableMovie]) -> (Vec<CatalogRecord>, Vec<CatalogRecord>) {
    let mut liked = Vec::new();
    let mut disliked = Vec::new();
    for card in deck.iter().filter(|c| c.swiped) {
        match card.result {
            Some(SwipeResult::Like) => liked.push(card.record.clone()),
            Some(SwipeResult::Dislike) => disliked.push(card.record.clone()),
            None => {}
        }
    }
    (liked, disliked)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PickSource {
    /// Deterministic pick from the liked set, no generator involved.
    Distinctive,
    Generator,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalPick {
    pub pick: CatalogRecord,
    pub reason: String,
    pub source: PickSource,
}
