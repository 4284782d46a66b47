use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Why a final pick could not be attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalGap {
    NothingSwiped,
    EverythingDisliked,
}

#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("Suggestion generator failed: {0}")]
    Generator(String),

    #[error("Catalog search failed: {0}")]
    Catalog(String),

    #[error("No titles could be resolved for these constraints")]
    NoResults,

    #[error("Not enough swipe signal: {0:?}")]
    InsufficientSignal(SignalGap),

    #[error("Could not resolve '{title}' against the catalog")]
    ResolutionFailed { title: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl EngineError {
    pub fn generator(err: anyhow::Error) -> Self {
        EngineError::Generator(format!("{err:#}"))
    }

    pub fn catalog(err: anyhow::Error) -> Self {
        EngineError::Catalog(format!("{err:#}"))
    }

    /// Short text safe to show an end user. Never carries provider output.
    pub fn user_message(&self) -> String {
        match self {
            EngineError::Generator(_) => {
                "Recommendations are unavailable right now. Please retry in a moment.".to_string()
            }
            EngineError::Catalog(_) => {
                "The movie catalog could not be reached. Please retry.".to_string()
            }
            EngineError::NoResults => {
                "No valid movies found for these filters. Try broader filters.".to_string()
            }
            EngineError::InsufficientSignal(SignalGap::NothingSwiped) => {
                "Swipe at least one title before requesting a recommendation.".to_string()
            }
            EngineError::InsufficientSignal(SignalGap::EverythingDisliked) => {
                "You disliked everything. Adjust filters and try again.".to_string()
            }
            EngineError::ResolutionFailed { .. } => {
                "Final recommendation could not be validated. Please retry.".to_string()
            }
            EngineError::InvalidInput(msg) => msg.clone(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            EngineError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            EngineError::InsufficientSignal(_) => StatusCode::UNPROCESSABLE_ENTITY,
            EngineError::NoResults => StatusCode::NOT_FOUND,
            EngineError::ResolutionFailed { .. } | EngineError::Catalog(_) => {
                StatusCode::BAD_GATEWAY
            }
            EngineError::Generator(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.user_message() }));
        (self.status(), body).into_response()
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_messages_hide_provider_detail() {
        let err = EngineError::Generator("quota exceeded: key AIza-secret".to_string());
        assert!(!err.user_message().contains("AIza"));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn signal_gaps_have_distinct_messages() {
        let none = EngineError::InsufficientSignal(SignalGap::NothingSwiped).user_message();
        let all = EngineError::InsufficientSignal(SignalGap::EverythingDisliked).user_message();
        assert_ne!(none, all);
        assert!(all.contains("disliked everything"));
    }
}
